// SPDX-License-Identifier: GPL-3.0-or-later

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TagError>;

/// Errors raised while locating or decoding ID3 tags.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File is not readable: {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid tag signature")]
    InvalidSignature,

    #[error("Unsupported ID3v2 major version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown text encoding indicator: {0}")]
    UnknownEncoding(u8),

    /// An ISO-8859-1 frame whose payload is not UTF-8 text within U+00FF.
    #[error("Frame text is not representable as ISO-8859-1")]
    UnrepresentableText,

    #[error("Genre index out of range: {0}")]
    GenreIndexOutOfRange(usize),

    /// The source ended before the bytes a frame declared.
    #[error("Frame {id} truncated: declared {declared} bytes, {available} available")]
    TruncatedFrame {
        id: String,
        declared: u64,
        available: u64,
    },

    /// A declared size of zero leaves no room for the encoding byte.
    #[error("Frame {id} has an invalid size")]
    InvalidFrameSize { id: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
