// SPDX-License-Identifier: GPL-3.0-or-later

//! ID3 tag extraction for audio files.
//!
//! This crate reads the two tag formats that can live in the same MP3:
//! - the ID3v2.4 frame tag at the start of the file ([`v2`])
//! - the fixed 128-byte ID3v1 trailer at the end ([`v1`])
//!
//! [`info`] reads both and merges them into a single [`MetadataRecord`],
//! with ID3v2 values taking precedence.

pub mod encoding;
pub mod error;
pub mod fields;
pub mod genre;
pub mod merge;
pub mod record;
pub mod v1;
pub mod v2;

pub use error::{Result, TagError};
pub use merge::{info, merge, TagReader};
pub use record::{MetadataRecord, TagValue};
pub use tagscan_config::{
    FrameSizeEncoding, Latin1Direction, LegacyCodepage, ReaderConfig, UnknownFramePolicy,
};
pub use v1::{read_legacy_tag, LegacyTag};
pub use v2::{read_frame_tags, FrameScan, ScanEnd, TagHeader};
