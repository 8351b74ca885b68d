// SPDX-License-Identifier: GPL-3.0-or-later

//! ID3v2.4 frame scanner.
//!
//! The tag opens with a 10-byte header (`ID3`, major, minor, flags,
//! size) followed by frames laid out as:
//!
//! ```text
//! id[4] size[4] flags[2] encoding[1] payload[size - 1]
//! ```
//!
//! Frames are read in order until the source ends. The scan also ends at
//! the first frame id with no canonical field, unless the reader is set to
//! skip unknown frames, and at the first frame whose declared size runs
//! past the end of the source.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use tagscan_config::{ReaderConfig, UnknownFramePolicy};
use tracing::{debug, instrument, warn};

use crate::encoding::decode_frame_value_with;
use crate::fields::field_for;
use crate::{MetadataRecord, Result, TagError, TagValue};

pub const HEADER_LEN: usize = 10;
pub const SIGNATURE: &[u8; 3] = b"ID3";
pub const SUPPORTED_MAJOR_VERSION: u8 = 4;

/// The fixed ID3v2 tag header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub major: u8,
    pub minor: u8,
    pub flags: u8,
    /// Declared tag size as the raw big-endian field.
    pub size: u32,
}

impl TagHeader {
    /// Validate signature and version.
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self> {
        if &bytes[0..3] != SIGNATURE {
            return Err(TagError::InvalidSignature);
        }

        let major = bytes[3];
        if major != SUPPORTED_MAJOR_VERSION {
            return Err(TagError::UnsupportedVersion(major));
        }

        Ok(Self {
            major,
            minor: bytes[4],
            flags: bytes[5],
            size: u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]),
        })
    }

    /// Declared tag size decoded as a synchsafe integer.
    pub fn synchsafe_size(&self) -> u32 {
        tagscan_config::FrameSizeEncoding::Synchsafe.decode(self.size.to_be_bytes())
    }

    pub fn unsynchronised(&self) -> bool {
        self.flags & 0x80 != 0
    }

    pub fn has_extended_header(&self) -> bool {
        self.flags & 0x40 != 0
    }

    pub fn experimental(&self) -> bool {
        self.flags & 0x20 != 0
    }

    pub fn has_footer(&self) -> bool {
        self.flags & 0x10 != 0
    }
}

/// Why a frame scan stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEnd {
    /// Every frame up to the end of the source was read.
    EndOfSource,
    /// A frame id with no canonical field; it and everything after it was
    /// left unread. Padding shows up here with an empty id.
    UnknownFrame { id: String },
    /// A frame declared more bytes than the source holds.
    Truncated { id: String, declared: u64, available: u64 },
    /// A frame declared a size too small for its encoding byte.
    InvalidSize { id: String },
}

/// Result of scanning one ID3v2 tag.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameScan {
    pub header: TagHeader,
    pub record: MetadataRecord,
    pub end: ScanEnd,
}

impl FrameScan {
    /// True when frames may remain beyond where the scan stopped.
    pub fn is_partial(&self) -> bool {
        self.end != ScanEnd::EndOfSource
    }
}

enum Step {
    Stored,
    Skipped,
    Done(ScanEnd),
}

/// Scan the ID3v2 tag at the start of `source`.
///
/// Fails only when the header is missing, of another version, or cannot be
/// read. Problems inside the frame sequence end the scan and are reported
/// through [`FrameScan::end`] alongside the fields read so far.
pub fn read_frame_tags<R: Read + Seek>(source: &mut R, config: &ReaderConfig) -> Result<FrameScan> {
    source.seek(SeekFrom::Start(0))?;

    let mut header = [0u8; HEADER_LEN];
    if read_up_to(source, &mut header)? < HEADER_LEN {
        return Err(TagError::InvalidSignature);
    }
    let header = TagHeader::parse(&header)?;
    debug!(
        target: "id3v2",
        major = header.major,
        minor = header.minor,
        flags = header.flags,
        size = header.size,
        "tag header"
    );

    let mut record = MetadataRecord::new();
    let end = loop {
        match read_frame(source, config, &mut record) {
            Ok(Step::Stored) | Ok(Step::Skipped) => continue,
            Ok(Step::Done(end)) => break end,
            Err(TagError::TruncatedFrame { id, declared, available }) => {
                warn!(target: "id3v2", %id, declared, available, "frame runs past end of source");
                break ScanEnd::Truncated { id, declared, available };
            }
            Err(TagError::InvalidFrameSize { id }) => {
                warn!(target: "id3v2", %id, "frame size too small");
                break ScanEnd::InvalidSize { id };
            }
            Err(e) => return Err(e),
        }
    };

    debug!(target: "id3v2", fields = record.len(), end = ?end, "frame scan finished");
    Ok(FrameScan { header, record, end })
}

/// Open `path` and scan its ID3v2 tag. The file is closed on return.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn read_frame_tags_from_path(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<FrameScan> {
    let mut file = File::open(path.as_ref())?;
    read_frame_tags(&mut file, config)
}

fn read_frame<R: Read>(
    source: &mut R,
    config: &ReaderConfig,
    record: &mut MetadataRecord,
) -> Result<Step> {
    let mut raw_id = [0u8; 4];
    let got = read_up_to(source, &mut raw_id)?;
    if got == 0 {
        return Ok(Step::Done(ScanEnd::EndOfSource));
    }
    let id = frame_id(&raw_id[..got]);
    if got < raw_id.len() {
        return Err(truncated(id, raw_id.len() as u64, got as u64));
    }

    let mut raw_size = [0u8; 4];
    let got = read_up_to(source, &mut raw_size)?;
    if got < raw_size.len() {
        return Err(truncated(id, raw_size.len() as u64, got as u64));
    }
    let declared = config.frame_size.decode(raw_size);

    let Some(field) = field_for(&id) else {
        return skip_unknown(source, config.unknown_frames, id, declared);
    };

    let payload_len = declared
        .checked_sub(1)
        .ok_or_else(|| TagError::InvalidFrameSize { id: id.clone() })?;

    // Two flag bytes, then the encoding indicator.
    let mut prefix = [0u8; 3];
    let got = read_up_to(source, &mut prefix)?;
    if got < prefix.len() {
        return Err(truncated(id, declared as u64 + 2, got as u64));
    }
    let encoding_byte = prefix[2];

    let mut payload = Vec::new();
    let got = source.by_ref().take(payload_len as u64).read_to_end(&mut payload)? as u64;
    if got < payload_len as u64 {
        return Err(truncated(id, declared as u64 + 2, got + 3));
    }

    match decode_frame_value_with(payload, &id, encoding_byte, config.latin1_direction) {
        Ok(value) => {
            debug!(target: "id3v2", %id, field, len = payload_len, "frame");
            store(record, field, value);
            Ok(Step::Stored)
        }
        Err(e) => {
            warn!(target: "id3v2", %id, error = %e, "frame value not decoded");
            Ok(Step::Skipped)
        }
    }
}

fn skip_unknown<R: Read>(
    source: &mut R,
    policy: UnknownFramePolicy,
    id: String,
    declared: u32,
) -> Result<Step> {
    if policy == UnknownFramePolicy::Stop || id.is_empty() {
        debug!(target: "id3v2", %id, "unknown frame, stopping scan");
        return Ok(Step::Done(ScanEnd::UnknownFrame { id }));
    }

    let body = declared as u64 + 2;
    let skipped = io::copy(&mut source.by_ref().take(body), &mut io::sink())?;
    if skipped < body {
        return Err(truncated(id, body, skipped));
    }
    debug!(target: "id3v2", %id, bytes = body, "skipped unknown frame");
    Ok(Step::Skipped)
}

fn store(record: &mut MetadataRecord, field: &'static str, value: TagValue) {
    if let Some(previous) = record.insert(field, value) {
        debug!(target: "id3v2", field, replaced_len = previous.as_bytes().len(), "field overwritten");
    }
}

/// Padding stripped from the end of a frame id.
const ID_PADDING: [char; 6] = [' ', '\t', '\n', '\r', '\0', '\x0B'];

fn frame_id(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(ID_PADDING)
        .to_string()
}

fn truncated(id: String, declared: u64, available: u64) -> TagError {
    TagError::TruncatedFrame {
        id,
        declared,
        available,
    }
}

/// Fill as much of `buf` as the source allows, returning the byte count.
fn read_up_to<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
