// SPDX-License-Identifier: GPL-3.0-or-later

//! ID3v1 trailer reader.
//!
//! The trailer is the last 128 bytes of the file:
//!
//! | bytes | field   |
//! |-------|---------|
//! | 3     | `TAG`   |
//! | 30    | title   |
//! | 30    | artist  |
//! | 30    | album   |
//! | 4     | year    |
//! | 30    | comment |
//! | 1     | genre   |

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tagscan_config::LegacyCodepage;
use tracing::{debug, instrument, warn};

use crate::encoding::decode_codepage;
use crate::{genre, Result};

pub const TRAILER_LEN: usize = 128;
pub const TRAILER_MARKER: &[u8; 3] = b"TAG";

/// Bytes requested for the genre field. Only the first indexes the genre
/// table, and only one remains in the trailer at that point.
const GENRE_WIDTH: usize = 2;

/// A validated ID3v1 trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTag {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Kept as the raw four characters, never parsed.
    pub year: String,
    pub comment: String,
    pub genre_index: u8,
}

impl LegacyTag {
    /// Parse a 128-byte trailer. Returns `None` unless it starts with `TAG`.
    pub fn parse(trailer: &[u8; TRAILER_LEN], codepage: LegacyCodepage) -> Option<Self> {
        let mut fields = FieldCursor::new(trailer);
        if fields.take(TRAILER_MARKER.len()) != TRAILER_MARKER {
            return None;
        }

        let title = decode_field(fields.take(30), codepage);
        let artist = decode_field(fields.take(30), codepage);
        let album = decode_field(fields.take(30), codepage);
        let year = decode_field(fields.take(4), LegacyCodepage::Latin1);
        let comment = decode_field(fields.take(30), codepage);
        let genre_index = fields.take(GENRE_WIDTH).first().copied().unwrap_or(0);

        Some(Self {
            title,
            artist,
            album,
            year,
            comment,
            genre_index,
        })
    }

    /// Genre name for [`Self::genre_index`].
    pub fn genre(&self) -> Result<&'static str> {
        genre::lookup(self.genre_index as usize)
    }

    /// Value of one canonical field, `None` when the trailer left it blank.
    ///
    /// An out-of-range genre makes only the `genre` field unavailable.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "title" => self.title.clone(),
            "artist" => self.artist.clone(),
            "album" => self.album.clone(),
            "year" => self.year.clone(),
            "comment" => self.comment.clone(),
            "genre" => match self.genre() {
                Ok(genre) => genre.to_string(),
                Err(e) => {
                    warn!(target: "id3v1", error = %e, "ignoring trailer genre");
                    return None;
                }
            },
            _ => return None,
        };
        (!value.is_empty()).then_some(value)
    }
}

/// Canonical fields an ID3v1 trailer can supply.
pub const LEGACY_FIELDS: [&str; 6] = ["title", "artist", "album", "year", "comment", "genre"];

/// Read the ID3v1 trailer from the end of `source`.
///
/// A source shorter than the trailer, or whose trailer lacks the marker,
/// simply has no legacy tag.
pub fn read_legacy_tag<R: Read + Seek>(
    source: &mut R,
    codepage: LegacyCodepage,
) -> Result<Option<LegacyTag>> {
    let len = source.seek(SeekFrom::End(0))?;
    if len < TRAILER_LEN as u64 {
        debug!(target: "id3v1", len, "source shorter than a trailer");
        return Ok(None);
    }

    source.seek(SeekFrom::End(-(TRAILER_LEN as i64)))?;
    let mut trailer = [0u8; TRAILER_LEN];
    source.read_exact(&mut trailer)?;

    let tag = LegacyTag::parse(&trailer, codepage);
    if tag.is_none() {
        debug!(target: "id3v1", "no TAG marker in trailer");
    }
    Ok(tag)
}

/// Open `path` and read its ID3v1 trailer. The file is closed on return.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn read_legacy_tag_from_path(
    path: impl AsRef<Path>,
    codepage: LegacyCodepage,
) -> Result<Option<LegacyTag>> {
    let mut file = File::open(path.as_ref())?;
    read_legacy_tag(&mut file, codepage)
}

/// Sequential reader over the trailer that, like a short file read,
/// yields fewer bytes than requested at the end.
struct FieldCursor<'a> {
    bytes: &'a [u8],
}

impl<'a> FieldCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let (head, tail) = self.bytes.split_at(n.min(self.bytes.len()));
        self.bytes = tail;
        head
    }
}

/// Decode a fixed-width field, cutting at the first NUL and dropping
/// trailing space padding.
fn decode_field(bytes: &[u8], codepage: LegacyCodepage) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    decode_codepage(&bytes[..end], codepage)
        .trim_end()
        .to_string()
}
