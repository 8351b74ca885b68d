// SPDX-License-Identifier: GPL-3.0-or-later

//! Combines the ID3v2 scan and the ID3v1 trailer into one record.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tagscan_config::ReaderConfig;
use tracing::{debug, info, instrument, warn};

use crate::v1::{read_legacy_tag_from_path, LegacyTag, LEGACY_FIELDS};
use crate::v2::read_frame_tags_from_path;
use crate::{MetadataRecord, Result, TagError};

/// Fields the trailer fills in when the ID3v2 tag leaves them blank.
pub const FALLBACK_FIELDS: [&str; 5] = ["title", "artist", "album", "year", "genre"];

/// Reads and merges both tag formats with a fixed reader configuration.
///
/// Holds no per-file state, so one reader can serve any number of calls.
#[derive(Debug, Clone, Default)]
pub struct TagReader {
    config: ReaderConfig,
}

impl TagReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read every tag field available in the file at `path`.
    ///
    /// Only a missing or unreadable file is an error. Each tag format is
    /// read through its own handle, and a format that is absent or
    /// malformed just contributes nothing.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn info(&self, path: impl AsRef<Path>) -> Result<MetadataRecord> {
        let path = path.as_ref();
        check_readable(path)?;

        let frames = match read_frame_tags_from_path(path, &self.config) {
            Ok(scan) => {
                if scan.is_partial() {
                    debug!(target: "merge", end = ?scan.end, "ID3v2 scan ended early");
                }
                Some(scan.record)
            }
            Err(e @ (TagError::InvalidSignature | TagError::UnsupportedVersion(_))) => {
                debug!(target: "merge", reason = %e, "no usable ID3v2 tag");
                None
            }
            Err(e) => {
                warn!(target: "merge", error = %e, "ID3v2 tag could not be read");
                None
            }
        };

        let legacy = match read_legacy_tag_from_path(path, self.config.legacy_codepage) {
            Ok(tag) => tag,
            Err(e) => {
                warn!(target: "merge", error = %e, "ID3v1 trailer could not be read");
                None
            }
        };

        let record = merge(frames, legacy.as_ref());
        info!(target: "merge", fields = record.len(), "tags read");
        Ok(record)
    }
}

/// Read every tag field available in the file at `path` with the default
/// reader configuration.
pub fn info(path: impl AsRef<Path>) -> Result<MetadataRecord> {
    TagReader::default().info(path)
}

/// Merge the two sources.
///
/// With an ID3v2 record, the trailer only fills [`FALLBACK_FIELDS`] that
/// are missing or empty there. Without one, every non-blank trailer field
/// is used.
pub fn merge(frames: Option<MetadataRecord>, legacy: Option<&LegacyTag>) -> MetadataRecord {
    match (frames, legacy) {
        (Some(mut record), Some(legacy)) => {
            for field in FALLBACK_FIELDS {
                if !record.is_blank(field) {
                    continue;
                }
                if let Some(value) = legacy.field(field) {
                    debug!(target: "merge", field, "filled from ID3v1");
                    record.insert(field, value);
                }
            }
            record
        }
        (Some(record), None) => record,
        (None, Some(legacy)) => LEGACY_FIELDS
            .iter()
            .filter_map(|&field| legacy.field(field).map(|value| (field, value)))
            .collect(),
        (None, None) => MetadataRecord::new(),
    }
}

fn check_readable(path: &Path) -> Result<()> {
    let unreadable = |source: io::Error| TagError::Unreadable {
        path: path.display().to_string(),
        source,
    };

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(TagError::FileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(unreadable(e)),
    };

    if metadata.is_dir() {
        return Err(unreadable(io::Error::other("path is a directory")));
    }

    File::open(path).map(drop).map_err(unreadable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TagValue, UnknownFramePolicy};

    fn legacy() -> LegacyTag {
        LegacyTag {
            title: "Old Title".to_string(),
            artist: "Old Artist".to_string(),
            album: "Old Album".to_string(),
            year: "2001".to_string(),
            comment: "Old comment".to_string(),
            genre_index: 8,
        }
    }

    #[test]
    fn test_frames_win_over_trailer() {
        let frames: MetadataRecord = [("title", "New Title"), ("artist", "New Artist")]
            .into_iter()
            .collect();
        let record = merge(Some(frames), Some(&legacy()));

        assert_eq!(record.text("title"), Some("New Title"));
        assert_eq!(record.text("artist"), Some("New Artist"));
        assert_eq!(record.text("album"), Some("Old Album"));
        assert_eq!(record.text("year"), Some("2001"));
        assert_eq!(record.text("genre"), Some("Jazz"));
    }

    #[test]
    fn test_empty_frame_value_falls_back() {
        let frames: MetadataRecord = [("year", "")].into_iter().collect();
        let record = merge(Some(frames), Some(&legacy()));
        assert_eq!(record.text("year"), Some("2001"));
    }

    #[test]
    fn test_comment_has_no_fallback_when_frames_present() {
        let frames: MetadataRecord = [("title", "New Title")].into_iter().collect();
        let record = merge(Some(frames), Some(&legacy()));
        assert!(record.get("comment").is_none());
    }

    #[test]
    fn test_extended_fields_pass_through() {
        let mut frames: MetadataRecord = [("composer", "Someone")].into_iter().collect();
        frames.insert("cover", vec![1u8, 2, 3]);
        let record = merge(Some(frames), None);

        assert_eq!(record.text("composer"), Some("Someone"));
        assert_eq!(record.get("cover"), Some(&TagValue::Binary(vec![1, 2, 3])));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_trailer_only_uses_every_field() {
        let record = merge(None, Some(&legacy()));
        assert_eq!(record.len(), 6);
        assert_eq!(record.text("comment"), Some("Old comment"));
        assert_eq!(record.text("genre"), Some("Jazz"));
    }

    #[test]
    fn test_bad_trailer_genre_is_left_out() {
        let mut tag = legacy();
        tag.genre_index = 148;
        let record = merge(Some(MetadataRecord::new()), Some(&tag));
        assert!(record.get("genre").is_none());
        assert_eq!(record.text("title"), Some("Old Title"));
    }

    #[test]
    fn test_nothing_merges_to_empty() {
        assert!(merge(None, None).is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = info("definitely/not/here.mp3").unwrap_err();
        assert!(matches!(err, TagError::FileNotFound(_)));
    }

    #[test]
    fn test_reader_keeps_its_config() {
        let config = ReaderConfig {
            unknown_frames: UnknownFramePolicy::Skip,
            ..ReaderConfig::default()
        };
        let reader = TagReader::new(config);
        assert_eq!(reader.config().unknown_frames, UnknownFramePolicy::Skip);
        assert_eq!(TagReader::default().config().unknown_frames, UnknownFramePolicy::Stop);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_without_read_permission_is_unreadable() {
        use std::os::unix::fs::PermissionsExt;

        let file = tempfile::NamedTempFile::new().unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o000)).unwrap();
        if File::open(file.path()).is_ok() {
            // Running as root; permissions are not enforced.
            return;
        }

        let err = info(file.path()).unwrap_err();
        assert!(matches!(err, TagError::Unreadable { .. }));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = std::env::temp_dir();
        let err = info(&dir).unwrap_err();
        assert!(matches!(err, TagError::Unreadable { .. }));
    }
}
