// SPDX-License-Identifier: GPL-3.0-or-later

//! ID3v2 frame ids and the canonical field names they populate.

/// Frame id carrying attached pictures; its payload is kept as raw bytes.
pub const COVER_FRAME: &str = "APIC";

/// Frame id to canonical field name. `TYER` and `TDRC` both feed `year`.
pub static FRAME_FIELDS: [(&str, &str); 16] = [
    ("TALB", "album"),
    ("TCON", "genre"),
    ("TENC", "encoder"),
    ("TIT2", "title"),
    ("TPE1", "artist"),
    ("TPE2", "ensemble"),
    ("TYER", "year"),
    ("TCOM", "composer"),
    ("TCOP", "copyright"),
    ("TRCK", "track"),
    ("WXXX", "url"),
    ("COMM", "comment"),
    ("TDRC", "year"),
    ("APIC", "cover"),
    ("TXXX", "user_text"),
    ("PRIV", "private"),
];

/// Look up the canonical field for a frame id.
pub fn field_for(frame_id: &str) -> Option<&'static str> {
    FRAME_FIELDS
        .iter()
        .find(|(id, _)| *id == frame_id)
        .map(|(_, field)| *field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids() {
        assert_eq!(field_for("TIT2"), Some("title"));
        assert_eq!(field_for("TPE1"), Some("artist"));
        assert_eq!(field_for("APIC"), Some("cover"));
        assert_eq!(field_for("PRIV"), Some("private"));
    }

    #[test]
    fn test_year_aliases() {
        assert_eq!(field_for("TYER"), Some("year"));
        assert_eq!(field_for("TDRC"), Some("year"));
    }

    #[test]
    fn test_unknown_ids() {
        assert_eq!(field_for("TXXY"), None);
        assert_eq!(field_for(""), None);
        assert_eq!(field_for("tit2"), None);
    }

    #[test]
    fn test_table_has_no_blank_entries() {
        // The scanner stores every mapped frame, so neither side may be empty.
        for (id, field) in FRAME_FIELDS.iter() {
            assert_eq!(id.len(), 4, "frame id {id:?}");
            assert!(!field.is_empty(), "field for {id}");
        }
    }
}
