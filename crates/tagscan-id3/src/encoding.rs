// SPDX-License-Identifier: GPL-3.0-or-later

//! Text decoding for frame payloads and trailer fields.
//!
//! ID3v2 frames announce their text encoding with a one-byte indicator:
//! - `0` ISO-8859-1, see [`Latin1Direction`] for how it is read
//! - `1` UTF-16, byte-order mark expected
//! - `2` UTF-16 big-endian, no byte-order mark
//! - `3` UTF-8
//!
//! ID3v1 trailers carry no indicator at all, so their code page is a
//! reader setting ([`LegacyCodepage`]).

use tagscan_config::{Latin1Direction, LegacyCodepage};
use tracing::debug;

use crate::fields::COVER_FRAME;
use crate::{Result, TagError, TagValue};

/// Text encoding named by a frame's indicator byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Latin1,
    Utf16,
    Utf16Be,
    Utf8,
}

impl TryFrom<u8> for TextEncoding {
    type Error = TagError;

    fn try_from(indicator: u8) -> Result<Self> {
        match indicator {
            0 => Ok(Self::Latin1),
            1 => Ok(Self::Utf16),
            2 => Ok(Self::Utf16Be),
            3 => Ok(Self::Utf8),
            other => Err(TagError::UnknownEncoding(other)),
        }
    }
}

impl TextEncoding {
    /// Decode `bytes` to a string, dropping trailing NUL terminators.
    ///
    /// `latin1` only matters for [`TextEncoding::Latin1`].
    pub fn decode(self, bytes: &[u8], latin1: Latin1Direction) -> Result<String> {
        let text = match self {
            Self::Latin1 => match latin1 {
                Latin1Direction::FromUtf8 => narrow_to_latin1(bytes)?,
                Latin1Direction::ToUtf8 => decode_latin1(bytes),
            },
            Self::Utf16 => match bytes {
                [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
                [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
                _ => decode_utf16(bytes, u16::from_le_bytes),
            },
            Self::Utf16Be => match bytes {
                [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
                _ => decode_utf16(bytes, u16::from_be_bytes),
            },
            Self::Utf8 => match String::from_utf8(bytes.to_vec()) {
                Ok(s) => s,
                Err(e) => {
                    debug!(target: "id3v2", error = %e, "invalid UTF-8 in frame, replacing");
                    String::from_utf8_lossy(bytes).into_owned()
                }
            },
        };
        Ok(trim_terminators(text))
    }
}

/// Decode one frame payload with the default [`Latin1Direction`].
///
/// Cover art is returned untouched; every other frame is transcoded
/// according to `encoding_byte`.
pub fn decode_frame_value(payload: Vec<u8>, frame_id: &str, encoding_byte: u8) -> Result<TagValue> {
    decode_frame_value_with(payload, frame_id, encoding_byte, Latin1Direction::default())
}

/// Decode one frame payload, reading indicator `0` as `latin1` says.
pub fn decode_frame_value_with(
    payload: Vec<u8>,
    frame_id: &str,
    encoding_byte: u8,
    latin1: Latin1Direction,
) -> Result<TagValue> {
    if frame_id == COVER_FRAME {
        return Ok(TagValue::Binary(payload));
    }
    let encoding = TextEncoding::try_from(encoding_byte)?;
    Ok(TagValue::Text(encoding.decode(&payload, latin1)?))
}

/// Decode bytes from a single-byte code page.
pub fn decode_codepage(bytes: &[u8], codepage: LegacyCodepage) -> String {
    match codepage {
        LegacyCodepage::Latin1 => decode_latin1(bytes),
        LegacyCodepage::Windows1251 => bytes
            .iter()
            .map(|&b| match b {
                0x00..=0x7F => b as char,
                _ => char::from_u32(WINDOWS_1251_HIGH[(b - 0x80) as usize] as u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER),
            })
            .collect(),
    }
}

/// Read `bytes` as UTF-8 and keep the text only if every character fits
/// in ISO-8859-1.
fn narrow_to_latin1(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes).map_err(|_| TagError::UnrepresentableText)?;
    if text.chars().any(|c| c as u32 > 0xFF) {
        return Err(TagError::UnrepresentableText);
    }
    Ok(text.to_string())
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    // An odd trailing byte cannot form a code unit and is dropped.
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn trim_terminators(mut text: String) -> String {
    let end = text.trim_end_matches('\0').len();
    text.truncate(end);
    text
}

/// Windows-1251 code points for bytes 0x80..=0xFF. 0x98 is unassigned.
static WINDOWS_1251_HIGH: [u16; 128] = [
    0x0402, 0x0403, 0x201A, 0x0453, 0x201E, 0x2026, 0x2020, 0x2021, // 0x80
    0x20AC, 0x2030, 0x0409, 0x2039, 0x040A, 0x040C, 0x040B, 0x040F, // 0x88
    0x0452, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, // 0x90
    0xFFFD, 0x2122, 0x0459, 0x203A, 0x045A, 0x045C, 0x045B, 0x045F, // 0x98
    0x00A0, 0x040E, 0x045E, 0x0408, 0x00A4, 0x0490, 0x00A6, 0x00A7, // 0xA0
    0x0401, 0x00A9, 0x0404, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x0407, // 0xA8
    0x00B0, 0x00B1, 0x0406, 0x0456, 0x0491, 0x00B5, 0x00B6, 0x00B7, // 0xB0
    0x0451, 0x2116, 0x0454, 0x00BB, 0x0458, 0x0405, 0x0455, 0x0457, // 0xB8
    0x0410, 0x0411, 0x0412, 0x0413, 0x0414, 0x0415, 0x0416, 0x0417, // 0xC0
    0x0418, 0x0419, 0x041A, 0x041B, 0x041C, 0x041D, 0x041E, 0x041F, // 0xC8
    0x0420, 0x0421, 0x0422, 0x0423, 0x0424, 0x0425, 0x0426, 0x0427, // 0xD0
    0x0428, 0x0429, 0x042A, 0x042B, 0x042C, 0x042D, 0x042E, 0x042F, // 0xD8
    0x0430, 0x0431, 0x0432, 0x0433, 0x0434, 0x0435, 0x0436, 0x0437, // 0xE0
    0x0438, 0x0439, 0x043A, 0x043B, 0x043C, 0x043D, 0x043E, 0x043F, // 0xE8
    0x0440, 0x0441, 0x0442, 0x0443, 0x0444, 0x0445, 0x0446, 0x0447, // 0xF0
    0x0448, 0x0449, 0x044A, 0x044B, 0x044C, 0x044D, 0x044E, 0x044F, // 0xF8
];

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        bytes
    }

    #[test]
    fn test_utf16le_with_bom_matches_source_text() {
        let text = "Déjà vu – 東京";
        let value = decode_frame_value(utf16le_with_bom(text), "TIT2", 1).unwrap();
        assert_eq!(value, TagValue::Text(text.to_string()));
    }

    #[test]
    fn test_utf16_honours_big_endian_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend("Hi".encode_utf16().flat_map(u16::to_be_bytes));
        assert_eq!(TextEncoding::Utf16.decode(&bytes, Latin1Direction::default()).unwrap(), "Hi");
    }

    #[test]
    fn test_utf16_without_bom_defaults_to_little_endian() {
        let bytes: Vec<u8> = "ok".encode_utf16().flat_map(u16::to_le_bytes).collect();
        assert_eq!(TextEncoding::Utf16.decode(&bytes, Latin1Direction::default()).unwrap(), "ok");
    }

    #[test]
    fn test_utf16be() {
        let bytes: Vec<u8> = "Ünïcode".encode_utf16().flat_map(u16::to_be_bytes).collect();
        let value = decode_frame_value(bytes, "TPE1", 2).unwrap();
        assert_eq!(value.as_text(), Some("Ünïcode"));
    }

    #[test]
    fn test_utf8_passthrough_trims_terminator() {
        let value = decode_frame_value(b"Caf\xC3\xA9\0".to_vec(), "TALB", 3).unwrap();
        assert_eq!(value.as_text(), Some("Café"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let value = decode_frame_value(vec![b'a', 0xFF, b'b'], "TALB", 3).unwrap();
        assert_eq!(value.as_text(), Some("a\u{FFFD}b"));
    }

    #[test]
    fn test_indicator_zero_reads_utf8_by_default() {
        let value = decode_frame_value(b"Caf\xC3\xA9".to_vec(), "TIT2", 0).unwrap();
        assert_eq!(value.as_text(), Some("Café"));
    }

    #[test]
    fn test_indicator_zero_rejects_text_outside_latin1() {
        let err = decode_frame_value("Привет".as_bytes().to_vec(), "TIT2", 0).unwrap_err();
        assert!(matches!(err, TagError::UnrepresentableText));

        let err = decode_frame_value(vec![b'C', b'a', b'f', 0xE9], "TIT2", 0).unwrap_err();
        assert!(matches!(err, TagError::UnrepresentableText));
    }

    #[test]
    fn test_indicator_zero_as_latin1_bytes() {
        let value =
            decode_frame_value_with(vec![b'C', b'a', b'f', 0xE9], "TIT2", 0, Latin1Direction::ToUtf8)
                .unwrap();
        assert_eq!(value.as_text(), Some("Café"));

        // UTF-8 input read byte by byte.
        let value =
            decode_frame_value_with(b"Caf\xC3\xA9".to_vec(), "TIT2", 0, Latin1Direction::ToUtf8)
                .unwrap();
        assert_eq!(value.as_text(), Some("Caf\u{C3}\u{A9}"));
    }

    #[test]
    fn test_cover_is_binary_regardless_of_indicator() {
        let payload = vec![0x00, 0xFF, 0xD8, 0xFF];
        let value = decode_frame_value(payload.clone(), "APIC", 9).unwrap();
        assert_eq!(value, TagValue::Binary(payload));
    }

    #[test]
    fn test_unknown_encoding() {
        let err = decode_frame_value(b"x".to_vec(), "TIT2", 4).unwrap_err();
        assert!(matches!(err, TagError::UnknownEncoding(4)));
    }

    #[test]
    fn test_windows1251() {
        // "Привет" in Windows-1251.
        let bytes = [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        assert_eq!(decode_codepage(&bytes, LegacyCodepage::Windows1251), "Привет");
        assert_eq!(decode_codepage(&[0xA8, 0xB8], LegacyCodepage::Windows1251), "Ёё");
        assert_eq!(decode_codepage(&[0x98], LegacyCodepage::Windows1251), "\u{FFFD}");
    }

    #[test]
    fn test_codepages_agree_on_ascii() {
        let bytes = b"Plain ASCII 123";
        assert_eq!(
            decode_codepage(bytes, LegacyCodepage::Latin1),
            decode_codepage(bytes, LegacyCodepage::Windows1251)
        );
    }
}
