use std::fmt;

use thiserror::Error as ThisError;

/// Which way a failed conversion was going.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncodingDirection {
    Utf8ToUtf16,
    Utf16ToUtf8,
}

impl EncodingDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            EncodingDirection::Utf8ToUtf16 => "UTF-8 to UTF-16",
            EncodingDirection::Utf16ToUtf8 => "UTF-16 to UTF-8",
        }
    }
}

impl fmt::Display for EncodingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A text value could not cross the host boundary.
///
/// `offset` is in input units: bytes for UTF-8 input, code units for UTF-16 input.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("unicode conversion from {direction} failed: invalid sequence at offset {offset}")]
pub struct EncodingError {
    pub direction: EncodingDirection,
    pub offset: usize,
}

/// Convert internal UTF-8 text into host UTF-16 code units.
pub fn to_host_text(utf8: &[u8]) -> Result<Vec<u16>, EncodingError> {
    let text = std::str::from_utf8(utf8).map_err(|e| EncodingError {
        direction: EncodingDirection::Utf8ToUtf16,
        offset: e.valid_up_to(),
    })?;
    Ok(text.encode_utf16().collect())
}

/// Convert host UTF-16 code units into internal UTF-8 text.
///
/// Unpaired surrogates are rejected, never replaced.
pub fn from_host_text(units: &[u16]) -> Result<String, EncodingError> {
    let mut out = String::with_capacity(units.len());
    let mut offset = 0usize;
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) => {
                out.push(c);
                offset += c.len_utf16();
            }
            Err(_) => {
                return Err(EncodingError {
                    direction: EncodingDirection::Utf16ToUtf8,
                    offset,
                })
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_astral_text_cross_both_ways() {
        let text = "col_\u{1F600}_é";
        let units = to_host_text(text.as_bytes()).unwrap();
        assert_eq!(units.len(), text.encode_utf16().count());
        assert_eq!(from_host_text(&units).unwrap(), text);
    }

    #[test]
    fn empty_text_is_valid() {
        assert!(to_host_text(b"").unwrap().is_empty());
        assert_eq!(from_host_text(&[]).unwrap(), "");
    }

    #[test]
    fn invalid_utf8_reports_direction_and_offset() {
        let err = to_host_text(b"ab\xffcd").unwrap_err();
        assert_eq!(err.direction, EncodingDirection::Utf8ToUtf16);
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn lone_surrogates_are_rejected() {
        // 'a', lone high surrogate, 'b'
        let err = from_host_text(&[0x61, 0xD800, 0x62]).unwrap_err();
        assert_eq!(err.direction, EncodingDirection::Utf16ToUtf8);
        assert_eq!(err.offset, 1);

        // trailing low surrogate after a valid pair
        let err = from_host_text(&[0xD83D, 0xDE00, 0xDC00]).unwrap_err();
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn message_names_the_direction() {
        let err = from_host_text(&[0xDC00]).unwrap_err();
        assert!(err.to_string().contains("UTF-16 to UTF-8"), "{err}");
    }
}
