//! Text encoding for `read_text` and `add_text`.
//!
//! Labels follow the WHATWG Encoding Standard (`utf-8`, `latin1`,
//! `shift_jis`, `utf-16le`, ...). `None` means UTF-8.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use encoding_rs::UTF_16BE;
use encoding_rs::UTF_16LE;

use crate::ArchiveError;
use crate::Result;

const DEFAULT_LABEL: &str = "utf-8";

fn lookup(label: Option<&str>) -> Result<&'static Encoding> {
    let Some(label) = label else {
        return Ok(UTF_8);
    };
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| ArchiveError::Encoding {
        encoding: label.to_string(),
        reason: "unknown encoding label".to_string(),
    })
}

/// Decodes `bytes` as text in the labelled encoding.
///
/// A byte order mark is not sniffed; it is decoded like any other
/// character.
///
/// # Errors
///
/// Returns `ArchiveError::Encoding` if the label is unknown or the bytes
/// are malformed for the encoding.
pub fn decode(bytes: &[u8], label: Option<&str>) -> Result<String> {
    let encoding = lookup(label)?;
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| ArchiveError::Encoding {
            encoding: label.unwrap_or(DEFAULT_LABEL).to_string(),
            reason: format!("malformed {} input", encoding.name()),
        })
}

/// Encodes `text` in the labelled encoding.
///
/// # Errors
///
/// Returns `ArchiveError::Encoding` if the label is unknown, the encoding
/// cannot be produced, or `text` has characters it cannot represent.
pub fn encode(text: &str, label: Option<&str>) -> Result<Vec<u8>> {
    let encoding = lookup(label)?;
    let failure = |reason: String| ArchiveError::Encoding {
        encoding: label.unwrap_or(DEFAULT_LABEL).to_string(),
        reason,
    };

    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    if encoding.output_encoding() != encoding {
        return Err(failure(format!("{} is decode-only", encoding.name())));
    }

    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(failure(format!(
            "text has characters not representable in {}",
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_utf8() {
        assert_eq!(encode("héllo", None).unwrap(), "héllo".as_bytes());
        assert_eq!(decode("héllo".as_bytes(), None).unwrap(), "héllo");
    }

    #[test]
    fn test_latin1_round_trip() {
        let bytes = encode("café", Some("latin1")).unwrap();
        assert_eq!(bytes, b"caf\xe9");
        assert_eq!(decode(&bytes, Some("ISO-8859-1")).unwrap(), "café");
    }

    #[test]
    fn test_utf16() {
        assert_eq!(encode("hi", Some("utf-16le")).unwrap(), b"h\0i\0");
        assert_eq!(encode("hi", Some("utf-16be")).unwrap(), b"\0h\0i");
        assert_eq!(decode(b"h\0i\0", Some("utf-16le")).unwrap(), "hi");
    }

    #[test]
    fn test_malformed_utf8() {
        let err = decode(b"\xff\xfe\xfd", None).unwrap_err();
        assert!(matches!(err, ArchiveError::Encoding { ref encoding, .. } if encoding == "utf-8"));
    }

    #[test]
    fn test_unknown_label() {
        let err = encode("x", Some("klingon")).unwrap_err();
        assert!(err.to_string().contains("klingon"));
        assert!(decode(b"x", Some("klingon")).is_err());
    }

    #[test]
    fn test_unrepresentable_character() {
        assert!(encode("snowman ☃", Some("latin1")).is_err());
    }
}
