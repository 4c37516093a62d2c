//! Byte-encoding adapter (component A): named-encoding transcoding
//! between raw record bytes and Unicode text.

use encoding_rs::Encoding;

use crate::error::{IsisError, Result};

pub const DEFAULT_ISO_ENCODING: &str = "cp1252";
pub const DEFAULT_JSONL_ENCODING: &str = "utf-8";

fn resolve(name: &str) -> Result<&'static Encoding> {
    Encoding::for_label(name.as_bytes())
        .ok_or_else(|| IsisError::encoding(format!("unknown encoding `{name}`")))
}

/// Decode `bytes` as `encoding`. Fails with `EncodingError` on any
/// byte sequence the encoding cannot map.
pub fn decode(bytes: &[u8], encoding: &str) -> Result<String> {
    let enc = resolve(encoding)?;
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(IsisError::encoding(format!("invalid `{encoding}` byte sequence")));
    }
    Ok(text.into_owned())
}

/// Encode `text` as `encoding`. Fails with `EncodingError` if `text`
/// contains characters unrepresentable in the target encoding.
pub fn encode(text: &str, encoding: &str) -> Result<Vec<u8>> {
    let enc = resolve(encoding)?;
    let (bytes, _, had_errors) = enc.encode(text);
    if had_errors {
        return Err(IsisError::encoding(format!("`{text}` is not representable in `{encoding}`")));
    }
    Ok(bytes.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cp1252_round_trips_ascii() {
        let bytes = encode("hello", "cp1252").unwrap();
        assert_eq!(decode(&bytes, "cp1252").unwrap(), "hello");
    }

    #[test]
    fn cp1252_decodes_high_bytes() {
        // 0xE9 is 'é' in cp1252.
        assert_eq!(decode(&[0xE9], "cp1252").unwrap(), "é");
    }

    #[test]
    fn unknown_encoding_errors() {
        assert!(matches!(decode(b"x", "not-a-real-encoding"), Err(IsisError::Encoding { .. })));
    }

    #[test]
    fn unrepresentable_text_errors_on_encode() {
        // cp1252 has no code point for U+1F600.
        assert!(matches!(encode("\u{1F600}", "cp1252"), Err(IsisError::Encoding { .. })));
    }
}
