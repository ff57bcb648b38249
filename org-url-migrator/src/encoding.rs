//! Text decoding with an ordered fallback chain.
//!
//! Files are decoded as UTF-8 first, then Latin-1. The Latin-1 step maps every
//! byte to the matching code point, so decoding is total; what was decoded can
//! be re-encoded for the write-back path.

/// The encoding a file was decoded with, used to write it back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

/// Decodes raw bytes, trying UTF-8 first and falling back to Latin-1.
///
/// Latin-1 accepts any byte sequence, so this always produces text.
pub fn decode(bytes: &[u8]) -> (String, TextEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_owned(), TextEncoding::Utf8),
        Err(_) => {
            let text = bytes.iter().map(|&b| b as char).collect();
            (text, TextEncoding::Latin1)
        }
    }
}

/// Encodes text back into the encoding it was decoded with.
///
/// Returns `None` when a character cannot be represented, which only happens
/// for Latin-1 files where a substitution introduced a code point above
/// U+00FF. Callers treat that like any other write failure for the file.
pub fn encode(text: &str, encoding: TextEncoding) -> Option<Vec<u8>> {
    match encoding {
        TextEncoding::Utf8 => Some(text.as_bytes().to_vec()),
        TextEncoding::Latin1 => {
            let mut out = Vec::with_capacity(text.len());
            for ch in text.chars() {
                let code = ch as u32;
                if code > 0xFF {
                    return None;
                }
                out.push(code as u8);
            }
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_utf8() {
        let (text, enc) = decode("héllo".as_bytes());
        assert_eq!(text, "héllo");
        assert_eq!(enc, TextEncoding::Utf8);
    }

    #[test]
    fn falls_back_to_latin1() {
        // 0xE9 alone is invalid UTF-8 but is 'é' in Latin-1.
        let (text, enc) = decode(b"caf\xE9");
        assert_eq!(text, "café");
        assert_eq!(enc, TextEncoding::Latin1);
    }

    #[test]
    fn latin1_round_trips() {
        let bytes: Vec<u8> = (1..=255).collect();
        let (text, enc) = decode(&bytes);
        if enc == TextEncoding::Latin1 {
            assert_eq!(encode(&text, enc).unwrap(), bytes);
        }
    }

    #[test]
    fn latin1_rejects_wide_chars() {
        assert!(encode("snowman \u{2603}", TextEncoding::Latin1).is_none());
    }

    #[test]
    fn utf8_encodes_anything() {
        assert_eq!(
            encode("snowman \u{2603}", TextEncoding::Utf8).unwrap(),
            "snowman \u{2603}".as_bytes()
        );
    }
}
