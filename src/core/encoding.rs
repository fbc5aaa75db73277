//! Text encoding detection and conversion for the files being patched.

use crate::domain::model::FileEncoding;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Guesses the encoding of `bytes`: BOM first, then UTF-8 validity, else latin1.
pub fn detect_encoding(bytes: &[u8]) -> FileEncoding {
    if bytes.starts_with(UTF8_BOM) {
        FileEncoding::Utf8
    } else if bytes.starts_with(UTF16LE_BOM) {
        FileEncoding::Utf16Le
    } else if bytes.starts_with(UTF16BE_BOM) {
        FileEncoding::Utf16Be
    } else if bytes.is_ascii() {
        FileEncoding::Ascii
    } else if std::str::from_utf8(bytes).is_ok() {
        FileEncoding::Utf8
    } else {
        FileEncoding::Latin1
    }
}

pub fn has_bom(bytes: &[u8]) -> bool {
    bytes.starts_with(UTF8_BOM) || bytes.starts_with(UTF16LE_BOM) || bytes.starts_with(UTF16BE_BOM)
}

/// Picks the encoding to use for a file. Returns a warning when an explicit
/// encoding disagrees with what was detected.
pub fn resolve_encoding(requested: FileEncoding, detected: FileEncoding) -> (FileEncoding, Option<String>) {
    match requested {
        // 純 ASCII 檔案以 UTF-8 寫回，避免非 ASCII 的屬性值被替換成 '?'
        FileEncoding::Auto if detected == FileEncoding::Ascii => (FileEncoding::Utf8, None),
        FileEncoding::Auto => (detected, None),
        explicit if compatible(explicit, detected) => (explicit, None),
        explicit => (
            explicit,
            Some(format!(
                "Detected file encoding ({}) is different to the one specified ({}).",
                detected, explicit
            )),
        ),
    }
}

// 純 ASCII 內容同時是合法的 UTF-8 與 latin1
fn compatible(explicit: FileEncoding, detected: FileEncoding) -> bool {
    explicit == detected
        || (detected == FileEncoding::Ascii
            && matches!(explicit, FileEncoding::Utf8 | FileEncoding::Latin1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    /// Byte sequences the encoding could not decode, read as U+FFFD.
    pub replaced: usize,
}

fn decode_utf8(bytes: &[u8]) -> DecodedText {
    let mut text = String::with_capacity(bytes.len());
    let mut replaced = 0;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            text.push(char::REPLACEMENT_CHARACTER);
            replaced += 1;
        }
    }
    DecodedText { text, replaced }
}

fn decode_utf16(bytes: &[u8], encoding: FileEncoding) -> DecodedText {
    let units = bytes.chunks_exact(2).map(|pair| match encoding {
        FileEncoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
        _ => u16::from_le_bytes([pair[0], pair[1]]),
    });

    let mut text = String::with_capacity(bytes.len() / 2);
    let mut replaced = 0;
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(c) => text.push(c),
            Err(_) => {
                text.push(char::REPLACEMENT_CHARACTER);
                replaced += 1;
            }
        }
    }
    // 奇數長度時最後一個位元組無法成對
    if bytes.len() % 2 != 0 {
        text.push(char::REPLACEMENT_CHARACTER);
        replaced += 1;
    }
    DecodedText { text, replaced }
}

/// Decodes `bytes` as `encoding`, dropping a leading BOM. Undecodable input
/// becomes U+FFFD and is counted, so an explicit encoding that does not fit
/// the file still yields text.
pub fn decode(bytes: &[u8], encoding: FileEncoding) -> DecodedText {
    match encoding {
        FileEncoding::Auto => decode(bytes, detect_encoding(bytes)),
        FileEncoding::Utf8 => decode_utf8(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
        FileEncoding::Utf16Le => decode_utf16(bytes.strip_prefix(UTF16LE_BOM).unwrap_or(bytes), encoding),
        FileEncoding::Utf16Be => decode_utf16(bytes.strip_prefix(UTF16BE_BOM).unwrap_or(bytes), encoding),
        FileEncoding::Latin1 => DecodedText {
            text: bytes.iter().map(|&b| char::from(b)).collect(),
            replaced: 0,
        },
        FileEncoding::Ascii => DecodedText {
            text: bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER })
                .collect(),
            replaced: bytes.iter().filter(|b| !b.is_ascii()).count(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub bytes: Vec<u8>,
    /// Characters the encoding could not represent, written as `?`.
    pub replaced: usize,
}

/// Encodes `text`, prefixing a BOM when `write_bom` is set and the encoding has one.
pub fn encode(text: &str, encoding: FileEncoding, write_bom: bool) -> EncodedText {
    let mut bytes = Vec::with_capacity(text.len() + 3);
    let mut replaced = 0;

    match encoding {
        FileEncoding::Auto | FileEncoding::Utf8 => {
            if write_bom {
                bytes.extend_from_slice(UTF8_BOM);
            }
            bytes.extend_from_slice(text.as_bytes());
        }
        FileEncoding::Utf16Le => {
            if write_bom {
                bytes.extend_from_slice(UTF16LE_BOM);
            }
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
        }
        FileEncoding::Utf16Be => {
            if write_bom {
                bytes.extend_from_slice(UTF16BE_BOM);
            }
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
        }
        FileEncoding::Latin1 | FileEncoding::Ascii => {
            let limit = if encoding == FileEncoding::Ascii { 0x7F } else { 0xFF };
            for c in text.chars() {
                match u8::try_from(u32::from(c)) {
                    Ok(b) if u32::from(b) <= limit => bytes.push(b),
                    _ => {
                        bytes.push(b'?');
                        replaced += 1;
                    }
                }
            }
        }
    }

    EncodedText { bytes, replaced }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_encoding() {
        assert_eq!(detect_encoding(b"plain"), FileEncoding::Ascii);
        assert_eq!(detect_encoding("Copyright ©".as_bytes()), FileEncoding::Utf8);
        assert_eq!(detect_encoding(&[0xEF, 0xBB, 0xBF, b'a']), FileEncoding::Utf8);
        assert_eq!(detect_encoding(&[0xFF, 0xFE, b'a', 0]), FileEncoding::Utf16Le);
        assert_eq!(detect_encoding(&[0xFE, 0xFF, 0, b'a']), FileEncoding::Utf16Be);
        assert_eq!(detect_encoding(&[b'a', 0xA9]), FileEncoding::Latin1);
    }

    #[test]
    fn test_resolve_encoding_warns_on_mismatch() {
        assert_eq!(resolve_encoding(FileEncoding::Auto, FileEncoding::Utf16Le).0, FileEncoding::Utf16Le);
        assert_eq!(resolve_encoding(FileEncoding::Auto, FileEncoding::Ascii).0, FileEncoding::Utf8);
        assert!(resolve_encoding(FileEncoding::Utf8, FileEncoding::Ascii).1.is_none());

        let (chosen, warning) = resolve_encoding(FileEncoding::Utf8, FileEncoding::Utf16Le);
        assert_eq!(chosen, FileEncoding::Utf8);
        assert!(warning.unwrap().contains("utf-16le"));
    }

    #[test]
    fn test_decode_strips_bom() {
        let decoded = decode(&[0xEF, 0xBB, 0xBF, b'h', b'i'], FileEncoding::Utf8);
        assert_eq!(decoded.text, "hi");
        assert_eq!(decoded.replaced, 0);

        assert_eq!(decode(&[0xFF, 0xFE, b'h', 0, b'i', 0], FileEncoding::Auto).text, "hi");
        assert_eq!(decode(&[0xA9], FileEncoding::Latin1).text, "©");
    }

    #[test]
    fn test_decode_mismatched_encoding_replaces_instead_of_failing() {
        // latin1 '©' read as UTF-8
        let decoded = decode(b"[assembly: AssemblyCopyright(\"\xA9 2022\")]", FileEncoding::Utf8);
        assert_eq!(decoded.text, "[assembly: AssemblyCopyright(\"\u{FFFD} 2022\")]");
        assert_eq!(decoded.replaced, 1);

        let decoded = decode(&[b'a', 0xA9, 0xAE], FileEncoding::Ascii);
        assert_eq!(decoded.text, "a\u{FFFD}\u{FFFD}");
        assert_eq!(decoded.replaced, 2);

        let decoded = decode(&[b'h', 0, b'i'], FileEncoding::Utf16Le);
        assert_eq!(decoded.text, "h\u{FFFD}");
        assert_eq!(decoded.replaced, 1);
    }

    #[test]
    fn test_encode_with_bom_and_replacement() {
        let encoded = encode("hi", FileEncoding::Utf8, true);
        assert_eq!(encoded.bytes, vec![0xEF, 0xBB, 0xBF, b'h', b'i']);

        let encoded = encode("hi", FileEncoding::Utf16Be, false);
        assert_eq!(encoded.bytes, vec![0, b'h', 0, b'i']);

        let encoded = encode("a€", FileEncoding::Latin1, true);
        assert_eq!(encoded.bytes, vec![b'a', b'?']);
        assert_eq!(encoded.replaced, 1);
    }
}
