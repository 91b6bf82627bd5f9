//! Reading extracted timing-sheet text from disk

use encoding_rs::WINDOWS_1252;
use std::fs;
use std::io;
use std::path::Path;

/// Page separator emitted by text extractors between pages
pub const PAGE_BREAK: char = '\u{0C}';

/// Read a text dump, falling back to Windows-1252 for non UTF-8 files
pub fn read_text_dump<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_text(bytes))
}

fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                tracing::warn!("Text dump contained undecodable bytes, replaced");
            }
            decoded.into_owned()
        }
    }
}

/// Text of the first page only
pub fn first_page(text: &str) -> &str {
    text.split(PAGE_BREAK).next().unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let text = decode_text("Raúl FERNANDEZ".as_bytes().to_vec());
        assert_eq!(text, "Raúl FERNANDEZ");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // "Ñ" is 0xD1 in Windows-1252 and invalid as a lone UTF-8 byte
        let text = decode_text(vec![b'A', 0xD1, b'B']);
        assert_eq!(text, "AÑB");
    }

    #[test]
    fn test_first_page() {
        assert_eq!(first_page("page one\u{0C}page two"), "page one");
        assert_eq!(first_page("single page"), "single page");
        assert_eq!(first_page(""), "");
    }

    #[test]
    fn test_read_text_dump_missing_file() {
        assert!(read_text_dump("/nonexistent/motogp_pace/none.txt").is_err());
    }
}
