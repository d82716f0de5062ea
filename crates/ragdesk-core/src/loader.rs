//! Best-effort conversion of uploaded bytes into text.
//!
//! [`load_text`] never fails. It walks a fixed decoding chain and
//! returns whatever text it can recover, possibly an empty string:
//!
//! 1. UTF-8 (a leading byte-order mark is stripped), skipping invalid
//!    sequences, as long as the input still looks like UTF-8: bytes in valid
//!    multi-byte sequences outnumber invalid bytes.
//! 2. Otherwise CP949 / Windows-949, the legacy Korean code page, decoded
//!    strictly.
//! 3. Otherwise UTF-8 with invalid sequences skipped.
//!
//! The filename is advisory only. It is logged so that format-specific
//! handling can be added later without changing the signature.

use encoding_rs::EUC_KR;
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode `bytes` into text using the fallback chain described above.
///
/// # Example
///
/// ```rust
/// use ragdesk_core::loader::load_text;
///
/// assert_eq!(load_text(b"hello", "notes.txt"), "hello");
/// assert_eq!(load_text(&[], "empty.txt"), "");
/// ```
pub fn load_text(bytes: &[u8], filename: &str) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(body) {
        debug!(filename, encoding = "utf-8", bytes = bytes.len(), "decoded upload");
        return strip_nul(text);
    }

    let (multibyte, invalid) = utf8_profile(body);
    if multibyte > invalid {
        debug!(
            filename,
            encoding = "utf-8-lossy",
            bytes = bytes.len(),
            invalid,
            "decoded upload, skipping invalid sequences"
        );
        return strip_nul(&utf8_skipping_invalid(body));
    }

    if let Some(text) = EUC_KR.decode_without_bom_handling_and_without_replacement(body) {
        debug!(filename, encoding = "cp949", bytes = bytes.len(), "decoded upload");
        return strip_nul(&text);
    }

    debug!(
        filename,
        encoding = "utf-8-lossy",
        bytes = bytes.len(),
        invalid,
        "decoded upload, skipping invalid sequences"
    );
    strip_nul(&utf8_skipping_invalid(body))
}

/// Count bytes in valid multi-byte UTF-8 sequences and invalid bytes.
fn utf8_profile(bytes: &[u8]) -> (usize, usize) {
    bytes.utf8_chunks().fold((0, 0), |(multibyte, invalid), chunk| {
        (
            multibyte + chunk.valid().bytes().filter(|b| !b.is_ascii()).count(),
            invalid + chunk.invalid().len(),
        )
    })
}

fn utf8_skipping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

fn strip_nul(text: &str) -> String {
    text.replace('\0', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        assert_eq!(load_text("café au lait".as_bytes(), "a.txt"), "café au lait");
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"hello");
        assert_eq!(load_text(&bytes, "bom.txt"), "hello");
    }

    #[test]
    fn test_empty_bytes() {
        assert_eq!(load_text(&[], "empty.txt"), "");
    }

    #[test]
    fn test_cp949_fallback() {
        // "안녕" encoded as CP949
        let bytes = [0xBE, 0xC8, 0xB3, 0xE7];
        assert!(std::str::from_utf8(&bytes).is_err());
        assert_eq!(load_text(&bytes, "korean.txt"), "안녕");
    }

    #[test]
    fn test_invalid_bytes_are_skipped() {
        // 0xFF is never valid in UTF-8 and is not a CP949 lead byte.
        let bytes = [b'o', b'k', 0xFF, b'!'];
        assert_eq!(load_text(&bytes, "broken.bin"), "ok!");
    }

    #[test]
    fn test_garbage_only_yields_empty() {
        let bytes = [0xFF, 0xFF, 0xFE];
        assert_eq!(load_text(&bytes, "junk.bin"), "");
    }

    #[test]
    fn test_utf8_with_stray_bytes_stays_utf8() {
        // trailing bytes form a valid CP949 syllable
        let mut bytes = "café au lait, déjà vu\n".as_bytes().to_vec();
        bytes.extend_from_slice(&[0xB0, 0xA1]);
        assert_eq!(load_text(&bytes, "notes.txt"), "café au lait, déjà vu\n");
    }

    #[test]
    fn test_cp949_sentence_fallback() {
        // "안녕 세계" encoded as CP949
        let bytes = [0xBE, 0xC8, 0xB3, 0xE7, b' ', 0xBC, 0xBC, 0xB0, 0xE8];
        assert_eq!(load_text(&bytes, "korean.txt"), "안녕 세계");
    }

    #[test]
    fn test_nul_bytes_removed() {
        assert_eq!(load_text(b"a\0b", "nul.txt"), "ab");
    }

    #[test]
    fn test_filename_does_not_change_decoding() {
        let a = load_text(b"same bytes", "report.pdf");
        let b = load_text(b"same bytes", "report.txt");
        assert_eq!(a, b);
    }
}
