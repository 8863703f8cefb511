//! Best-effort decoding of console output with an unknown encoding.
//!
//! The capture tool writes its diagnostics in the console codepage of the
//! host, which on non-English Windows installs is not UTF-8. Decoding tries,
//! in order: strict UTF-8, the locale-declared encoding, a statistical
//! detector, and finally a lossy UTF-8 pass. It always returns a string.
//!
//! The locale tier reads `LC_ALL`/`LC_CTYPE`/`LANG`. Windows usually leaves
//! those unset, so there the statistical tier carries the load; the ANSI
//! codepage is not queried.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

const REPLACEMENT: char = '\u{FFFD}';

/// Marker that shows up when CP949 bytes survive a nominally clean UTF-8
/// decode of mixed output.
const MOJIBAKE_MARKER: char = '留';

pub fn decode_console_bytes(bytes: &[u8]) -> String {
    // 1) Strict UTF-8, accepted only when free of replacement/mojibake marks.
    if let Ok(text) = std::str::from_utf8(bytes) {
        if !text.contains(REPLACEMENT) && !text.contains(MOJIBAKE_MARKER) {
            return text.to_string();
        }
    }

    // 2) The locale-declared encoding, when the locale names one we know.
    if let Some(encoding) = locale_encoding() {
        let (text, _, had_errors) = encoding.decode(bytes);
        if !had_errors && !text.contains(REPLACEMENT) {
            return text.into_owned();
        }
    }

    // 3) Statistical guess.
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);
    let (text, _, had_errors) = guessed.decode(bytes);
    if !had_errors && !text.contains(REPLACEMENT) {
        return text.into_owned();
    }

    // 4) Lossy fallback, never fails.
    String::from_utf8_lossy(bytes).into_owned()
}

fn locale_encoding() -> Option<&'static Encoding> {
    let locale = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LC_CTYPE"))
        .or_else(|_| std::env::var("LANG"))
        .ok()?;
    // "ko_KR.CP949" -> "CP949"; a locale without a codeset yields no label hit.
    let label = locale.rsplit('.').next()?.trim();
    Encoding::for_label(label.as_bytes())
}
