//! On-disk packet sink and local filename derivation.

mod writer;

pub use writer::FileStore;

/// Default filename when the URL path yields nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Derive a safe local filename from the target URL's last path segment.
///
/// Query strings and fragments are dropped by URL parsing; separators, NUL,
/// and control characters are replaced so the result is safe on Linux.
pub fn derive_filename(target: &str) -> String {
    let segment = url::Url::parse(target)
        .ok()
        .and_then(|u| {
            u.path()
                .split('/')
                .filter(|s| !s.is_empty())
                .last()
                .map(str::to_string)
        })
        .unwrap_or_default();

    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == '\0' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ');

    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}
