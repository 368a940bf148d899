// Output: report files and terminal display.
//
// Everything here reads a finished SimilarityMatrix (and the corpus it came
// from) and never changes it.

pub mod heatmap;
pub mod summary;
pub mod tables;
pub mod terminal;

use std::hash::Hasher;

use twox_hash::XxHash64;

/// Keep file names portable: anything outside `[A-Za-z0-9._-]` becomes `_`.
///
/// When characters were replaced, or the name is empty, `.` or `..`, a short
/// hash of the original is appended so distinct names never share a file.
pub fn sanitize_file_component(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned == s && !matches!(s, "" | "." | "..") {
        return cleaned;
    }

    let mut hasher = XxHash64::with_seed(0);
    hasher.write(s.as_bytes());
    format!("{cleaned}-{:08x}", hasher.finish() as u32)
}
