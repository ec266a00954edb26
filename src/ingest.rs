//! Upload validation and file persistence
//!
//! Uploads are gated by an extension allow-list, renamed to a filesystem-safe
//! key, and written under the configured upload directory. Two deliberate
//! non-guarantees: a repeated upload of the same sanitized name overwrites
//! the previous file, and files are never cleaned up when a later analysis
//! fails.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File types the analyzer knows how to parse.
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// True when the declared name carries an allowed extension
/// (case-insensitive, substring after the last `.`).
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

/// Reduce a client-supplied filename to a safe storage key.
///
/// Path components are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// `_`, and leading dots/dashes are stripped so the key can never be a
/// dotfile or traversal fragment. An unusable name falls back to `"upload"`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches(['.', '-']);
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Write the raw upload bytes under `dir`, returning the saved path.
///
/// Same-name saves overwrite silently; there is no uniqueness check.
pub fn save_upload(dir: &Path, filename: &str, data: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(filename);
    fs::write(&path, data)?;
    Ok(path)
}

/// Create the upload directory if it does not exist yet.
pub fn ensure_upload_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_extensions_are_case_insensitive() {
        assert!(allowed_file("data.csv"));
        assert!(allowed_file("data.CSV"));
        assert!(allowed_file("report.xlsx"));
        assert!(allowed_file("legacy.XLS"));
    }

    #[test]
    fn disallowed_or_missing_extensions_rejected() {
        assert!(!allowed_file("notes.txt"));
        assert!(!allowed_file("archive.csv.gz"));
        assert!(!allowed_file("noextension"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn sanitize_keeps_safe_names() {
        assert_eq!(sanitize_filename("data.csv"), "data.csv");
        assert_eq!(sanitize_filename("report-2024_q1.xlsx"), "report-2024_q1.xlsx");
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd.csv"), "passwd.csv");
        assert_eq!(sanitize_filename("/tmp/data.csv"), "data.csv");
        assert_eq!(sanitize_filename("C:\\Users\\x\\data.csv"), "data.csv");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my data (1).csv"), "my_data__1_.csv");
        assert_eq!(sanitize_filename("résumé.csv"), "r_sum_.csv");
    }

    #[test]
    fn sanitize_never_produces_a_dotfile() {
        assert_eq!(sanitize_filename(".hidden.csv"), "hidden.csv");
        assert_eq!(sanitize_filename(".."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        save_upload(dir.path(), "data.csv", b"first").unwrap();
        let path = save_upload(dir.path(), "data.csv", b"second").unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn ensure_upload_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");

        ensure_upload_dir(&uploads).unwrap();
        ensure_upload_dir(&uploads).unwrap();
        assert!(uploads.is_dir());
    }
}
