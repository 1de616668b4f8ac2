pub mod reconcile;

use crate::domain::RandomSource;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

pub use reconcile::{OrphanReconciler, ReconcileReport};

/// Extensions accepted for upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["mp4", "webm", "ogg", "mov", "mkv"];

/// Base name used when nothing survives sanitizing.
const FALLBACK_BASE: &str = "video";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("File name has no extension")]
    MissingExtension,

    #[error("Unsupported file type: .{0}")]
    UnsupportedExtension(String),
}

/// Returns the extension of `filename` if it is one of [`ALLOWED_EXTENSIONS`].
pub fn allowed_extension(filename: &str) -> Result<&str, NamingError> {
    let (_, ext) = filename
        .rsplit_once('.')
        .ok_or(NamingError::MissingExtension)?;

    if ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    {
        Ok(ext)
    } else {
        Err(NamingError::UnsupportedExtension(ext.to_string()))
    }
}

/// Reduces a user supplied name to a safe ASCII file name.
///
/// The name is NFKD-normalized first so accented letters keep their base
/// letter. Remaining non-ASCII characters are dropped, path separators become
/// spaces, whitespace runs become `_`, anything outside `[A-Za-z0-9_.-]` is
/// removed and leading or trailing `.`/`_` are stripped.
#[must_use]
pub fn secure_filename(name: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    let strip = STRIP.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9_.-]").expect("Invalid regex pattern defined in code")
    });

    let ascii: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    strip
        .replace_all(&joined, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Builds the on-disk name for an upload: `<sanitized base>_<16 hex>.<ext>`.
pub fn stored_filename(original: &str, rng: &dyn RandomSource) -> Result<String, NamingError> {
    let ext = allowed_extension(original)?;
    let stem = &original[..original.len() - ext.len() - 1];

    let mut base = secure_filename(stem);
    if base.is_empty() {
        base = FALLBACK_BASE.to_string();
    }

    let mut suffix = [0u8; 8];
    rng.fill_bytes(&mut suffix);

    Ok(format!("{base}_{}.{ext}", hex_lower(&suffix)))
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeededRandom;

    fn matches_pattern(name: &str, base: &str, ext: &str) -> bool {
        let re = Regex::new(&format!(
            "^{}_[0-9a-f]{{16}}\\.{}$",
            regex::escape(base),
            regex::escape(ext)
        ))
        .unwrap();
        re.is_match(name)
    }

    #[test]
    fn test_allowed_extension_is_case_insensitive() {
        assert_eq!(allowed_extension("clip.mp4"), Ok("mp4"));
        assert_eq!(allowed_extension("CLIP.MKV"), Ok("MKV"));
        assert_eq!(allowed_extension("a.b.WebM"), Ok("WebM"));
        assert_eq!(
            allowed_extension("notes.txt"),
            Err(NamingError::UnsupportedExtension("txt".to_string()))
        );
        assert_eq!(allowed_extension("noext"), Err(NamingError::MissingExtension));
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My cool movie"), "My_cool_movie");
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("  __hidden.. "), "hidden");
        assert_eq!(
            secure_filename("i contain cool \u{fc}ml\u{e4}uts"),
            "i_contain_cool_umlauts"
        );
        assert_eq!(secure_filename("\u{dc}ber Caf\u{e9}"), "Uber_Cafe");
        assert_eq!(secure_filename("what?<>|*"), "what");
    }

    #[test]
    fn test_stored_filename_pattern() {
        let rng = SeededRandom::new(1);
        let name = stored_filename("clip.mp4", &rng).unwrap();
        assert!(matches_pattern(&name, "clip", "mp4"), "{name}");

        let name = stored_filename("Holiday Trip.MOV", &rng).unwrap();
        assert!(matches_pattern(&name, "Holiday_Trip", "MOV"), "{name}");
    }

    #[test]
    fn test_stored_filename_keeps_base_letters_of_accents() {
        let rng = SeededRandom::new(4);
        let name = stored_filename("\u{dc}ber.mp4", &rng).unwrap();
        assert!(matches_pattern(&name, "Uber", "mp4"), "{name}");
    }

    #[test]
    fn test_stored_filename_fallback_base() {
        let rng = SeededRandom::new(2);
        let name = stored_filename("\u{65e5}\u{672c}.webm", &rng).unwrap();
        assert!(matches_pattern(&name, "video", "webm"), "{name}");
    }

    #[test]
    fn test_stored_filename_suffix_differs_per_call() {
        let rng = SeededRandom::new(3);
        let a = stored_filename("clip.mp4", &rng).unwrap();
        let b = stored_filename("clip.mp4", &rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_stored_filename_rejects_unsupported() {
        let rng = SeededRandom::new(4);
        assert!(stored_filename("script.sh", &rng).is_err());
    }
}
