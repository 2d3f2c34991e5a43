//! Virtual path normalisation.

use bridge_traits::storage::{FilesystemError, FilesystemResult};

/// Normalise a caller-supplied path.
///
/// Backslashes become `/`, empty and `.` segments are dropped and `..`
/// resolves against the preceding segment. Leading and trailing slashes are
/// removed, so the root is the empty string.
///
/// # Errors
///
/// - [`FilesystemError::CorruptedPathDetected`] for control characters
/// - [`FilesystemError::PathTraversalDetected`] when `..` climbs above the root
///
/// ```
/// use core_service::normalize_path;
///
/// assert_eq!(normalize_path("/reports\\2024/./q1.pdf").unwrap(), "reports/2024/q1.pdf");
/// assert!(normalize_path("../secrets").is_err());
/// ```
pub fn normalize_path(path: &str) -> FilesystemResult<String> {
    if path.chars().any(char::is_control) {
        return Err(FilesystemError::CorruptedPathDetected {
            path: path.to_string(),
        });
    }

    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(FilesystemError::PathTraversalDetected {
                        path: path.to_string(),
                    });
                }
            }
            other => segments.push(other),
        }
    }

    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths() {
        assert_eq!(normalize_path("a/b.txt").unwrap(), "a/b.txt");
        assert_eq!(normalize_path("/a/b/").unwrap(), "a/b");
        assert_eq!(normalize_path("").unwrap(), "");
        assert_eq!(normalize_path("/").unwrap(), "");
    }

    #[test]
    fn test_backslashes_and_dots() {
        assert_eq!(normalize_path("a\\b\\c.txt").unwrap(), "a/b/c.txt");
        assert_eq!(normalize_path("a//./b").unwrap(), "a/b");
        assert_eq!(normalize_path("a/b/../c").unwrap(), "a/c");
        assert_eq!(normalize_path("a/..").unwrap(), "");
    }

    #[test]
    fn test_traversal_is_rejected() {
        assert_eq!(
            normalize_path("a/../../etc").unwrap_err(),
            FilesystemError::PathTraversalDetected {
                path: "a/../../etc".to_string()
            }
        );
        assert!(normalize_path("..").is_err());
    }

    #[test]
    fn test_control_characters_are_rejected() {
        assert!(matches!(
            normalize_path("a\u{0}b"),
            Err(FilesystemError::CorruptedPathDetected { .. })
        ));
        assert!(matches!(
            normalize_path("line\nbreak.txt"),
            Err(FilesystemError::CorruptedPathDetected { .. })
        ));
    }

    #[test]
    fn test_unicode_and_spaces_are_kept() {
        assert_eq!(
            normalize_path("Documents partagés/rapport 1.pdf").unwrap(),
            "Documents partagés/rapport 1.pdf"
        );
    }
}
