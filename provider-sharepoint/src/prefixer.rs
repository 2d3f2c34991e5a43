//! Root prefix handling for virtual paths.

/// Maps virtual paths onto a root folder inside the drive.
///
/// ```
/// use provider_sharepoint::PathPrefixer;
///
/// let prefixer = PathPrefixer::new("Shared/Uploads/");
/// assert_eq!(prefixer.prefix_path("/a.txt"), "Shared/Uploads/a.txt");
/// assert_eq!(prefixer.strip_prefix("Shared/Uploads/a.txt"), "a.txt");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    prefix: String,
}

impl PathPrefixer {
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim_end_matches(['/', '\\']);
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}/", trimmed)
        };
        Self { prefix }
    }

    /// Normalised prefix, empty or ending in `/`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn prefix_path(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches(['/', '\\']))
    }

    /// Remove the prefix when `path` starts with it; other paths pass through.
    pub fn strip_prefix<'a>(&self, path: &'a str) -> &'a str {
        path.strip_prefix(self.prefix.as_str()).unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_normalisation() {
        assert_eq!(PathPrefixer::new("").prefix(), "");
        assert_eq!(PathPrefixer::new("/").prefix(), "");
        assert_eq!(PathPrefixer::new("docs").prefix(), "docs/");
        assert_eq!(PathPrefixer::new("docs//").prefix(), "docs/");
        assert_eq!(PathPrefixer::new("docs\\").prefix(), "docs/");
    }

    #[test]
    fn test_prefix_path() {
        let prefixer = PathPrefixer::new("docs");
        assert_eq!(prefixer.prefix_path("a/b.txt"), "docs/a/b.txt");
        assert_eq!(prefixer.prefix_path("//a.txt"), "docs/a.txt");
        assert_eq!(prefixer.prefix_path(""), "docs/");

        let bare = PathPrefixer::new("");
        assert_eq!(bare.prefix_path("/a.txt"), "a.txt");
        assert_eq!(bare.prefix_path(""), "");
    }

    #[test]
    fn test_strip_prefix_only_when_present() {
        let prefixer = PathPrefixer::new("docs");
        assert_eq!(prefixer.strip_prefix("docs/a.txt"), "a.txt");
        assert_eq!(prefixer.strip_prefix("other/a.txt"), "other/a.txt");
        assert_eq!(prefixer.strip_prefix("docsx/a.txt"), "docsx/a.txt");
    }
}
