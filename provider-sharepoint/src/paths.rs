//! Virtual path to Graph endpoint resolution.

use crate::prefixer::PathPrefixer;

/// Which drive requests address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveScope {
    /// A specific drive, e.g. a SharePoint document library
    Drive(String),
    /// The signed-in user's OneDrive
    Me,
}

impl DriveScope {
    /// `Drive` for a non-blank id, `Me` otherwise.
    pub fn from_drive_id(drive_id: Option<&str>) -> Self {
        match drive_id.map(str::trim) {
            Some(id) if !id.is_empty() => DriveScope::Drive(id.to_string()),
            _ => DriveScope::Me,
        }
    }

    fn item_root(&self) -> String {
        match self {
            DriveScope::Drive(id) => format!("/drives/{}/root", id),
            DriveScope::Me => "/me/drive/root".to_string(),
        }
    }

    /// Root as written in `parentReference.path`.
    fn reference_root(&self) -> String {
        match self {
            DriveScope::Drive(id) => format!("/drives/{}/root", id),
            DriveScope::Me => "/drive/root".to_string(),
        }
    }
}

/// Percent-encode every segment of `path`, keeping `/` separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Split `a/b/c` into (`a/b`, `c`); a single segment has an empty parent.
fn split_parent(path: &str) -> (&str, &str) {
    let trimmed = path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", trimmed),
    }
}

/// Builds Graph endpoint paths (relative to the API base URL) for virtual
/// paths below the configured prefix.
#[derive(Debug, Clone)]
pub struct GraphPaths {
    scope: DriveScope,
    prefixer: PathPrefixer,
}

impl GraphPaths {
    pub fn new(scope: DriveScope, prefixer: PathPrefixer) -> Self {
        Self { scope, prefixer }
    }

    pub fn scope(&self) -> &DriveScope {
        &self.scope
    }

    pub fn prefixer(&self) -> &PathPrefixer {
        &self.prefixer
    }

    /// `/drives/{id}/root:/{path}` or `/me/drive/root:/{path}`
    pub fn item_path(&self, path: &str) -> String {
        let prefixed = self.prefixer.prefix_path(path);
        format!("{}:/{}", self.scope.item_root(), encode_path(&prefixed))
    }

    /// Children endpoint; the drive root lists through `/root/children`.
    pub fn children_path(&self, path: &str) -> String {
        self.children_of(&self.prefixer.prefix_path(path))
    }

    pub fn content_path(&self, path: &str) -> String {
        format!("{}:/content", self.item_path(path))
    }

    pub fn copy_path(&self, path: &str) -> String {
        format!("{}:/copy", self.item_path(path))
    }

    /// Endpoint and folder name for creating the directory at `path`.
    pub fn folder_target(&self, path: &str) -> (String, String) {
        let prefixed = self.prefixer.prefix_path(path);
        let (parent, name) = split_parent(&prefixed);
        (self.children_of(parent), name.to_string())
    }

    /// `parentReference.path` and leaf name for a copy to `destination`.
    pub fn copy_target(&self, destination: &str) -> (String, String) {
        let prefixed = self.prefixer.prefix_path(destination);
        let (parent, name) = split_parent(&prefixed);
        let root = self.scope.reference_root();
        let reference = if parent.is_empty() {
            root
        } else {
            format!("{}/{}", root, parent)
        };
        (reference, name.to_string())
    }

    fn children_of(&self, prefixed: &str) -> String {
        let root = self.scope.item_root();
        if prefixed.is_empty() || prefixed == "/" {
            format!("{}/children", root)
        } else {
            let folder = prefixed.trim_end_matches('/');
            format!("{}:/{}:/children", root, encode_path(folder))
        }
    }
}
