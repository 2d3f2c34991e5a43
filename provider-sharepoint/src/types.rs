//! Microsoft Graph driveItem wire types

use serde::{Deserialize, Serialize};

/// A file or folder as returned by `/drives/{id}/root:/{path}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub last_modified_date_time: Option<String>,
    #[serde(default, rename = "eTag")]
    pub e_tag: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub parent_reference: Option<ParentReference>,
    /// Present only on folders
    #[serde(default)]
    pub folder: Option<FolderFacet>,
    /// Present only on files
    #[serde(default)]
    pub file: Option<FileFacet>,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.file.as_ref().and_then(|file| file.mime_type.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    #[serde(default)]
    pub drive_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    /// Absolute parent path, e.g. `/drives/b!x/root:/Shared/Reports`
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    #[serde(default)]
    pub child_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// One page of a children listing.
#[derive(Debug, Deserialize)]
pub struct ChildrenPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(default, rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Serializes as `{}`.
#[derive(Debug, Serialize)]
pub struct EmptyFacet {}

/// Body of `POST …/children` creating a folder.
#[derive(Debug, Serialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub folder: EmptyFacet,
    #[serde(rename = "@microsoft.graph.conflictBehavior")]
    pub conflict_behavior: &'static str,
}

impl CreateFolderRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: EmptyFacet {},
            conflict_behavior: "rename",
        }
    }
}

/// Body of `POST …:/copy`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequest {
    pub parent_reference: CopyParentReference,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CopyParentReference {
    pub path: String,
}
