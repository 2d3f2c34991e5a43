//! Rebuilds virtual paths and attributes from Graph children listings.

use crate::prefixer::PathPrefixer;
use crate::types::DriveItem;
use bridge_traits::storage::{DirectoryAttributes, FileAttributes, StorageAttributes};
use chrono::DateTime;

const ROOT_MARKER: &str = "root:";

/// Path of a listed item relative to the configured prefix.
///
/// `parent_path` is Graph's absolute `parentReference.path`, e.g.
/// `/drives/b!x/root:/Shared/Reports`.
pub fn relative_item_path(parent_path: &str, name: &str, prefixer: &PathPrefixer) -> String {
    let joined = match parent_path.find(ROOT_MARKER) {
        Some(index) => {
            let remainder = &parent_path[index + ROOT_MARKER.len()..];
            let decoded = urlencoding::decode(remainder)
                .map(|value| value.into_owned())
                .unwrap_or_else(|_| remainder.to_string());
            let relative = decoded.trim_matches('/');
            if relative.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", relative, name)
            }
        }
        None => name.to_string(),
    };

    prefixer.strip_prefix(&joined).to_string()
}

/// RFC 3339 timestamp to Unix seconds.
pub fn parse_timestamp(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.timestamp())
}

pub fn to_storage_attributes(item: &DriveItem, prefixer: &PathPrefixer) -> StorageAttributes {
    let parent_path = item
        .parent_reference
        .as_ref()
        .and_then(|parent| parent.path.as_deref())
        .unwrap_or_default();
    let path = relative_item_path(parent_path, &item.name, prefixer);
    let last_modified = parse_timestamp(item.last_modified_date_time.as_deref());

    if item.is_folder() {
        return StorageAttributes::Directory(DirectoryAttributes {
            path,
            visibility: None,
            last_modified,
        });
    }

    let mut file = FileAttributes::new(path);
    file.file_size = item.size;
    file.last_modified = last_modified;
    file.mime_type = item.mime_type().map(str::to_string);

    let extras = [
        ("id", &item.id),
        ("eTag", &item.e_tag),
        ("webUrl", &item.web_url),
    ];
    for (key, value) in extras {
        if let Some(value) = value {
            file.extra_metadata.insert(key.to_string(), value.clone());
        }
    }

    StorageAttributes::File(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileFacet, FolderFacet, ParentReference};

    fn item(name: &str, parent: &str) -> DriveItem {
        DriveItem {
            name: name.to_string(),
            parent_reference: Some(ParentReference {
                path: Some(parent.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_relative_path_from_parent_reference() {
        let bare = PathPrefixer::new("");
        assert_eq!(
            relative_item_path("/drives/b!x/root:/a/b", "c.txt", &bare),
            "a/b/c.txt"
        );
        assert_eq!(relative_item_path("/drive/root:", "c.txt", &bare), "c.txt");
        assert_eq!(relative_item_path("/drive/root:/", "c.txt", &bare), "c.txt");
        assert_eq!(relative_item_path("/drive/items/01", "c.txt", &bare), "c.txt");
        assert_eq!(relative_item_path("", "c.txt", &bare), "c.txt");
    }

    #[test]
    fn test_relative_path_strips_prefix() {
        let prefixer = PathPrefixer::new("Shared");
        assert_eq!(
            relative_item_path("/drives/b!x/root:/Shared/Reports", "q1.xlsx", &prefixer),
            "Reports/q1.xlsx"
        );
        assert_eq!(
            relative_item_path("/drives/b!x/root:/Shared", "q1.xlsx", &prefixer),
            "q1.xlsx"
        );
    }

    #[test]
    fn test_relative_path_is_decoded() {
        let bare = PathPrefixer::new("");
        assert_eq!(
            relative_item_path("/drive/root:/My%20Docs", "a b.txt", &bare),
            "My Docs/a b.txt"
        );
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp(Some("2024-01-01T00:00:00Z")), Some(1_704_067_200));
        assert_eq!(
            parse_timestamp(Some("2024-01-01T01:00:00+01:00")),
            Some(1_704_067_200)
        );
        assert_eq!(parse_timestamp(Some("yesterday")), None);
        assert_eq!(parse_timestamp(None), None);
    }

    #[test]
    fn test_folder_becomes_directory() {
        let mut folder = item("Reports", "/drive/root:/Shared");
        folder.folder = Some(FolderFacet { child_count: Some(2) });
        folder.last_modified_date_time = Some("2024-01-01T00:00:00Z".to_string());

        let attributes = to_storage_attributes(&folder, &PathPrefixer::new(""));
        assert_eq!(
            attributes,
            StorageAttributes::Directory(DirectoryAttributes {
                path: "Shared/Reports".to_string(),
                visibility: None,
                last_modified: Some(1_704_067_200),
            })
        );
    }

    #[test]
    fn test_file_carries_metadata() {
        let mut file = item("q1.xlsx", "/drive/root:/Reports");
        file.id = Some("01ABC".to_string());
        file.size = Some(42);
        file.web_url = Some("https://contoso/q1.xlsx".to_string());
        file.file = Some(FileFacet {
            mime_type: Some("application/vnd.ms-excel".to_string()),
        });

        let StorageAttributes::File(attributes) =
            to_storage_attributes(&file, &PathPrefixer::new(""))
        else {
            panic!("expected a file");
        };

        assert_eq!(attributes.path, "Reports/q1.xlsx");
        assert_eq!(attributes.file_size, Some(42));
        assert_eq!(attributes.mime_type.as_deref(), Some("application/vnd.ms-excel"));
        assert_eq!(attributes.extra_metadata.get("id").map(String::as_str), Some("01ABC"));
        assert!(attributes.extra_metadata.contains_key("webUrl"));
        assert!(!attributes.extra_metadata.contains_key("eTag"));
    }
}
