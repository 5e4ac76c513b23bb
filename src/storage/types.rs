use serde::{Deserialize, Serialize};

use crate::common::types::{DriveId, FileId};

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// A shared drive as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDrive {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

/// A file or folder entry in a drive listing. The provider reports `size`
/// as a decimal string, kept verbatim here and parsed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn into_remote(self) -> RemoteFile {
        RemoteFile {
            size: self.size_bytes(),
            id: FileId(self.id),
            name: self.name,
            mime_type: self.mime_type,
            drive_id: self.drive_id.map(DriveId),
        }
    }
}

/// Resolved metadata of a single file. Immutable once fetched.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub id: FileId,
    pub name: String,
    pub mime_type: String,
    pub size: Option<u64>,
    pub drive_id: Option<DriveId>,
}
