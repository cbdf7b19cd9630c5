use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SCANNABLE_EXTENSION;

/// A previously stored file awaiting processing.
///
/// `path` is a storage key relative to the storage root. The upload itself is
/// owned by the upload pipeline; scanners only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Upload {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl Upload {
    /// Whether the stored file is an archive the scanners understand.
    pub fn is_scannable(&self) -> bool {
        self.path.ends_with(SCANNABLE_EXTENSION)
    }

    /// Key used when signing download links for this upload.
    pub fn download_key(&self) -> String {
        self.uuid.simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_with_path(path: &str) -> Upload {
        Upload {
            id: 1,
            uuid: Uuid::new_v4(),
            name: "addon.xpi".to_string(),
            path: path.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn xpi_uploads_are_scannable() {
        assert!(upload_with_path("uploads/temp/abc.xpi").is_scannable());
    }

    #[test]
    fn other_extensions_are_not_scannable() {
        assert!(!upload_with_path("uploads/temp/abc.zip").is_scannable());
        assert!(!upload_with_path("uploads/temp/abc.xpi.bak").is_scannable());
        assert!(!upload_with_path("uploads/temp/abc").is_scannable());
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        assert!(!upload_with_path("uploads/temp/abc.XPI").is_scannable());
    }

    #[test]
    fn download_key_is_hyphenless_uuid() {
        let upload = upload_with_path("a.xpi");
        let key = upload.download_key();
        assert_eq!(key.len(), 32);
        assert!(!key.contains('-'));
    }
}
