use serde::Serialize;

use crate::domain::SavedPhoto;

pub const SAVED_MESSAGE: &str = "Image saved successfully!";

/// JSON acknowledgment returned after an image is stored.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedImageDto {
    pub message: &'static str,
    pub file_path: String,
}

impl From<SavedPhoto> for SavedImageDto {
    fn from(photo: SavedPhoto) -> Self {
        Self {
            message: SAVED_MESSAGE,
            file_path: photo.into_path().to_string_lossy().into_owned(),
        }
    }
}

