use actix_multipart::form::{MultipartForm, tempfile::TempFile};

/// Form field the uploaded image is bound to.
pub const PHOTO_FIELD: &str = "photo";

/// Body of `POST /save-image`. Fields other than `photo` are ignored.
#[derive(MultipartForm)]
pub struct SaveImageForm {
    pub photo: Option<TempFile>,
}
