use actix_files::NamedFile;
use actix_multipart::form::MultipartForm;
use actix_web::{HttpRequest, HttpResponse, Responder, error::ErrorNotFound, get, post, web};

use crate::dto::SavedImageDto;
use crate::forms::main::{PHOTO_FIELD, SaveImageForm};
use crate::models::config::ServerConfig;
use crate::routes::{no_file_uploaded, reject_multipart};
use crate::services::ServiceError;
use crate::services::photos::PhotoService;

#[get("/")]
pub async fn index(server_config: web::Data<ServerConfig>) -> actix_web::Result<NamedFile> {
    NamedFile::open_async(&server_config.index_path)
        .await
        .map_err(|e| {
            log::warn!("Cannot open index page {}: {e}", server_config.index_path);
            ErrorNotFound("Not found")
        })
}

#[post("/save-image")]
pub async fn save_image(
    req: HttpRequest,
    photos: web::Data<PhotoService>,
    form: Result<MultipartForm<SaveImageForm>, actix_web::Error>,
) -> impl Responder {
    let MultipartForm(form) = match form {
        Ok(form) => form,
        Err(err) => return reject_multipart(&err, &req),
    };
    let Some(photo) = form.photo else {
        return no_file_uploaded();
    };

    let saved = web::block(move || photos.save_photo(PHOTO_FIELD, photo)).await;

    match saved {
        Ok(Ok(saved)) => {
            log::info!(
                "Saved image {} ({} bytes)",
                saved.path().display(),
                saved.size()
            );
            HttpResponse::Ok().json(SavedImageDto::from(saved))
        }
        Ok(Err(ServiceError::MissingFile)) => no_file_uploaded(),
        Ok(Err(e)) => {
            log::error!("Failed to save image: {e:?}");
            HttpResponse::InternalServerError().finish()
        }
        Err(e) => {
            log::error!("Image upload task failed: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
