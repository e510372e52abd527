use actix_multipart::MultipartError;
use actix_web::error::PayloadError;
use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, ResponseError};

pub mod main;

pub const NO_FILE_MESSAGE: &str = "No file uploaded.";

fn no_file_uploaded() -> HttpResponse {
    HttpResponse::BadRequest()
        .content_type(ContentType::plaintext())
        .body(NO_FILE_MESSAGE)
}

fn is_overflow(err: &MultipartError) -> bool {
    match err {
        MultipartError::Payload(PayloadError::Overflow) => true,
        MultipartError::Field { source, .. } => {
            source.as_error::<MultipartError>().is_some_and(is_overflow)
        }
        _ => false,
    }
}

/// Reply for a multipart body the form extractor could not bind.
///
/// A missing or non-multipart content type, a missing boundary or a malformed
/// body means no file was bound, so the client gets the same reply as a form
/// without a `photo` part. Overflowing `max_upload_size` is 413. Staging
/// failures keep their own status.
pub fn reject_multipart(err: &actix_web::Error, req: &HttpRequest) -> HttpResponse {
    let Some(multipart) = err.as_error::<MultipartError>() else {
        log::warn!("Rejected upload to {}: {err}", req.path());
        return err.error_response();
    };

    if is_overflow(multipart) {
        log::warn!("Upload to {} exceeds the size limit", req.path());
        return HttpResponse::PayloadTooLarge().finish();
    }

    if multipart.status_code().is_server_error() {
        log::error!("Multipart upload to {} failed: {multipart}", req.path());
        return err.error_response();
    }

    log::warn!("Malformed multipart upload to {}: {multipart}", req.path());
    no_file_uploaded()
}
