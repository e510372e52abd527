use std::fs;
use std::io;

use actix_multipart::form::MultipartFormConfig;
use actix_multipart::form::tempfile::TempFileConfig;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};

use crate::domain::UploadRoot;
use crate::models::config::ServerConfig;
use crate::services::photos::PhotoService;

pub mod domain;
pub mod dto;
pub mod forms;
pub mod models;
pub mod routes;
pub mod services;

/// Shared application state, built once and cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    config: web::Data<ServerConfig>,
    photos: web::Data<PhotoService>,
}

impl AppState {
    /// Resolve the upload root and prepare the staging directory, if any.
    ///
    /// The upload root itself is created lazily by the first upload.
    pub fn new(server_config: ServerConfig) -> io::Result<Self> {
        let upload_root = UploadRoot::resolve(&server_config.upload_path)?;
        if let Some(staging) = &server_config.staging_path {
            fs::create_dir_all(staging)?;
        }

        Ok(Self {
            config: web::Data::new(server_config),
            photos: web::Data::new(PhotoService::new(upload_root)),
        })
    }

    pub fn upload_root(&self) -> &UploadRoot {
        self.photos.upload_root()
    }
}

/// Register handlers and shared data on an application.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let multipart = MultipartFormConfig::default().total_limit(state.config.max_upload_size);

    let temp_files = match &state.config.staging_path {
        Some(staging) => TempFileConfig::default().directory(staging),
        None => TempFileConfig::default(),
    };

    cfg.app_data(state.config.clone())
        .app_data(state.photos.clone())
        .app_data(multipart)
        .app_data(temp_files)
        .service(routes::main::index)
        .service(routes::main::save_image);
}

pub async fn run(server_config: ServerConfig) -> io::Result<()> {
    let address = server_config.address.clone();
    let port = server_config.port;
    let state = AppState::new(server_config)?;

    log::info!(
        "Storing uploads in {}",
        state.upload_root().as_path().display()
    );
    log::info!("Server listening at http://{address}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| configure(cfg, &state))
    })
    .bind((address.as_str(), port))?
    .run()
    .await
}
