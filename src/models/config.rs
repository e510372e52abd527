//! Configuration model loaded from external sources.

use serde::Deserialize;
use validator::Validate;

#[derive(Clone, Debug, Deserialize, Validate)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub address: String,
    pub port: u16,
    /// Directory uploaded photos are written to. Relative paths are resolved
    /// against the working directory at startup.
    #[validate(length(min = 1))]
    pub upload_path: String,
    /// HTML page served at `/`.
    #[validate(length(min = 1))]
    pub index_path: String,
    /// Upper bound for a whole multipart body, in bytes.
    #[validate(range(min = 1))]
    pub max_upload_size: usize,
    /// Where the multipart parser stages parts; system temp dir when unset.
    #[serde(default)]
    pub staging_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ServerConfig {
        ServerConfig {
            address: "0.0.0.0".into(),
            port: 3000,
            upload_path: "./upload/photos".into(),
            index_path: "static/index.html".into(),
            max_upload_size: 1024,
            staging_path: None,
        }
    }

    #[test]
    fn accepts_defaults() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_empty_upload_path() {
        let config = ServerConfig {
            upload_path: String::new(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_upload_limit() {
        let config = ServerConfig {
            max_upload_size: 0,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_yaml_with_env_style_override() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../../config/default.yaml"),
                config::FileFormat::Yaml,
            ))
            .set_override("port", 8080)
            .unwrap()
            .build()
            .unwrap();

        let config: ServerConfig = settings.try_deserialize().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_path, "./upload/photos");
        assert!(config.staging_path.is_none());
        assert!(config.validate().is_ok());
    }
}
