use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use actix_multipart::form::tempfile::TempFile;
use chrono::Utc;
use tempfile::NamedTempFile;

use crate::domain::{Extension, FileName, SavedPhoto, UploadRoot};
use crate::services::{ServiceError, ServiceResult};

/// Upper bound on fresh names tried when the generated one is already taken.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Service storing uploaded photos under generated names in the upload root.
#[derive(Debug)]
pub struct PhotoService {
    upload_root: UploadRoot,
    stamps: StampSequence,
    clock: fn() -> i64,
}

impl PhotoService {
    pub fn new(upload_root: UploadRoot) -> Self {
        Self {
            upload_root,
            stamps: StampSequence::default(),
            clock: now_millis,
        }
    }

    pub fn upload_root(&self) -> &UploadRoot {
        &self.upload_root
    }

    fn ensure_upload_root(&self) -> ServiceResult<()> {
        fs::create_dir_all(self.upload_root.as_path()).map_err(ServiceError::StorageSetup)
    }

    /// Persist an uploaded part as `{field}-{millis}{extension}`.
    ///
    /// Parts without a client file name are rejected with
    /// [`ServiceError::MissingFile`] before anything touches the disk. An
    /// existing file is never overwritten: a clash draws the next stamp.
    pub fn save_photo(&self, field: &str, upload: TempFile) -> ServiceResult<SavedPhoto> {
        let extension = upload
            .file_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(Extension::from_original_name)
            .ok_or(ServiceError::MissingFile)?;
        self.ensure_upload_root()?;

        let size = upload.size;
        let mut staged = upload.file;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let stamp = self.stamps.next((self.clock)());
            let name = FileName::generated(field, stamp, &extension)
                .map_err(|_| ServiceError::InvalidFileName)?;
            let target = self.upload_root.resolve_file(&name);

            match place(staged, &target).map_err(ServiceError::SaveFile)? {
                Placement::Placed => return Ok(SavedPhoto::new(name, target, size)),
                Placement::Taken(file) => {
                    log::warn!("Storage name {name} is already taken, drawing a new one");
                    staged = file;
                }
            }
        }

        Err(ServiceError::NameExhausted(MAX_NAME_ATTEMPTS))
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Strictly increasing millisecond stamps shared by all workers.
#[derive(Debug, Default)]
struct StampSequence {
    last: AtomicI64,
}

impl StampSequence {
    fn next(&self, now: i64) -> i64 {
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

enum Placement {
    Placed,
    Taken(NamedTempFile),
}

/// Move a staged upload to `target` without replacing an existing file.
fn place(staged: NamedTempFile, target: &Path) -> io::Result<Placement> {
    match staged.persist_noclobber(target) {
        Ok(_) => Ok(Placement::Placed),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            Ok(Placement::Taken(err.file))
        }
        // Staging area lives on another filesystem.
        Err(err) if err.error.kind() == io::ErrorKind::CrossesDevices => {
            copy_noclobber(err.file, target)
        }
        Err(err) => Err(err.error),
    }
}

fn copy_noclobber(mut staged: NamedTempFile, target: &Path) -> io::Result<Placement> {
    let mut dest = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Ok(Placement::Taken(staged));
        }
        Err(err) => return Err(err),
    };

    let copied = staged
        .seek(SeekFrom::Start(0))
        .and_then(|_| io::copy(&mut staged, &mut dest))
        .and_then(|_| dest.sync_all());

    if let Err(err) = copied {
        drop(dest);
        if let Err(e) = fs::remove_file(target) {
            log::error!("Failed to remove partial upload {target:?}: {e}");
        }
        return Err(err);
    }

    Ok(Placement::Placed)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;
    use tempfile::{NamedTempFile, tempdir};

    fn build_service(root: PathBuf) -> PhotoService {
        PhotoService::new(UploadRoot::from(root))
    }

    fn fixed_clock() -> i64 {
        1_000
    }

    fn upload(content: &[u8], file_name: Option<&str>) -> TempFile {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(content).unwrap();
        temp.flush().unwrap();
        TempFile {
            file: temp,
            content_type: None,
            file_name: file_name.map(str::to_string),
            size: content.len(),
        }
    }

    fn is_stamped(name: &str, extension: &str) -> bool {
        name.strip_prefix("photo-")
            .and_then(|rest| rest.strip_suffix(extension))
            .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    }

    #[test]
    fn save_photo_writes_identical_content() {
        let dir = tempdir().unwrap();
        let service = build_service(dir.path().to_path_buf());
        let content = b"\x89PNG\r\n\x1a\nfake image bytes";

        let saved = service
            .save_photo("photo", upload(content, Some("selfie.png")))
            .unwrap();

        assert!(is_stamped(saved.name().as_str(), ".png"));
        assert_eq!(saved.path(), dir.path().join(saved.name().as_str()));
        assert_eq!(saved.size(), content.len());
        assert_eq!(fs::read(saved.path()).unwrap(), content);
    }

    #[test]
    fn save_photo_creates_missing_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("photos");
        let service = build_service(root.clone());

        let saved = service
            .save_photo("photo", upload(b"data", Some("a.jpg")))
            .unwrap();

        assert!(root.is_dir());
        assert!(saved.path().starts_with(&root));
    }

    #[test]
    fn save_photo_without_extension() {
        let dir = tempdir().unwrap();
        let service = build_service(dir.path().to_path_buf());

        let saved = service
            .save_photo("photo", upload(b"data", Some("photo")))
            .unwrap();

        assert!(is_stamped(saved.name().as_str(), ""));
        assert!(!saved.name().as_str().ends_with('.'));
    }

    #[test]
    fn save_photo_requires_file_name() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("photos");
        let service = build_service(root.clone());

        let err = service
            .save_photo("photo", upload(b"text field", None))
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingFile));

        let err = service
            .save_photo("photo", upload(b"", Some("")))
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingFile));

        assert!(!root.exists());
    }

    #[test]
    fn sequential_uploads_get_distinct_names() {
        let dir = tempdir().unwrap();
        let mut service = build_service(dir.path().to_path_buf());
        service.clock = fixed_clock;

        let first = service
            .save_photo("photo", upload(b"same", Some("same.gif")))
            .unwrap();
        let second = service
            .save_photo("photo", upload(b"same", Some("same.gif")))
            .unwrap();

        assert_eq!(first.name().as_str(), "photo-1000.gif");
        assert_eq!(second.name().as_str(), "photo-1001.gif");
        assert!(first.path().exists());
        assert!(second.path().exists());
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("photo-1000.png"), b"older").unwrap();
        let mut service = build_service(dir.path().to_path_buf());
        service.clock = fixed_clock;

        let saved = service
            .save_photo("photo", upload(b"newer", Some("x.png")))
            .unwrap();

        assert_eq!(saved.name().as_str(), "photo-1001.png");
        assert_eq!(fs::read(dir.path().join("photo-1000.png")).unwrap(), b"older");
        assert_eq!(fs::read(saved.path()).unwrap(), b"newer");
    }

    #[test]
    fn unusable_root_reports_storage_setup() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let service = build_service(blocker.join("photos"));

        let err = service
            .save_photo("photo", upload(b"data", Some("a.png")))
            .unwrap_err();
        assert!(matches!(err, ServiceError::StorageSetup(_)));
    }

    #[test]
    fn copy_noclobber_reports_taken_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("photo-5.png");
        fs::write(&target, b"keep").unwrap();

        let placement = copy_noclobber(NamedTempFile::new().unwrap(), &target).unwrap();
        assert!(matches!(placement, Placement::Taken(_)));
        assert_eq!(fs::read(&target).unwrap(), b"keep");
    }

    #[test]
    fn copy_noclobber_copies_from_start() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("photo-6.png");
        let mut staged = NamedTempFile::new().unwrap();
        staged.write_all(b"copied bytes").unwrap();

        let placement = copy_noclobber(staged, &target).unwrap();
        assert!(matches!(placement, Placement::Placed));
        assert_eq!(fs::read(&target).unwrap(), b"copied bytes");
    }

    #[test]
    fn stamps_strictly_increase() {
        let stamps = StampSequence::default();

        assert_eq!(stamps.next(500), 500);
        assert_eq!(stamps.next(500), 501);
        assert_eq!(stamps.next(400), 502);
        assert_eq!(stamps.next(900), 900);
    }
}
