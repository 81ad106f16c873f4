use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::filename::{allowed_extension, secure_filename};

/// Prefix of every stored image reference, relative to the static root.
pub const UPLOAD_PREFIX: &str = "uploads";

/// Pasted payloads come from browsers that may or may not pad.
const PASTE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Upper bound on `_<n>` suffixes tried when a stamped name is taken.
const MAX_COLLISION_SUFFIX: u32 = 1000;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("file type not allowed: {0}")]
    Disallowed(String),

    #[error("upload has no filename")]
    EmptyFilename,

    #[error("no free filename for {0}")]
    Exhausted(String),

    #[error("image I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores image attachments in a single flat upload directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub async fn new(dir: PathBuf) -> Result<Self, MediaError> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode a pasted image (optionally a `data:image/...;base64,` URI) and
    /// store it as `pasted_<stamp>.png`. Returns the `uploads/<file>` reference.
    pub async fn save_pasted(&self, data: &str) -> Result<String, MediaError> {
        let payload = match data.split_once("base64,") {
            Some((_, rest)) => rest,
            None => data,
        };
        let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = PASTE_ENGINE.decode(cleaned)?;

        let stamp = file_stamp();
        let filename = self.write_new(&format!("pasted_{stamp}"), "png", &bytes).await?;
        info!("Stored pasted image {} ({} bytes)", filename, bytes.len());
        Ok(reference(&filename))
    }

    /// Store a direct upload as `<stamp>_<sanitized stem>.<ext>`. Only
    /// allow-listed image extensions are accepted.
    pub async fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String, MediaError> {
        if original_name.is_empty() {
            return Err(MediaError::EmptyFilename);
        }
        let ext = allowed_extension(original_name)
            .ok_or_else(|| MediaError::Disallowed(original_name.to_string()))?;

        let stem = original_name
            .strip_suffix(ext)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or_default();
        let mut stem = secure_filename(stem);
        if stem.is_empty() {
            stem = "image".to_string();
        }

        let stamp = file_stamp();
        let filename = self.write_new(&format!("{stamp}_{stem}"), ext, bytes).await?;
        info!("Stored uploaded image {} ({} bytes)", filename, bytes.len());
        Ok(reference(&filename))
    }

    /// Remove the file behind an image reference. Only the final path segment
    /// is used, so a reference can never point outside the upload directory.
    /// A file that is already gone is not an error.
    pub async fn remove(&self, image_path: &str) -> Result<(), MediaError> {
        let name = image_path.rsplit(['/', '\\']).next();
        let Some(name) = name.filter(|n| !matches!(*n, "" | "." | "..")) else {
            warn!("Ignoring malformed image reference {:?}", image_path);
            return Ok(());
        };

        let path = self.dir.join(name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted image {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Image {} already gone", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create `<base>.<ext>` without clobbering an existing file, appending
    /// `_<n>` to `base` until a free name is found.
    async fn write_new(&self, base: &str, ext: &str, bytes: &[u8]) -> Result<String, MediaError> {
        for n in 0..MAX_COLLISION_SUFFIX {
            let filename = if n == 0 {
                format!("{base}.{ext}")
            } else {
                format!("{base}_{n}.{ext}")
            };

            let open = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&filename))
                .await;
            let mut file = match open {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            file.write_all(bytes).await?;
            file.flush().await?;
            return Ok(filename);
        }

        Err(MediaError::Exhausted(format!("{base}.{ext}")))
    }
}

fn file_stamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

fn reference(filename: &str) -> String {
    format!("{UPLOAD_PREFIX}/{filename}")
}
