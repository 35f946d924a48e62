use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crossbeam_channel::{unbounded, Receiver, Sender};
use thiserror::Error;

use crate::model::{ImageUpload, NoteId};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is not a file")]
    NotAFile(PathBuf),
}

/// Image MIME type from the leading bytes, falling back to the file extension.
pub fn sniff_mime(bytes: &[u8], path: &Path) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"\x00\x00\x01\x00", "image/x-icon"),
    ];
    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| bytes.starts_with(magic)) {
        return Some(*mime);
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if is_bmp(bytes) {
        return Some("image/bmp");
    }
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "ico" => Some("image/x-icon"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// "BM" alone is common at the start of text, so the reserved bytes and the
/// DIB header size have to check out as well.
fn is_bmp(bytes: &[u8]) -> bool {
    const DIB_HEADER_SIZES: [u32; 5] = [12, 40, 56, 108, 124];
    if bytes.len() < 18 || !bytes.starts_with(b"BM") || bytes[6..10] != [0; 4] {
        return false;
    }
    let dib_size = u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
    DIB_HEADER_SIZES.contains(&dib_size)
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads an image file into an upload. Files that are not images yield
/// `Ok(None)` and are meant to be ignored silently.
pub fn load_image(path: &Path) -> Result<Option<ImageUpload>, ImageError> {
    let metadata = fs::metadata(path).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(ImageError::NotAFile(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(mime) = sniff_mime(&bytes, path) else {
        tracing::debug!(path = %path.display(), "ignoring non-image file");
        return Ok(None);
    };
    let alt = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!(path = %path.display(), mime, size = bytes.len(), "image encoded");
    Ok(Some(ImageUpload {
        src: encode_data_url(mime, &bytes),
        alt,
    }))
}

#[derive(Debug)]
pub struct ImageLoadResult {
    pub note_id: NoteId,
    pub outcome: Result<Option<ImageUpload>, ImageError>,
}

/// Reads images on worker threads so large files never stall the UI.
pub struct ImageLoader {
    tx: Sender<ImageLoadResult>,
    rx: Receiver<ImageLoadResult>,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Starts reading `path` for `note_id`; the result arrives through [`ImageLoader::poll`].
    pub fn request(&self, note_id: NoteId, path: PathBuf) {
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("image-loader".into())
            .spawn(move || {
                let outcome = load_image(&path);
                if tx.send(ImageLoadResult { note_id, outcome }).is_err() {
                    tracing::debug!("image loader dropped before result arrived");
                }
            });
        if let Err(err) = spawned {
            tracing::error!(%err, "failed to spawn image loader thread");
        }
    }

    /// Finished loads, without blocking.
    pub fn poll(&self) -> Vec<ImageLoadResult> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    pub(crate) fn recv_timeout(&self, timeout: std::time::Duration) -> Option<ImageLoadResult> {
        self.rx.recv_timeout(timeout).ok()
    }
}
