//! Image persistence pipeline: turns a data URI or remote URL into a local
//! artifact, re-encoded to PNG. Only decodable raster images are accepted;
//! raw bytes of unknown type are rejected before anything touches disk.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageFormat;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{PictorError, Result};
use crate::utils::http::{MAX_ERROR_BODY_BYTES, response_text_truncated};
use crate::utils::unix_nanos;

const FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Local image directory plus the client used to fetch remote sources.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    http: reqwest::Client,
}

impl ImageStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self { dir, http })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists `source` (a data URI or http(s) URL) as a PNG file and
    /// returns its absolute path. Does not touch history.
    pub async fn persist(&self, source: &str) -> Result<PathBuf> {
        let raw = if source.starts_with("data:") {
            decode_data_uri(source)?
        } else {
            self.fetch(source).await?
        };

        // Decode first: nothing is written unless the bytes are a raster
        // image we can re-encode.
        let decoded = image::load_from_memory(&raw)?;
        let mut png = Vec::new();
        decoded.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let path = self.write_unique(&png).await?;
        Ok(fs::canonicalize(&path).await?)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response_text_truncated(response, MAX_ERROR_BODY_BYTES).await;
            return Err(PictorError::Http { status, body });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Creates a fresh file; never overwrites. A nanosecond-stamped name
    /// makes collisions unlikely, a sequence suffix resolves the rest.
    async fn write_unique(&self, data: &[u8]) -> Result<PathBuf> {
        let stamp = unix_nanos();
        for attempt in 0..10u32 {
            let filename = if attempt == 0 {
                format!("ai_image_{stamp}.png")
            } else {
                format!("ai_image_{stamp}_{attempt}.png")
            };
            let path = self.dir.join(filename);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(data).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not allocate a unique image filename",
        )
        .into())
    }

    /// Reads a local image file into a self-contained data URI.
    pub async fn read_as_data_uri(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let data = fs::read(path).await?;
        let mime = mime_for_extension(path);
        Ok(format!("data:{mime};base64,{}", BASE64.encode(data)))
    }

    /// Writes raw image bytes to an explicit destination, creating parent
    /// directories as needed.
    pub async fn save_bytes(&self, destination: impl AsRef<Path>, data: &[u8]) -> Result<()> {
        let destination = destination.as_ref();
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(destination, data).await?;
        Ok(())
    }
}

/// Extracts and decodes the payload of a `data:<mime>;base64,<payload>` URI.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let Some((_, payload)) = uri.split_once(',') else {
        return Err(PictorError::InvalidDataUri);
    };
    Ok(BASE64.decode(payload.trim())?)
}

fn mime_for_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 40, 40]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .expect("encode png");
        out
    }

    fn tiny_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 90, 180]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
            .expect("encode jpeg");
        out
    }

    #[tokio::test]
    async fn data_uri_without_comma_is_invalid() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = ImageStore::open(dir.path()).await?;
        let err = store
            .persist("data:image/png;base64")
            .await
            .expect_err("missing payload segment");
        assert_eq!(err.code(), "INVALID_DATA_URI");
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_bytes_write_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = ImageStore::open(dir.path()).await?;
        let uri = format!("data:image/png;base64,{}", BASE64.encode(b"not an image"));

        let err = store.persist(&uri).await.expect_err("not a raster image");
        assert_eq!(err.code(), "IMAGE_DECODE_ERROR");

        let mut entries = fs::read_dir(dir.path()).await?;
        assert!(entries.next_entry().await?.is_none(), "no file expected");
        Ok(())
    }

    #[tokio::test]
    async fn jpeg_source_is_reencoded_to_png() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = ImageStore::open(dir.path()).await?;
        let uri = format!("data:image/jpeg;base64,{}", BASE64.encode(tiny_jpeg()));

        let path = store.persist(&uri).await?;
        assert!(path.is_absolute());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

        let written = fs::read(&path).await?;
        assert_eq!(&written[..4], b"\x89PNG");
        Ok(())
    }

    #[tokio::test]
    async fn persisted_png_roundtrips_through_data_uri_reader() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = ImageStore::open(dir.path()).await?;
        let uri = format!("data:image/png;base64,{}", BASE64.encode(tiny_png()));

        let path = store.persist(&uri).await?;
        let reread = store.read_as_data_uri(&path).await?;
        assert!(reread.starts_with("data:image/png;base64,"));

        let decoded = decode_data_uri(&reread)?;
        image::load_from_memory(&decoded).expect("still decodable");
        Ok(())
    }
}
