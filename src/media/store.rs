use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Blob storage for uploaded profile images.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save(&self, filename: &str, body: Bytes) -> anyhow::Result<()>;
    async fn read(&self, filename: &str) -> anyhow::Result<Option<Bytes>>;
}

/// Stores images as plain files under a single root directory.
#[derive(Clone)]
pub struct DiskMedia {
    root: PathBuf,
}

impl DiskMedia {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create uploads dir {}", self.root.display()))
    }
}

#[async_trait]
impl MediaStore for DiskMedia {
    async fn save(&self, filename: &str, body: Bytes) -> anyhow::Result<()> {
        anyhow::ensure!(is_safe_filename(filename), "unsafe filename {filename}");
        let path = self.root.join(filename);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write image {}", path.display()))
    }

    async fn read(&self, filename: &str) -> anyhow::Result<Option<Bytes>> {
        if !is_safe_filename(filename) {
            return Ok(None);
        }
        match tokio::fs::read(self.root.join(filename)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("read image"),
        }
    }
}

/// Only direct filenames are resolved under the uploads root; anything
/// that could climb out of it is refused.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

/// File extension for an accepted upload content type.
pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// File extension recovered from an uploaded filename, for clients that
/// send images as application/octet-stream.
pub fn ext_from_filename(name: &str) -> Option<&'static str> {
    match name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => Some("jpg"),
        Some("png") => Some("png"),
        _ => None,
    }
}

/// Content type served for a stored filename.
pub fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_filename_rejects_traversal() {
        assert!(is_safe_filename("7-abc.jpg"));
        assert!(!is_safe_filename(""));
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("a/b.jpg"));
        assert!(!is_safe_filename("a\\b.jpg"));
        assert!(!is_safe_filename("..jpg.."));
    }

    #[test]
    fn ext_from_mime_accepts_images_only() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("application/pdf"), None);
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn ext_from_filename_handles_case_and_rejects_others() {
        assert_eq!(ext_from_filename("photo.JPG"), Some("jpg"));
        assert_eq!(ext_from_filename("photo.jpeg"), Some("jpg"));
        assert_eq!(ext_from_filename("icon.png"), Some("png"));
        assert_eq!(ext_from_filename("doc.pdf"), None);
        assert_eq!(ext_from_filename("noext"), None);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("x.png"), "image/png");
        assert_eq!(content_type_for("x.jpg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "image/jpeg");
    }

    #[tokio::test]
    async fn disk_roundtrip_and_missing_file() {
        let root = std::env::temp_dir().join(format!("userbase-media-{}", uuid::Uuid::new_v4()));
        let store = DiskMedia::new(&root);
        store.ensure_root().await.unwrap();

        store
            .save("1-test.jpg", Bytes::from_static(b"jpegdata"))
            .await
            .unwrap();
        let got = store.read("1-test.jpg").await.unwrap();
        assert_eq!(got.as_deref(), Some(&b"jpegdata"[..]));

        assert!(store.read("absent.jpg").await.unwrap().is_none());
        assert!(store.read("../1-test.jpg").await.unwrap().is_none());
        assert!(store.save("../evil.jpg", Bytes::new()).await.is_err());

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
