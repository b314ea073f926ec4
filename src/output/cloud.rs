//! Object storage locations (local, S3, R2, GCS, Azure)

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt;
use std::sync::Arc;

/// A bucket/container prefix or local directory parsed from a URL
#[derive(Debug, Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
    /// Bucket, container or local root
    root: String,
}

impl StorageLocation {
    /// Parse a location URL, creating local directories as needed
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        Self::parse_with(url, true)
    }

    /// Open an existing location; `None` when a local directory is missing
    pub fn open(url: &str) -> Result<Option<Self>> {
        if is_local(url) && !std::path::Path::new(strip_file_scheme(url)).exists() {
            return Ok(None);
        }
        Self::parse_with(url, false).map(Some)
    }

    fn parse_with(url: &str, create_local: bool) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::parse_s3(url, false)
        } else if url.starts_with("r2://") {
            Self::parse_s3(url, true)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else {
            Self::parse_local(url, create_local)
        }
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = split_bucket(url, scheme)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // AWS_ENDPOINT is read by from_env(); R2 also honours R2_ENDPOINT_URL
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: scheme.to_string(),
            root: bucket.to_string(),
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let (bucket, prefix) = split_bucket(url, "gs")?;

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
            root: bucket.to_string(),
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let (container, prefix) = split_bucket(url, "az")?;

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
            root: container.to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(path: &str, create: bool) -> Result<Self> {
        let path = strip_file_scheme(path);

        if create {
            std::fs::create_dir_all(path)
                .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;
        }

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
            root: path.trim_end_matches('/').to_string(),
        })
    }

    /// Check if this is a cloud location (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Whether both locations share one object store
    pub fn same_store(&self, other: &StorageLocation) -> bool {
        self.scheme == other.scheme && self.root == other.root
    }

    /// Full object path for a key relative to this location
    fn object_path(&self, key: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{key}", self.prefix.trim_end_matches('/')))
        }
    }

    /// Key relative to this location for a full object path
    fn relative_key(&self, path: &ObjectPath) -> String {
        let full = path.as_ref();
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            return full.to_string();
        }
        full.strip_prefix(prefix)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or_else(|| full.to_string())
    }

    /// Display URL for a key, used in logs and run summaries
    pub fn display_path(&self, key: &str) -> String {
        let path = self.object_path(key);
        if self.is_cloud() {
            format!("{}://{}/{path}", self.scheme, self.root)
        } else {
            format!("{}/{path}", self.root)
        }
    }

    /// Write bytes under a relative key
    pub async fn write(&self, key: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(key);
        self.store.put(&path, data.into()).await?;
        Ok(self.display_path(key))
    }

    /// Read the object at a relative key
    pub async fn read(&self, key: &str) -> Result<Bytes> {
        let path = self.object_path(key);
        let bytes = self.store.get(&path).await?.bytes().await?;
        Ok(bytes)
    }

    /// List relative keys under an optional sub-prefix, sorted
    pub async fn list(&self, sub_prefix: Option<&str>) -> Result<Vec<String>> {
        let base = match sub_prefix {
            Some(p) if !p.is_empty() => Some(self.object_path(p.trim_end_matches('/'))),
            _ if !self.prefix.is_empty() => Some(ObjectPath::from(self.prefix.as_str())),
            _ => None,
        };

        let objects: Vec<_> = self.store.list(base.as_ref()).try_collect().await?;
        let mut keys: Vec<String> = objects
            .iter()
            .map(|meta| self.relative_key(&meta.location))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Delete the object at a relative key; missing objects are ignored
    pub async fn delete(&self, key: &str) -> Result<()> {
        match self.store.delete(&self.object_path(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Move an object to `to_key` in `dest`
    ///
    /// Uses a store-side rename when both locations share a store,
    /// otherwise copies the bytes across and deletes the source.
    pub async fn transfer(&self, from_key: &str, dest: &StorageLocation, to_key: &str) -> Result<String> {
        if self.same_store(dest) {
            self.store
                .rename(&self.object_path(from_key), &dest.object_path(to_key))
                .await?;
        } else {
            let data = self.read(from_key).await?;
            dest.write(to_key, data).await?;
            self.delete(from_key).await?;
        }
        Ok(dest.display_path(to_key))
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.display_path("");
        write!(f, "{}", root.trim_end_matches('/'))
    }
}

fn is_local(url: &str) -> bool {
    !["s3://", "r2://", "gs://", "az://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

fn strip_file_scheme(path: &str) -> &str {
    path.strip_prefix("file://").unwrap_or(path)
}

fn split_bucket<'a>(url: &'a str, scheme: &str) -> Result<(&'a str, String)> {
    let without_scheme = url
        .strip_prefix(&format!("{scheme}://"))
        .ok_or_else(|| Error::config(format!("Invalid {scheme} URL: {url}")))?;

    let (bucket, prefix) = match without_scheme.find('/') {
        Some(idx) => (
            &without_scheme[..idx],
            without_scheme[idx + 1..].trim_end_matches('/').to_string(),
        ),
        None => (without_scheme, String::new()),
    };

    if bucket.is_empty() {
        return Err(Error::config(format!("Missing bucket in {scheme} URL: {url}")));
    }
    Ok((bucket, prefix))
}
