use crate::error::LoadError;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// Boxed future so sources stay usable as `Arc<dyn TopologySource>`
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where boundary geometry bytes come from
pub trait TopologySource: Send + Sync {
    /// Raw document bytes for a geometry path as named in map metadata
    fn fetch(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>, LoadError>>;
}

/// Reads geometry files relative to a root directory
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TopologySource for FileSource {
    fn fetch(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>, LoadError>> {
        let full = self.root.join(path);
        Box::pin(async move {
            tokio::fs::read(&full).await.map_err(|e| LoadError::Io {
                path: full.display().to_string(),
                message: e.to_string(),
            })
        })
    }
}

/// Downloads geometry relative to a base URL
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl TopologySource for HttpSource {
    fn fetch(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>, LoadError>> {
        let url = self.url(path);
        Box::pin(async move {
            let http_err = |e: reqwest::Error| LoadError::Http {
                url: url.clone(),
                message: e.to_string(),
            };
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(http_err)?;
            let bytes = response.bytes().await.map_err(http_err)?;
            Ok(bytes.to_vec())
        })
    }
}
