use super::source::TopologySource;
use super::Topology;
use moka::future::Cache;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches and decodes boundary geometry, cached by path for the process
/// lifetime.
///
/// Concurrent loads of one path share a single in-flight fetch. A failed
/// fetch is handed to every waiter of that flight but is not cached, so the
/// next load of the path tries again.
#[derive(Clone)]
pub struct TopologyLoader {
    source: Arc<dyn TopologySource>,
    cache: Cache<String, Arc<Topology>>,
}

impl TopologyLoader {
    pub fn new(source: Arc<dyn TopologySource>) -> Self {
        Self {
            source,
            cache: Cache::builder().build(),
        }
    }

    /// Decoded topology for `path`, or `None` when it cannot be fetched or
    /// decoded. Failures are logged, never propagated.
    pub async fn load(&self, path: &str) -> Option<Arc<Topology>> {
        if let Some(hit) = self.cache.get(path).await {
            debug!(path, "topology cache hit");
            return Some(hit);
        }

        let source = Arc::clone(&self.source);
        let key = path.to_string();
        let result = self
            .cache
            .try_get_with(key.clone(), async move {
                let bytes = source.fetch(&key).await?;
                let topology = Topology::decode(&bytes)?;
                debug!(path = %key, bytes = bytes.len(), "topology decoded");
                Ok::<_, crate::error::LoadError>(Arc::new(topology))
            })
            .await;

        match result {
            Ok(topology) => Some(topology),
            Err(e) => {
                warn!(path, error = %e, "failed to load topology; rendering without geometry");
                None
            }
        }
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::CountingSource;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let source = Arc::new(CountingSource::slow(Duration::from_millis(20)));
        let loader = TopologyLoader::new(source.clone());

        let (a, b) = tokio::join!(loader.load("india.json"), loader.load("india.json"));
        assert!(a.is_some() && b.is_some());
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(source.count(), 1);
    }

    #[tokio::test]
    async fn test_repeat_load_hits_cache() {
        let source = Arc::new(CountingSource::default());
        let loader = TopologyLoader::new(source.clone());

        loader.load("india.json").await.unwrap();
        loader.load("india.json").await.unwrap();
        loader.load("kerala.json").await.unwrap();
        assert_eq!(source.count(), 2);
        assert!(loader.is_cached("india.json"));
    }

    #[tokio::test]
    async fn test_failure_resolves_to_none_and_retries() {
        let source = Arc::new(CountingSource::default());
        let loader = TopologyLoader::new(source.clone());

        assert!(loader.load("missing.json").await.is_none());
        assert!(loader.load("missing.json").await.is_none());
        assert_eq!(source.count(), 2);
        assert!(!loader.is_cached("missing.json"));
    }
}
