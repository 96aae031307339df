use thiserror::Error;

/// Failure while fetching or decoding boundary geometry.
///
/// These never escape the engine: the loader logs them and resolves to
/// "no geometry" so the map simply renders empty.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("request for {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("failed to decode geometry: {0}")]
    Decode(String),

    #[error("unrecognized geometry document type `{0}` (expected Topology or FeatureCollection)")]
    UnknownFormat(String),

    #[error("layer `{0}` not found in topology")]
    MissingLayer(String),
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("unknown metric `{0}`")]
    UnknownMetric(String),

    #[error("invalid statistics document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog country map `{0}` is missing or not a country-level map")]
    MissingCountry(String),
}
