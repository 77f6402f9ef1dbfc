use thiserror::Error;

/// Transport or status failure while talking to the upstream API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid request URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid request header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Failure extracting the stock value from an embedded XML payload.
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("payload has no <{element}> element")]
    MissingElement { element: &'static str },

    #[error("payload root is <{found}>, expected <{expected}>")]
    UnexpectedRoot {
        found: String,
        expected: &'static str,
    },

    #[error("payload has content after the closing </{root}>")]
    TrailingContent { root: &'static str },
}

/// Shape failure in a catalog or availability response body.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("JSON deserialization error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stock payload for item {item_id} is invalid: {source}")]
    Markup {
        item_id: String,
        #[source]
        source: MarkupError,
    },
}

/// A failure that aborts a whole reconciliation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not fetch catalog for {category}: {source}")]
    CatalogFetch {
        category: String,
        #[source]
        source: FetchError,
    },

    #[error("could not decode catalog for {category}: {source}")]
    CatalogDecode {
        category: String,
        #[source]
        source: DecodeError,
    },

    #[error("page {page} is out of range; pages start at 1")]
    InvalidPage { page: usize },
}

/// A per-manufacturer failure. Absorbed by the engine: the affected products
/// are returned without availability instead of failing the request.
#[derive(Debug, Error)]
pub enum ManufacturerError {
    #[error("could not fetch availability for {manufacturer}: {source}")]
    Fetch {
        manufacturer: String,
        #[source]
        source: FetchError,
    },

    #[error("could not decode availability for {manufacturer}: {source}")]
    Decode {
        manufacturer: String,
        #[source]
        source: DecodeError,
    },
}

impl ManufacturerError {
    #[must_use]
    pub fn manufacturer(&self) -> &str {
        match self {
            Self::Fetch { manufacturer, .. } | Self::Decode { manufacturer, .. } => manufacturer,
        }
    }
}
