//! Upstream collaborators that supply raw catalog and availability bodies.

mod http;

use std::future::Future;

use crate::error::FetchError;

pub use http::HttpStockSource;

/// The two fetch capabilities the engine needs from the outside world.
///
/// Implementations return the raw response body; decoding is the engine's
/// job. A failure here is a transport or status problem, never a shape
/// problem.
pub trait StockSource: Send + Sync {
    /// Fetches the catalog body for one category.
    fn fetch_catalog(
        &self,
        category: &str,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;

    /// Fetches the availability body for one manufacturer.
    fn fetch_availability(
        &self,
        manufacturer: &str,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}
