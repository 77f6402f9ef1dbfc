pub mod availability;
pub mod cache;
pub mod catalog;
pub mod engine;
pub mod error;
#[cfg(test)]
mod fake_source;
pub mod markup;
pub mod pagination;
pub(crate) mod retry;
pub mod session;
pub mod source;
pub mod types;

pub use availability::{decode_availability, DecodedAvailability};
pub use cache::ManufacturerCache;
pub use catalog::decode_catalog;
pub use engine::{match_product, Engine, EngineSettings, Reconciliation};
pub use error::{DecodeError, EngineError, FetchError, ManufacturerError, MarkupError};
pub use session::{Session, SessionPage};
pub use source::{HttpStockSource, StockSource};
