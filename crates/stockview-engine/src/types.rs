//! Upstream response types for the catalog and availability endpoints.
//!
//! ## Observed shape
//!
//! ### `GET /products/{category}`
//! A bare JSON array. Each element carries `id`, `type`, `name`, `color`
//! (array of strings), `price` (number), and `manufacturer`. Some responses
//! also include an `availability` key; it is not declared here, so serde
//! ignores it and the engine always recomputes availability.
//!
//! ### `GET /availability/{manufacturer}`
//! An object `{ "code": 200, "response": [...] }`. Each record has an `id`
//! (uppercase hex) and a `DATAPAYLOAD` string holding an XML document:
//!
//! ```text
//! <AVAILABILITY>
//!   <CODE>200</CODE>
//!   <INSTOCKVALUE>OUTOFSTOCK</INSTOCKVALUE>
//! </AVAILABILITY>
//! ```
//!
//! When the upstream is failing it may send `"response": "[]"` (a string),
//! which does not match [`AvailabilityResponse`] and is reported as a
//! decode failure for that manufacturer.

use serde::Deserialize;

/// One element of the catalog array.
#[derive(Debug, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(rename = "color")]
    pub colors: Vec<String>,
    pub price: f64,
    pub manufacturer: String,
}

/// Top-level body of an availability response.
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    /// Status code reported inside the body, independent of the HTTP status.
    pub code: i64,
    pub response: Vec<AvailabilityRecord>,
}

/// One stock record whose payload is still undecoded XML.
#[derive(Debug, Deserialize)]
pub struct AvailabilityRecord {
    pub id: String,
    #[serde(rename = "DATAPAYLOAD", alias = "rawPayload")]
    pub raw_payload: String,
}
