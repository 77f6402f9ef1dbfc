//! Availability decoding: raw `availability/{manufacturer}` bodies into
//! stock records with their XML payloads resolved.

use chrono::{DateTime, Utc};
use stockview_core::{ManufacturerAvailability, StockRecord};

use crate::error::DecodeError;
use crate::markup::extract_stock_value;
use crate::types::AvailabilityResponse;

/// A decoded availability response, not yet tied to a manufacturer name or
/// fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAvailability {
    pub status_code: i64,
    /// Records in upstream order, duplicates included.
    pub records: Vec<StockRecord>,
}

impl DecodedAvailability {
    /// Attaches the manufacturer name and fetch time, producing a cache entry.
    #[must_use]
    pub fn into_entry(self, name: &str, fetched_at: DateTime<Utc>) -> ManufacturerAvailability {
        ManufacturerAvailability::new(name, self.status_code, self.records, fetched_at)
    }
}

/// Decodes one manufacturer's availability body.
///
/// Each record's payload is parsed as XML. The first record that fails
/// aborts the decode; a manufacturer is never returned with only some of its
/// records.
///
/// # Errors
///
/// - [`DecodeError::Json`]: the body does not match the response shape.
/// - [`DecodeError::Markup`]: a record's payload is malformed or has no stock value.
pub fn decode_availability(body: &[u8]) -> Result<DecodedAvailability, DecodeError> {
    let response: AvailabilityResponse =
        serde_json::from_slice(body).map_err(|e| DecodeError::Json {
            context: "availability response".to_owned(),
            source: e,
        })?;

    let records = response
        .response
        .into_iter()
        .map(|record| {
            let availability =
                extract_stock_value(&record.raw_payload).map_err(|e| DecodeError::Markup {
                    item_id: record.id.clone(),
                    source: e,
                })?;
            Ok(StockRecord {
                item_id: record.id,
                availability,
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    Ok(DecodedAvailability {
        status_code: response.code,
        records,
    })
}
