//! In-memory [`StockSource`] used by the engine and session unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::Barrier;

use crate::error::FetchError;
use crate::source::StockSource;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body(Vec<u8>),
    Status(u16),
}

#[derive(Default)]
pub(crate) struct FakeSource {
    catalogs: Mutex<HashMap<String, Reply>>,
    feeds: Mutex<HashMap<String, Reply>>,
    availability_calls: Mutex<Vec<String>>,
    catalog_calls: AtomicUsize,
    /// When set, every availability fetch waits here before answering.
    barrier: Option<Arc<Barrier>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub(crate) fn catalog(self, category: &str, reply: Reply) -> Self {
        self.set_catalog(category, reply);
        self
    }

    pub(crate) fn feed(self, manufacturer: &str, reply: Reply) -> Self {
        self.set_feed(manufacturer, reply);
        self
    }

    pub(crate) fn set_catalog(&self, category: &str, reply: Reply) {
        self.catalogs
            .lock()
            .unwrap()
            .insert(category.to_owned(), reply);
    }

    pub(crate) fn set_feed(&self, manufacturer: &str, reply: Reply) {
        self.feeds
            .lock()
            .unwrap()
            .insert(manufacturer.to_owned(), reply);
    }

    /// Manufacturers requested so far, sorted.
    pub(crate) fn availability_calls(&self) -> Vec<String> {
        let mut calls = self.availability_calls.lock().unwrap().clone();
        calls.sort();
        calls
    }

    pub(crate) fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }
}

fn answer(reply: Option<Reply>, url: String) -> Result<Vec<u8>, FetchError> {
    match reply {
        Some(Reply::Body(body)) => Ok(body),
        Some(Reply::Status(status)) => Err(FetchError::UnexpectedStatus { status, url }),
        None => Err(FetchError::NotFound { url }),
    }
}

impl StockSource for FakeSource {
    async fn fetch_catalog(&self, category: &str) -> Result<Vec<u8>, FetchError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.catalogs.lock().unwrap().get(category).cloned();
        answer(reply, format!("fake://products/{category}"))
    }

    async fn fetch_availability(&self, manufacturer: &str) -> Result<Vec<u8>, FetchError> {
        self.availability_calls
            .lock()
            .unwrap()
            .push(manufacturer.to_owned());
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        let reply = self.feeds.lock().unwrap().get(manufacturer).cloned();
        answer(reply, format!("fake://availability/{manufacturer}"))
    }
}

/// A catalog body with one product per `(id, manufacturer)` pair.
pub(crate) fn catalog_body(products: &[(&str, &str)]) -> Reply {
    let items: Vec<serde_json::Value> = products
        .iter()
        .map(|(id, manufacturer)| {
            json!({
                "id": id,
                "type": "jackets",
                "name": format!("JACKET {id}"),
                "color": ["black"],
                "price": 40,
                "manufacturer": manufacturer
            })
        })
        .collect();
    Reply::Body(serde_json::Value::Array(items).to_string().into_bytes())
}

/// An availability body with one record per `(item id, stock value)` pair.
pub(crate) fn feed_body(records: &[(&str, &str)]) -> Reply {
    let response: Vec<serde_json::Value> = records
        .iter()
        .map(|(id, value)| {
            json!({
                "id": id,
                "DATAPAYLOAD": format!(
                    "<AVAILABILITY>\n  <CODE>200</CODE>\n  <INSTOCKVALUE>{value}</INSTOCKVALUE>\n</AVAILABILITY>"
                )
            })
        })
        .collect();
    Reply::Body(
        json!({ "code": 200, "response": response })
            .to_string()
            .into_bytes(),
    )
}
