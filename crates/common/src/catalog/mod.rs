//! Paper catalog: cache logic over the papers collection
//!
//! Reads fail soft: a store error on a lookup is reported as absence, so
//! callers cannot distinguish "never seen" from "store unreachable" on the
//! read path. Writes propagate. `save_paper` is an unconditional full
//! replace; a later save without a summary erases a previously attached one.
//! `attach_summary` is the field-level alternative that leaves the title and
//! timestamp alone.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::records::{PaperRecord, SavedPaper};
use crate::store::{Collection, RecordStore};
use crate::PLACEHOLDER_TITLE;

/// Cache layer over the papers collection.
#[derive(Clone)]
pub struct PaperCatalog {
    store: Arc<dyn RecordStore>,
}

impl PaperCatalog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Look up a paper by url.
    ///
    /// Store failures and malformed records are swallowed and reported as
    /// absence; only a well-formed stored record produces `Some`.
    pub async fn get_paper(&self, url: &str) -> Option<PaperRecord> {
        let item = match self.store.get(Collection::Papers, url).await {
            Ok(item) => item?,
            Err(e) => {
                debug!(url, error = %e, "Paper lookup failed, treating as absent");
                return None;
            }
        };

        match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(url, error = %e, "Stored paper record is malformed, treating as absent");
                None
            }
        }
    }

    /// Upsert a paper record, replacing every field including the timestamp.
    ///
    /// Full-replace semantics: calling this without a summary erases any
    /// summary a prior write attached. Callers that only want to add a
    /// summary must use [`attach_summary`](Self::attach_summary).
    pub async fn save_paper(
        &self,
        title: &str,
        url: &str,
        summary: Option<String>,
    ) -> Result<()> {
        let record = PaperRecord::new(title, url, summary);
        let item = serde_json::to_value(&record)?;
        self.store.put(Collection::Papers, url, item).await?;
        debug!(url, title, "Paper saved");
        Ok(())
    }

    /// Attach a summary to the record under `url`.
    ///
    /// On an existing record this sets only the summary field; on a missing
    /// record it creates one with the placeholder title.
    pub async fn attach_summary(&self, url: &str, summary: &str) -> Result<()> {
        if self.get_paper(url).await.is_some() {
            let mut fields = Map::new();
            fields.insert("summary".to_string(), Value::String(summary.to_string()));
            self.store.merge(Collection::Papers, url, fields).await?;
            debug!(url, "Summary attached to existing paper");
        } else {
            self.save_paper(PLACEHOLDER_TITLE, url, Some(summary.to_string()))
                .await?;
            debug!(url, "Summary attached to new placeholder paper");
        }
        Ok(())
    }

    /// List up to `limit` saved papers as projected views, in store order
    /// (no sort applied).
    ///
    /// Store failures are swallowed; the caller sees an empty listing.
    pub async fn list_saved(&self, limit: usize) -> Vec<SavedPaper> {
        let items = match self.store.scan(Collection::Papers, limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to scan saved papers");
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<PaperRecord>(item).ok())
            .map(|record| SavedPaper::from(&record))
            .collect()
    }
}
