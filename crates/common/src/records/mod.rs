//! Record types stored and served by PaperScout
//!
//! Two independent collections back the service: paper records keyed by url
//! (deduplicated, mutated in place) and search records (append-only log, one
//! entry per search invocation). Projected views carry the subset of fields
//! the listing operations return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached metadata for one research paper, keyed by url.
///
/// The `timestamp` field is rewritten by every full save, so it reflects the
/// last write, not first creation. Partial summary updates leave it alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaperRecord {
    /// Unique identifier and primary key; never regenerated
    pub url: String,

    /// Descriptive label; "Unknown Title" when the record was created
    /// solely to attach a summary
    pub title: String,

    /// Absent until computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Last write time
    pub timestamp: DateTime<Utc>,
}

impl PaperRecord {
    /// Build a record stamped with the current wall clock.
    pub fn new(title: impl Into<String>, url: impl Into<String>, summary: Option<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            summary,
            timestamp: Utc::now(),
        }
    }

    /// True when a summary is present and non-empty.
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Denormalized {title, url} pair embedded in search snapshots.
///
/// A search record holds a copy, not a live reference; the two collections
/// evolve independently after the search completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaperRef {
    pub title: String,
    pub url: String,
}

/// Immutable log entry capturing one query invocation and its result snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Derived from the query text and the write time at second resolution;
    /// identical queries within the same second collide and resolve by
    /// last-write-wins at the store
    pub search_id: String,

    /// Original input text
    pub query: String,

    /// Result snapshot at search time; never updated retroactively
    pub results: Vec<PaperRef>,

    /// Write time, used for descending-order sort on retrieval
    pub timestamp: DateTime<Utc>,
}

impl SearchRecord {
    /// Project into the listing view.
    pub fn digest(&self) -> SearchDigest {
        SearchDigest {
            search_id: self.search_id.clone(),
            query: self.query.clone(),
            timestamp: self.timestamp,
            result_count: self.results.len(),
        }
    }
}

/// Projected view returned by the search history listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchDigest {
    pub search_id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
}

/// Projected view returned by the saved papers listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedPaper {
    pub title: String,
    pub url: String,
    pub has_summary: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&PaperRecord> for SavedPaper {
    fn from(record: &PaperRecord) -> Self {
        Self {
            title: record.title.clone(),
            url: record.url.clone(),
            has_summary: record.has_summary(),
            timestamp: record.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_summary_treats_empty_as_absent() {
        let mut paper = PaperRecord::new("Attention Is All You Need", "https://arxiv.org/abs/1706.03762", None);
        assert!(!paper.has_summary());

        paper.summary = Some(String::new());
        assert!(!paper.has_summary());

        paper.summary = Some("Introduces the Transformer.".to_string());
        assert!(paper.has_summary());
    }

    #[test]
    fn test_saved_paper_projection() {
        let paper = PaperRecord::new(
            "Scaling Laws for Neural Language Models",
            "https://arxiv.org/abs/2001.08361",
            Some("Power-law scaling of loss.".to_string()),
        );
        let view = SavedPaper::from(&paper);
        assert_eq!(view.url, paper.url);
        assert!(view.has_summary);
        assert_eq!(view.timestamp, paper.timestamp);
    }

    #[test]
    fn test_search_record_digest_counts_results() {
        let record = SearchRecord {
            search_id: "neural pruning_20260804_120000".to_string(),
            query: "neural pruning".to_string(),
            results: vec![
                PaperRef {
                    title: "The Lottery Ticket Hypothesis".to_string(),
                    url: "https://arxiv.org/abs/1803.03635".to_string(),
                },
                PaperRef {
                    title: "Movement Pruning".to_string(),
                    url: "https://arxiv.org/abs/2005.07683".to_string(),
                },
            ],
            timestamp: Utc::now(),
        };

        let digest = record.digest();
        assert_eq!(digest.result_count, 2);
        assert_eq!(digest.query, "neural pruning");
        assert!(!digest.search_id.is_empty());
    }

    #[test]
    fn test_paper_record_roundtrips_through_json() {
        let paper = PaperRecord::new("Deep Residual Learning", "https://arxiv.org/abs/1512.03385", None);
        let value = serde_json::to_value(&paper).unwrap();
        // Absent summary is omitted, not serialized as null
        assert!(value.get("summary").is_none());

        let back: PaperRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, paper);
    }
}
