//! # Sync Traits
//!
//! Abstractions over the two external concerns of remote sync: obtaining
//! an access token and talking to a tabular document store. The adapter
//! is written against these traits only, so tests run against in-memory
//! fakes and the Google implementations stay swappable.

use anyhow::Result;
use async_trait::async_trait;

/// Source of bearer tokens for the remote store
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// A currently valid access token, refreshing or prompting for
    /// authorization as needed
    async fn access_token(&self) -> Result<String>;

    /// Revoke stored credentials and forget them locally
    async fn sign_out(&self) -> Result<()>;
}

/// One contiguous block of cells to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeUpdate {
    /// A1-notation range, e.g. `Habits!A2`
    pub range: String,
    /// Row-major cell values
    pub values: Vec<Vec<String>>,
}

impl RangeUpdate {
    pub fn new(range: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        Self {
            range: range.into(),
            values,
        }
    }
}

/// A remote store of named spreadsheet-like documents with tabs of cells.
/// Ranges use A1 notation throughout.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Find a document by exact name, returning its id
    async fn find_document(&self, token: &str, name: &str) -> Result<Option<String>>;

    /// Whether a document with this id still exists and is reachable
    async fn document_exists(&self, token: &str, document_id: &str) -> Result<bool>;

    /// Create a document with the given tabs, returning its id
    async fn create_document(&self, token: &str, name: &str, tabs: &[String]) -> Result<String>;

    /// Names of the tabs currently in the document
    async fn list_tabs(&self, token: &str, document_id: &str) -> Result<Vec<String>>;

    /// Add tabs to an existing document
    async fn add_tabs(&self, token: &str, document_id: &str, tabs: &[String]) -> Result<()>;

    /// Read several ranges in one round trip. The result has one entry
    /// per requested range, in order; short or missing rows come back as
    /// short vectors.
    async fn batch_get(
        &self,
        token: &str,
        document_id: &str,
        ranges: &[String],
    ) -> Result<Vec<Vec<Vec<String>>>>;

    /// Write several ranges in one round trip
    async fn batch_update(
        &self,
        token: &str,
        document_id: &str,
        updates: &[RangeUpdate],
    ) -> Result<()>;

    /// Clear several ranges in one round trip
    async fn batch_clear(&self, token: &str, document_id: &str, ranges: &[String]) -> Result<()>;
}
