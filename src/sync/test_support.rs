//! # Sync Test Support
//!
//! In-memory fakes for the sync traits: an auth provider that always
//! hands out the same token, a tabular store holding documents in a map,
//! and a settings store without a filesystem. The tabular store keeps a
//! call log so tests can assert ordering (clear before write, cache
//! before search) and can inject one failing call.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::storage::json::{SettingsStorage, SyncSettings};
use crate::sync::adapter::{SheetsSyncAdapter, SPREADSHEET_NAME};
use crate::sync::rows::SHEET_TABS;
use crate::sync::traits::{AuthProvider, RangeUpdate, TabularStore};

/// Auth provider that always returns `fake-token`
#[derive(Default)]
pub struct FakeAuthProvider {
    signed_out: Mutex<bool>,
}

impl FakeAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_out(&self) -> bool {
        *self.signed_out.lock().unwrap()
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn access_token(&self) -> Result<String> {
        Ok("fake-token".to_string())
    }

    async fn sign_out(&self) -> Result<()> {
        *self.signed_out.lock().unwrap() = true;
        Ok(())
    }
}

/// One fake spreadsheet: its tabs, header rows and data rows
#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    pub name: String,
    pub tabs: Vec<String>,
    /// tab name → header row (row 1)
    pub headers: BTreeMap<String, Vec<String>>,
    /// tab name → data rows (row 2 downward)
    pub data: BTreeMap<String, Vec<Vec<String>>>,
}

#[derive(Default)]
struct FakeSheetState {
    documents: BTreeMap<String, FakeDocument>,
    next_id: u32,
    calls: Vec<String>,
    fail_next: bool,
}

/// In-memory tabular store with a call log
#[derive(Default)]
pub struct FakeTabularStore {
    state: Mutex<FakeSheetState>,
}

impl FakeTabularStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with an injected error
    pub fn fail_next_call(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn document(&self, document_id: &str) -> Option<FakeDocument> {
        self.state.lock().unwrap().documents.get(document_id).cloned()
    }

    pub fn insert_document(&self, document_id: &str, document: FakeDocument) {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(document_id.to_string(), document);
    }

    /// Log the call and fail it if a failure was injected
    fn record(&self, call: String) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.fail_next {
            state.fail_next = false;
            return Err(anyhow::anyhow!("injected store failure"));
        }
        Ok(())
    }
}

fn range_tab(range: &str) -> &str {
    range.split('!').next().unwrap_or(range)
}

fn is_header_range(range: &str) -> bool {
    range
        .split('!')
        .nth(1)
        .map(|rest| rest.starts_with("A1:"))
        .unwrap_or(false)
}

#[async_trait]
impl TabularStore for FakeTabularStore {
    async fn find_document(&self, _token: &str, name: &str) -> Result<Option<String>> {
        self.record(format!("find:{}", name))?;
        let state = self.state.lock().unwrap();
        Ok(state
            .documents
            .iter()
            .find(|(_, document)| document.name == name)
            .map(|(id, _)| id.clone()))
    }

    async fn document_exists(&self, _token: &str, document_id: &str) -> Result<bool> {
        self.record(format!("exists:{}", document_id))?;
        Ok(self.state.lock().unwrap().documents.contains_key(document_id))
    }

    async fn create_document(&self, _token: &str, name: &str, tabs: &[String]) -> Result<String> {
        self.record(format!("create:{}", name))?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let document_id = format!("sheet-{}", state.next_id);
        state.documents.insert(
            document_id.clone(),
            FakeDocument {
                name: name.to_string(),
                tabs: tabs.to_vec(),
                ..Default::default()
            },
        );
        Ok(document_id)
    }

    async fn list_tabs(&self, _token: &str, document_id: &str) -> Result<Vec<String>> {
        self.record(format!("tabs:{}", document_id))?;
        let state = self.state.lock().unwrap();
        state
            .documents
            .get(document_id)
            .map(|document| document.tabs.clone())
            .ok_or_else(|| anyhow::anyhow!("no such document: {}", document_id))
    }

    async fn add_tabs(&self, _token: &str, document_id: &str, tabs: &[String]) -> Result<()> {
        self.record(format!("add_tabs:{}:{}", document_id, tabs.join(",")))?;
        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| anyhow::anyhow!("no such document: {}", document_id))?;
        document.tabs.extend(tabs.iter().cloned());
        Ok(())
    }

    async fn batch_get(
        &self,
        _token: &str,
        document_id: &str,
        ranges: &[String],
    ) -> Result<Vec<Vec<Vec<String>>>> {
        self.record(format!("get:{}", ranges.join(",")))?;
        let state = self.state.lock().unwrap();
        let document = state
            .documents
            .get(document_id)
            .ok_or_else(|| anyhow::anyhow!("no such document: {}", document_id))?;

        Ok(ranges
            .iter()
            .map(|range| {
                document
                    .data
                    .get(range_tab(range))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }

    async fn batch_update(
        &self,
        _token: &str,
        document_id: &str,
        updates: &[RangeUpdate],
    ) -> Result<()> {
        let ranges: Vec<&str> = updates.iter().map(|update| update.range.as_str()).collect();
        self.record(format!("update:{}", ranges.join(",")))?;

        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| anyhow::anyhow!("no such document: {}", document_id))?;

        for update in updates {
            let tab = range_tab(&update.range).to_string();
            if is_header_range(&update.range) {
                document
                    .headers
                    .insert(tab, update.values.first().cloned().unwrap_or_default());
            } else {
                document.data.insert(tab, update.values.clone());
            }
        }
        Ok(())
    }

    async fn batch_clear(&self, _token: &str, document_id: &str, ranges: &[String]) -> Result<()> {
        self.record(format!("clear:{}", ranges.join(",")))?;
        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| anyhow::anyhow!("no such document: {}", document_id))?;
        for range in ranges {
            document.data.remove(range_tab(range));
        }
        Ok(())
    }
}

/// Settings store without a filesystem behind it
#[derive(Default)]
pub struct InMemorySettings {
    inner: Mutex<SyncSettings>,
}

impl SettingsStorage for InMemorySettings {
    fn get_settings(&self) -> Result<SyncSettings> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn set_cached_spreadsheet_id(&self, spreadsheet_id: Option<String>) -> Result<()> {
        self.inner.lock().unwrap().cached_spreadsheet_id = spreadsheet_id;
        Ok(())
    }

    fn update_settings(&self, settings: &SyncSettings) -> Result<()> {
        *self.inner.lock().unwrap() = settings.clone();
        Ok(())
    }
}

/// A fully faked adapter ready for tests
pub fn fake_adapter() -> SheetsSyncAdapter<FakeAuthProvider, FakeTabularStore, InMemorySettings> {
    SheetsSyncAdapter::new(
        FakeAuthProvider::new(),
        FakeTabularStore::new(),
        InMemorySettings::default(),
    )
}

/// Seed the fake store with a complete remote document (`seeded-1`)
/// holding one habit, one completion and 120 points
pub fn seeded_remote(
    adapter: &SheetsSyncAdapter<FakeAuthProvider, FakeTabularStore, InMemorySettings>,
) {
    let mut document = FakeDocument {
        name: SPREADSHEET_NAME.to_string(),
        tabs: SHEET_TABS.iter().map(|tab| tab.to_string()).collect(),
        ..Default::default()
    };
    document.data.insert(
        "Habits".to_string(),
        vec![vec![
            "h1".to_string(),
            "Morning Run".to_string(),
            "🏃".to_string(),
            "Fitness".to_string(),
            "move".to_string(),
            "2024-03-01T08:00:00Z".to_string(),
        ]],
    );
    document.data.insert(
        "Completions".to_string(),
        vec![vec![
            "h1".to_string(),
            "2024-03-01".to_string(),
            "TRUE".to_string(),
        ]],
    );
    document.data.insert(
        "Economy".to_string(),
        vec![
            vec!["Points".to_string(), "120".to_string()],
            vec!["Streak".to_string(), "3".to_string()],
            vec!["Rank".to_string(), "Apprentice".to_string()],
        ],
    );

    adapter.store().insert_document("seeded-1", document);
}
