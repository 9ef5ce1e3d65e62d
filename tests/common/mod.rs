// Shared fakes for integration tests
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use scan_catalog::clipboard::ClipboardSource;
use scan_catalog::dispatch::{
    BackendError, CatalogBackend, CatalogEntry, CatalogEvent, CatalogResult, EventSink,
    ScanCallbacks, ScanResolution,
};
use scan_catalog::error::AppError;
use scan_catalog::identifier::IdentifierKind;

/// Clipboard whose content is controlled by the test.
///
/// Queued reads are served first; afterwards the current text is returned.
#[derive(Clone, Default)]
pub struct FakeClipboard {
    text: Arc<Mutex<String>>,
    queued: Arc<Mutex<VecDeque<Result<String, String>>>>,
    reads: Arc<AtomicUsize>,
}

impl FakeClipboard {
    pub fn with_text(text: &str) -> Self {
        let clipboard = Self::default();
        clipboard.set_text(text);
        clipboard
    }

    pub fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = text.to_string();
    }

    pub fn queue(&self, read: Result<&str, &str>) {
        self.queued
            .lock()
            .unwrap()
            .push_back(read.map(str::to_string).map_err(str::to_string));
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ClipboardSource for FakeClipboard {
    fn read_text(&mut self) -> Result<String, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(read) = self.queued.lock().unwrap().pop_front() {
            return read.map_err(AppError::Clipboard);
        }
        Ok(self.text.lock().unwrap().clone())
    }
}

/// In-memory backend recording every call.
#[derive(Default)]
pub struct FakeBackend {
    pub existing: Mutex<HashSet<String>>,
    pub codes: Mutex<HashMap<String, CatalogEntry>>,
    pub same_title_entries: Mutex<usize>,
    pub check_error: Mutex<Option<BackendError>>,
    pub fetch_error: Mutex<Option<BackendError>>,
    /// 设置后，下一次 `check_exists` 会等到通知才返回
    pub check_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn entry(id: &str, title: &str) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        title: title.to_string(),
        number: None,
        identifiers: Vec::new(),
    }
}

#[async_trait::async_trait]
impl CatalogBackend for FakeBackend {
    async fn check_exists(&self, identifier: &str) -> Result<bool, BackendError> {
        self.record(format!("check_exists:{identifier}"));
        let gate = self.check_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.check_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.existing.lock().unwrap().contains(identifier))
    }

    async fn fetch_and_catalog(&self, identifier: &str) -> Result<CatalogResult, BackendError> {
        self.record(format!("fetch_and_catalog:{identifier}"));
        if let Some(err) = self.fetch_error.lock().unwrap().take() {
            return Err(err);
        }
        self.existing.lock().unwrap().insert(identifier.to_string());
        Ok(CatalogResult {
            entry: entry(&format!("vol-{identifier}"), "Fetched"),
            same_title_entries: *self.same_title_entries.lock().unwrap(),
        })
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogEntry>, BackendError> {
        self.record(format!("find_by_code:{code}"));
        Ok(self.codes.lock().unwrap().get(code).cloned())
    }

    async fn clone_entry(&self, entry_id: &str) -> Result<String, BackendError> {
        self.record(format!("clone_entry:{entry_id}"));
        Ok(format!("{entry_id}-copy"))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CatalogEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<CatalogEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: CatalogEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Resolved(IdentifierKind, ScanResolution),
    UnknownFormat(String),
    LookupFailed(String, String),
}

#[derive(Default)]
pub struct RecordingCallbacks {
    seen: Mutex<Vec<Callback>>,
}

impl RecordingCallbacks {
    pub fn seen(&self) -> Vec<Callback> {
        self.seen.lock().unwrap().clone()
    }
}

impl ScanCallbacks for RecordingCallbacks {
    fn on_resolved(&self, kind: IdentifierKind, resolution: ScanResolution) {
        self.seen.lock().unwrap().push(Callback::Resolved(kind, resolution));
    }

    fn on_unknown_format(&self, raw: &str) {
        self.seen
            .lock()
            .unwrap()
            .push(Callback::UnknownFormat(raw.to_string()));
    }

    fn on_lookup_failed(&self, identifier: &str, message: &str) {
        self.seen
            .lock()
            .unwrap()
            .push(Callback::LookupFailed(identifier.to_string(), message.to_string()));
    }
}
