//! Processed-item ledger.
//!
//! The ledger is the durable record of which item URLs have already been
//! turned into presentations; the batch controller consults it to skip work
//! and writes to it exactly once per successful build. Persistence sits
//! behind the [`LedgerStore`] interface so the JSON-file store can be
//! swapped for an embedded database without touching controller logic.
//!
//! The store is rewritten wholesale on every write, not appended. This is
//! only safe under the documented precondition that a single batch run is
//! active at a time; concurrent writers would race and the design adds no
//! locking for them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::Result;
use crate::sites::Site;

/// One ledger entry, keyed by item URL.
///
/// Created only after a presentation has been successfully built; a build
/// failure leaves the URL absent so the item is retried on the next run.
/// Once written, a URL is permanently processed for the lifetime of the
/// ledger file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub presentation_id: String,
    pub presentation_url: String,
    pub title: String,
    pub author: String,
    pub year: String,
    pub medium: String,
    pub keywords: String,
    /// Number of image candidates used, one slide each.
    pub slide_count: usize,
    pub processed_at: DateTime<Utc>,
}

/// Persistence interface for the ledger: load everything, save everything.
pub trait LedgerStore: Send {
    fn load(&self) -> Result<BTreeMap<String, ProcessingRecord>>;
    fn save(&self, records: &BTreeMap<String, ProcessingRecord>) -> Result<()>;
}

/// JSON-file store: one JSON object per site, keyed by item URL.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Conventional ledger path for a site inside a ledger directory.
    pub fn site_path(dir: &Path, site: Site) -> PathBuf {
        dir.join(format!("processed_{}.json", site.slug().replace('-', "_")))
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<BTreeMap<String, ProcessingRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, records: &BTreeMap<String, ProcessingRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename keeps the previous snapshot intact if the
        // process dies mid-write.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(records)?)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

/// In-memory view of the ledger plus its backing store.
pub struct Ledger {
    store: Box<dyn LedgerStore>,
    records: BTreeMap<String, ProcessingRecord>,
}

impl Ledger {
    /// Opens a ledger, loading all existing records from the store.
    pub fn open(store: Box<dyn LedgerStore>) -> Result<Self> {
        let records = store.load()?;
        debug!(records = records.len(), "ledger opened");
        Ok(Self { store, records })
    }

    /// Whether this item URL has already produced a presentation.
    pub fn is_processed(&self, url: &Url) -> bool {
        self.records.contains_key(url.as_str())
    }

    /// Records a successfully built presentation and persists the whole
    /// snapshot. Must only be called after the build succeeded.
    pub fn record(&mut self, url: &Url, record: ProcessingRecord) -> Result<()> {
        self.records.insert(url.to_string(), record);
        self.store.save(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
