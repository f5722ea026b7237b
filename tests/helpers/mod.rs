//! In-memory fakes for every pipeline seam, used by the integration tests.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use certmint::models::record::{fields, CertificateRecord, CertificateStatus};
use certmint::services::chain::{ChainError, ChainService};
use certmint::services::email::{MailError, Mailer};
use certmint::services::pinning::{ContentStore, PinError};
use certmint::services::render::{CertificateOverlay, RenderError, Renderer};
use certmint::store::{RecordStore, StoreError};

/// Record store held in memory. Updates are field merges, and every status
/// write is journaled so tests can assert forward-only progression.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CertificateRecord>>,
    status_writes: Mutex<Vec<(String, CertificateStatus)>>,
    /// Total `count` polls, so loop tests can see each re-poll.
    pub count_calls: AtomicUsize,
    /// When set, the next `count` fails once with a store error.
    pub fail_next_count: AtomicBool,
}

impl MemoryStore {
    pub fn new(records: Vec<CertificateRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn record(&self, id: &str) -> CertificateRecord {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .unwrap_or_else(|| panic!("no record {id}"))
    }

    /// Status writes for one record, in write order.
    pub fn status_writes(&self, id: &str) -> Vec<CertificateStatus> {
        self.status_writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(rid, _)| rid == id)
            .map(|(_, s)| *s)
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn count(&self, status: CertificateStatus) -> Result<usize, StoreError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_count.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                message: "store offline".to_string(),
            });
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status() == Some(status))
            .count())
    }

    async fn fetch_batch(
        &self,
        status: CertificateStatus,
        limit: usize,
    ) -> Result<Vec<CertificateRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status() == Some(status))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(&self, id: &str, patch: Map<String, Value>) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .unwrap_or_else(|| panic!("update of unknown record {id}"));

        if let Some(status) = patch.get(fields::STATUS).and_then(Value::as_str) {
            self.status_writes
                .lock()
                .unwrap()
                .push((id.to_string(), status.parse().unwrap()));
        }

        for (key, value) in patch {
            record.fields.insert(key, value);
        }
        Ok(())
    }
}

/// Content store that hands out sequential fake gateway URLs.
#[derive(Default)]
pub struct FakePins {
    counter: AtomicUsize,
    pub files: Mutex<Vec<String>>,
    pub documents: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl ContentStore for FakePins {
    async fn pin_file(&self, _bytes: Vec<u8>, filename: &str) -> Result<String, PinError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.files.lock().unwrap().push(filename.to_string());
        Ok(format!("https://ipfs.io/ipfs/QmFile{n}"))
    }

    async fn pin_json(&self, content: &Value, name: &str) -> Result<String, PinError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .unwrap()
            .push((name.to_string(), content.clone()));
        Ok(format!("https://ipfs.io/ipfs/QmDoc{n}"))
    }
}

/// Chain service that provisions sequentially-numbered machines and mints.
#[derive(Default)]
pub struct FakeChain {
    counter: AtomicUsize,
    pub machines: Mutex<Vec<(String, u32)>>,
    pub items: Mutex<HashMap<String, Vec<String>>>,
    pub transfers: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ChainService for FakeChain {
    async fn create_collection_machine(&self, items_available: u32) -> Result<String, ChainError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("Machine{n}");
        self.machines.lock().unwrap().push((id.clone(), items_available));
        Ok(id)
    }

    async fn insert_items(&self, machine_id: &str, uris: &[String]) -> Result<(), ChainError> {
        self.items
            .lock()
            .unwrap()
            .entry(machine_id.to_string())
            .or_default()
            .extend(uris.iter().cloned());
        Ok(())
    }

    async fn mint(&self, _machine_id: &str) -> Result<String, ChainError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Mint{n}"))
    }

    async fn transfer(&self, mint_address: &str, to_owner: &str) -> Result<String, ChainError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.transfers
            .lock()
            .unwrap()
            .push((mint_address.to_string(), to_owner.to_string()));
        Ok(format!("Sig{n}"))
    }
}

/// Mailer that records sends and can be told to fail.
#[derive(Default)]
pub struct FakeMailer {
    pub fail: AtomicBool,
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Api {
                status: 500,
                message: "mail service down".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }
}

/// Renderer that skips drawing and returns marker bytes.
#[derive(Default)]
pub struct FakeRenderer;

impl Renderer for FakeRenderer {
    fn render(
        &self,
        _base_image: &[u8],
        overlay: &CertificateOverlay,
    ) -> Result<Vec<u8>, RenderError> {
        Ok(format!("rendered:{}", overlay.certificate_id).into_bytes())
    }
}

/// A record freshly created by the external system, at the head of the
/// status chain.
pub fn ready_record(id: &str, certificate_id: u32, image_url: &str) -> CertificateRecord {
    serde_json::from_value(json!({
        "id": id,
        "fields": {
            (fields::STATUS): CertificateStatus::Ready.as_str(),
            (fields::CERTIFICATE_IMAGE): [{ "url": image_url, "filename": "base.png" }],
            (fields::PROGRAMME_NAME): ["Solana Bootcamp"],
            (fields::ACHIEVEMENT_LEVEL): "Distinction",
            (fields::CERTIFICATE_ID): certificate_id,
            (fields::WALLET_ADDRESS): [format!("Wallet{certificate_id}")],
            (fields::EMAIL): [format!("student{certificate_id}@example.org")],
        }
    }))
    .unwrap()
}

/// A record as it looks after stage 1 and 2 have run.
pub fn minted_record(id: &str, certificate_id: u32, mint_address: &str) -> CertificateRecord {
    let mut record = ready_record(id, certificate_id, "https://unused.example/base.png");
    record.fields.insert(
        fields::STATUS.to_string(),
        json!(CertificateStatus::Minted.as_str()),
    );
    record.fields.insert(
        fields::CANDY_MACHINE_ID.to_string(),
        json!("Machine0"),
    );
    record.fields.insert(
        fields::NFT_LINK.to_string(),
        json!(format!(
            "https://explorer.solana.com/address/{mint_address}?cluster=mainnet-beta"
        )),
    );
    record
}
