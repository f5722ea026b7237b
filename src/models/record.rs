use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Position of a certificate in the pipeline, stored in the record store
/// under [`fields::STATUS`]. Strictly forward-only: no stage moves a record
/// backward, and there is no failure status — a record that cannot progress
/// stays where it is and is retried on the next cycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum CertificateStatus {
    #[serde(rename = "Ready Sol")]
    #[strum(serialize = "Ready Sol")]
    Ready,

    #[serde(rename = "SPL Loaded")]
    #[strum(serialize = "SPL Loaded")]
    Loaded,

    #[serde(rename = "SPL Minted")]
    #[strum(serialize = "SPL Minted")]
    Minted,

    #[serde(rename = "Success")]
    #[strum(serialize = "Success")]
    Success,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Next status in the chain, `None` once terminal.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Ready => Some(Self::Loaded),
            Self::Loaded => Some(Self::Minted),
            Self::Minted => Some(Self::Success),
            Self::Success => None,
        }
    }
}

/// Column names in the certificate table.
///
/// Input columns are Airtable lookups from the linked Programmes/People
/// tables, so their values arrive as arrays; output columns are written by
/// the stage jobs and accumulate over the record's lifetime.
pub mod fields {
    pub const STATUS: &str = "Certificate Status";
    pub const CERTIFICATE_IMAGE: &str = "Certificate Image (from Programmes)";
    pub const PROGRAMME_NAME: &str = "Programme Name (from Programmes)";
    pub const ACHIEVEMENT_LEVEL: &str = "Achievement level";
    pub const CERTIFICATE_ID: &str = "Certificate ID";
    pub const WALLET_ADDRESS: &str = "Wallet Address (from People)";
    pub const EMAIL: &str = "Email (from People)";

    // Stage outputs
    pub const IPFS_IMAGE: &str = "IPFS Image";
    pub const IPFS_METADATA: &str = "IPFS Metadata";
    pub const CANDY_MACHINE_ID: &str = "Candy Machine ID";
    pub const NFT_LINK: &str = "Link to NFT";
    pub const TXN: &str = "TXN";
}

/// One certificate record as returned by the store: opaque id plus the raw
/// field map. The orchestrator never interprets the payload; the typed
/// accessors below are used by the stage jobs only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub id: String,

    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl CertificateRecord {
    pub fn status(&self) -> Option<CertificateStatus> {
        self.str_field(fields::STATUS)?.parse().ok()
    }

    /// URL of the base certificate image (first attachment of the lookup).
    pub fn image_url(&self) -> Option<&str> {
        self.fields
            .get(fields::CERTIFICATE_IMAGE)?
            .as_array()?
            .first()?
            .get("url")?
            .as_str()
    }

    pub fn programme_name(&self) -> Option<&str> {
        self.lookup_field(fields::PROGRAMME_NAME)
    }

    pub fn achievement_level(&self) -> Option<&str> {
        self.str_field(fields::ACHIEVEMENT_LEVEL)
    }

    /// Certificate id, as text even when the store holds it as a number.
    pub fn certificate_id(&self) -> Option<String> {
        match self.fields.get(fields::CERTIFICATE_ID)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.lookup_field(fields::WALLET_ADDRESS)
    }

    pub fn email(&self) -> Option<&str> {
        self.lookup_field(fields::EMAIL)
    }

    pub fn candy_machine_id(&self) -> Option<&str> {
        self.str_field(fields::CANDY_MACHINE_ID)
    }

    pub fn ipfs_metadata(&self) -> Option<&str> {
        self.str_field(fields::IPFS_METADATA)
    }

    pub fn nft_link(&self) -> Option<&str> {
        self.str_field(fields::NFT_LINK)
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.as_str()
    }

    /// Lookup columns arrive as single-element arrays; tolerate a plain
    /// string as well so fixtures and non-lookup columns both work.
    fn lookup_field(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            Value::String(s) => Some(s),
            Value::Array(items) => items.first()?.as_str(),
            _ => None,
        }
    }
}
