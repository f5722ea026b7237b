use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Airtable API key
    pub airtable_api_key: String,

    /// Airtable base identifier (e.g., "appXXXXXXXXXXXXXX")
    pub airtable_base_id: String,

    /// Airtable table holding the certificate records
    pub airtable_table_name: String,

    /// Metaplex signing gateway endpoint (fronts the Solana RPC connection)
    pub chain_gateway_url: String,

    /// Signing keypair material, JSON-encoded byte array
    pub chain_secret_key: String,

    /// Pinata API key
    pub pinata_api_key: String,

    /// Pinata secret API key
    pub pinata_secret_api_key: String,

    /// Parent collection mint address the candy machines attach to
    pub collection_mint: String,

    /// SendGrid API key
    pub sendgrid_api_key: String,

    /// Sender address for recipient notifications
    #[serde(default = "default_email_from")]
    pub email_from: String,

    /// Records processed per Prepare & Upload invocation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay between job invocations within a drain phase, in seconds
    #[serde(default = "default_stage_delay_secs")]
    pub stage_delay_secs: u64,

    /// Delay between full orchestrator cycles, in seconds
    #[serde(default = "default_cycle_delay_secs")]
    pub cycle_delay_secs: u64,

    /// Commitment level for chain operations
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Cluster query parameter for explorer links
    #[serde(default = "default_cluster")]
    pub solana_cluster: String,

    /// Symbol stamped on provisioned candy machines
    #[serde(default = "default_collection_symbol")]
    pub collection_symbol: String,

    /// Seller fee in basis points
    #[serde(default = "default_royalty_basis_points")]
    pub royalty_basis_points: u16,

    /// TTF used for the achievement-level line
    #[serde(default = "default_font_regular_path")]
    pub font_regular_path: String,

    /// TTF used for the programme name and certificate tag
    #[serde(default = "default_font_semibold_path")]
    pub font_semibold_path: String,

    /// Run a single orchestrator cycle and exit instead of polling forever
    #[serde(default)]
    pub run_once: bool,
}

fn default_email_from() -> String {
    "certificates@example.club".to_string()
}

fn default_batch_size() -> usize {
    8
}

fn default_stage_delay_secs() -> u64 {
    30
}

fn default_cycle_delay_secs() -> u64 {
    120
}

fn default_commitment() -> String {
    "finalized".to_string()
}

fn default_cluster() -> String {
    "mainnet-beta".to_string()
}

fn default_collection_symbol() -> String {
    "CERT".to_string()
}

fn default_royalty_basis_points() -> u16 {
    1000
}

fn default_font_regular_path() -> String {
    "fonts/Montserrat-Regular.ttf".to_string()
}

fn default_font_semibold_path() -> String {
    "fonts/Montserrat-SemiBold.ttf".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
