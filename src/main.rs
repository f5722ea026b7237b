use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use certmint::app_state::AppState;
use certmint::config::AppConfig;
use certmint::jobs::{MintJob, PrepareJob, StageJob, TransferJob};
use certmint::orchestrator::Orchestrator;
use certmint::services::chain::{CollectionSettings, MetaplexGateway};
use certmint::services::email::SendGridClient;
use certmint::services::pinning::PinataClient;
use certmint::services::render::CertificateRenderer;
use certmint::store::AirtableStore;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration; missing values are fatal before any work starts
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Missing or invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Initializing certificate pipeline");

    let store = Arc::new(AirtableStore::new(
        &config.airtable_api_key,
        &config.airtable_base_id,
        &config.airtable_table_name,
    ));

    let pins = Arc::new(PinataClient::new(
        &config.pinata_api_key,
        &config.pinata_secret_api_key,
    ));

    let chain = Arc::new(MetaplexGateway::new(
        &config.chain_gateway_url,
        &config.chain_secret_key,
        CollectionSettings {
            collection_mint: config.collection_mint.clone(),
            symbol: config.collection_symbol.clone(),
            royalty_basis_points: config.royalty_basis_points,
        },
        &config.commitment,
    ));

    let mailer = Arc::new(SendGridClient::new(
        &config.sendgrid_api_key,
        &config.email_from,
    ));

    let renderer = match CertificateRenderer::from_font_paths(
        &config.font_regular_path,
        &config.font_semibold_path,
    ) {
        Ok(renderer) => Arc::new(renderer),
        Err(e) => {
            eprintln!("Missing or invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let state = AppState::new(store.clone(), pins, chain, mailer, renderer);

    let jobs: Vec<Arc<dyn StageJob>> = vec![
        Arc::new(PrepareJob::new(state.clone(), config.batch_size)),
        Arc::new(MintJob::new(state.clone(), &config.solana_cluster)),
        Arc::new(TransferJob::new(state.clone(), &config.solana_cluster)),
    ];

    let orchestrator = Orchestrator::new(
        store,
        jobs,
        Duration::from_secs(config.stage_delay_secs),
        Duration::from_secs(config.cycle_delay_secs),
    );

    if config.run_once {
        match orchestrator.run_cycle().await {
            Ok(report) => tracing::info!(
                processed = report.total_processed(),
                "single pass complete"
            ),
            Err(e) => {
                tracing::error!(error = %e, "single pass failed");
                std::process::exit(1);
            }
        }
    } else {
        tracing::info!(
            stage_delay_secs = config.stage_delay_secs,
            cycle_delay_secs = config.cycle_delay_secs,
            "starting polling loop"
        );
        orchestrator.run().await;
    }
}
