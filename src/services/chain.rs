use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const EXPLORER_URL: &str = "https://explorer.solana.com";

/// On-chain operations the pipeline needs. All transaction construction and
/// signing is delegated wholesale to the gateway service; this system
/// contributes no chain logic of its own.
#[async_trait]
pub trait ChainService: Send + Sync {
    /// Provision a candy machine sized to `items_available` under the
    /// configured parent collection. The creator list is not part of the
    /// request: the signing wallet behind the submitted secret key becomes
    /// the sole creator at 100% share. Returns the machine address.
    async fn create_collection_machine(&self, items_available: u32) -> Result<String, ChainError>;

    /// Bulk-register metadata URIs into the machine, named `Certificate #n`
    /// in insertion order.
    async fn insert_items(&self, machine_id: &str, uris: &[String]) -> Result<(), ChainError>;

    /// Mint a single item from the machine. Returns the NFT mint address.
    async fn mint(&self, machine_id: &str) -> Result<String, ChainError>;

    /// Transfer the NFT to `to_owner` and await confirmation. Returns the
    /// transaction signature.
    async fn transfer(&self, mint_address: &str, to_owner: &str) -> Result<String, ChainError>;
}

/// Collection-level settings every provisioned machine shares.
#[derive(Debug, Clone)]
pub struct CollectionSettings {
    /// Parent collection mint address.
    pub collection_mint: String,
    /// Token symbol.
    pub symbol: String,
    /// Seller fee in basis points.
    pub royalty_basis_points: u16,
}

/// Client for a Metaplex signing gateway: a thin JSON-over-HTTP surface over
/// the Metaplex SDK (candy machine create/insert/mint, NFT transfer), with
/// the commitment level attached to every operation.
pub struct MetaplexGateway {
    http: Client,
    base_url: String,
    secret_key: String,
    settings: CollectionSettings,
    commitment: String,
}

#[derive(Deserialize)]
struct CreateMachineResponse {
    candy_machine: String,
}

#[derive(Deserialize)]
struct MintResponse {
    nft_mint: String,
}

#[derive(Deserialize)]
struct TransferResponse {
    signature: String,
}

impl MetaplexGateway {
    pub fn new(
        base_url: &str,
        secret_key: &str,
        settings: CollectionSettings,
        commitment: &str,
    ) -> Self {
        let http = Client::builder()
            // Chain operations block on network confirmation; finalized
            // commitment regularly takes tens of seconds.
            .timeout(Duration::from_secs(180))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            settings,
            commitment: commitment.to_string(),
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        route: &str,
        body: serde_json::Value,
    ) -> Result<T, ChainError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, route))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ChainError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChainService for MetaplexGateway {
    async fn create_collection_machine(&self, items_available: u32) -> Result<String, ChainError> {
        let body: CreateMachineResponse = self
            .post(
                "candy-machines",
                json!({
                    "secret_key": self.secret_key,
                    "items_available": items_available,
                    "seller_fee_basis_points": self.settings.royalty_basis_points,
                    "symbol": self.settings.symbol,
                    "max_edition_supply": 0,
                    "is_mutable": true,
                    "collection_mint": self.settings.collection_mint,
                    "commitment": self.commitment,
                }),
            )
            .await?;
        Ok(body.candy_machine)
    }

    async fn insert_items(&self, machine_id: &str, uris: &[String]) -> Result<(), ChainError> {
        let items: Vec<_> = uris
            .iter()
            .enumerate()
            .map(|(i, uri)| json!({ "name": format!("Certificate #{}", i + 1), "uri": uri }))
            .collect();

        let _: serde_json::Value = self
            .post(
                &format!("candy-machines/{machine_id}/items"),
                json!({
                    "secret_key": self.secret_key,
                    "items": items,
                    "commitment": self.commitment,
                }),
            )
            .await?;
        Ok(())
    }

    async fn mint(&self, machine_id: &str) -> Result<String, ChainError> {
        let body: MintResponse = self
            .post(
                &format!("candy-machines/{machine_id}/mint"),
                json!({
                    "secret_key": self.secret_key,
                    "commitment": self.commitment,
                }),
            )
            .await?;
        Ok(body.nft_mint)
    }

    async fn transfer(&self, mint_address: &str, to_owner: &str) -> Result<String, ChainError> {
        let body: TransferResponse = self
            .post(
                &format!("nfts/{mint_address}/transfer"),
                json!({
                    "secret_key": self.secret_key,
                    "to_owner": to_owner,
                    "commitment": self.commitment,
                }),
            )
            .await?;
        Ok(body.signature)
    }
}

/// Public explorer link for a minted NFT.
pub fn explorer_address_url(mint_address: &str, cluster: &str) -> String {
    format!("{EXPLORER_URL}/address/{mint_address}?cluster={cluster}")
}

/// Public explorer link for a confirmed transaction.
pub fn explorer_tx_url(signature: &str, cluster: &str) -> String {
    format!("{EXPLORER_URL}/tx/{signature}?cluster={cluster}")
}

/// Recover the mint address from an explorer address link, the inverse of
/// [`explorer_address_url`]. The transfer stage re-derives the mint this way
/// from the link the mint stage wrote.
pub fn mint_address_from_link(link: &str) -> Option<&str> {
    let addr = link
        .split("/address/")
        .nth(1)?
        .split('?')
        .next()
        .unwrap_or("");
    if addr.is_empty() {
        None
    } else {
        Some(addr)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("HTTP request to chain gateway failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chain gateway returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> MetaplexGateway {
        MetaplexGateway::new(
            &server.uri(),
            "[1,2,3]",
            CollectionSettings {
                collection_mint: "ColMint111".to_string(),
                symbol: "CERT".to_string(),
                royalty_basis_points: 1000,
            },
            "finalized",
        )
    }

    #[test]
    fn explorer_links_round_trip() {
        let link = explorer_address_url("MintAddr999", "mainnet-beta");
        assert_eq!(
            link,
            "https://explorer.solana.com/address/MintAddr999?cluster=mainnet-beta"
        );
        assert_eq!(mint_address_from_link(&link), Some("MintAddr999"));
    }

    #[test]
    fn malformed_link_yields_none() {
        assert_eq!(mint_address_from_link("https://example.com/tx/abc"), None);
        assert_eq!(
            mint_address_from_link("https://explorer.solana.com/address/?cluster=x"),
            None
        );
    }

    #[tokio::test]
    async fn create_machine_sends_collection_settings() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/candy-machines"))
            .and(body_partial_json(serde_json::json!({
                "items_available": 3,
                "seller_fee_basis_points": 1000,
                "symbol": "CERT",
                "is_mutable": true,
                "collection_mint": "ColMint111",
                "commitment": "finalized",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "candy_machine": "Cm42" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let machine = gateway(&server).create_collection_machine(3).await.unwrap();
        assert_eq!(machine, "Cm42");
    }

    #[tokio::test]
    async fn insert_items_names_by_position() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/candy-machines/Cm42/items"))
            .and(body_partial_json(serde_json::json!({
                "items": [
                    { "name": "Certificate #1", "uri": "ipfs://a" },
                    { "name": "Certificate #2", "uri": "ipfs://b" },
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server)
            .insert_items("Cm42", &["ipfs://a".to_string(), "ipfs://b".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mint_returns_nft_address() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/candy-machines/Cm42/mint"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "nft_mint": "MintAddr999" })),
            )
            .mount(&server)
            .await;

        let mint = gateway(&server).mint("Cm42").await.unwrap();
        assert_eq!(mint, "MintAddr999");
    }

    #[tokio::test]
    async fn transfer_returns_signature() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/nfts/MintAddr999/transfer"))
            .and(body_partial_json(
                serde_json::json!({ "to_owner": "Wallet777" }),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "signature": "Sig123" })),
            )
            .mount(&server)
            .await;

        let sig = gateway(&server)
            .transfer("MintAddr999", "Wallet777")
            .await
            .unwrap();
        assert_eq!(sig, "Sig123");
    }

    #[tokio::test]
    async fn chain_rejection_surfaces_as_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("machine is empty"))
            .mount(&server)
            .await;

        let err = gateway(&server).mint("Cm42").await.unwrap_err();
        assert!(matches!(err, ChainError::Api { status: 500, .. }));
    }
}
