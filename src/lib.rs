//! Status-driven NFT certificate pipeline.
//!
//! Certificate records live in an external Airtable-style store; their
//! `Certificate Status` field is the queue. Three stage jobs drive records
//! through the chain `Ready Sol → SPL Loaded → SPL Minted → Success`
//! (render + pin, mint, transfer + notify), and the orchestrator polls
//! status counts to drain each stage in order, forever.

pub mod app_state;
pub mod config;
pub mod jobs;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
