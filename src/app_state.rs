use std::sync::Arc;

use crate::services::chain::ChainService;
use crate::services::email::Mailer;
use crate::services::pinning::ContentStore;
use crate::services::render::Renderer;
use crate::store::RecordStore;

/// Shared pipeline context handed to every stage job. All seams are trait
/// objects so tests can inject fakes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub pins: Arc<dyn ContentStore>,
    pub chain: Arc<dyn ChainService>,
    pub mailer: Arc<dyn Mailer>,
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        pins: Arc<dyn ContentStore>,
        chain: Arc<dyn ChainService>,
        mailer: Arc<dyn Mailer>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            store,
            pins,
            chain,
            mailer,
            renderer,
        }
    }
}
