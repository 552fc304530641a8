//! Board: the embedder-facing entry point.
//!
//! Wires the store, configuration and external collaborators into the
//! pipelines, and hands out per-card controllers.

use crate::config::BoardConfig;
use crate::controller::CardController;
use crate::dispatch::{self, Intercept, Payload};
use crate::error::ServiceError;
use crate::logging;
use crate::pipeline::Pipelines;
use crate::services::{
    DelimitedParser, Enhancer, HtmlFetcher, OpenAiEnhancer, RelayChain, ReqwestFetcher, WorkbookParser,
};
use crate::store::{CardStore, MemoryStore};
use crate::types::{Card, CardId};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Board<S: CardStore> {
    pipelines: Pipelines<S>,
}

impl<S: CardStore> Board<S> {
    pub fn new(
        store: Arc<S>,
        config: BoardConfig,
        parser: Arc<dyn WorkbookParser>,
        enhancer: Option<Arc<dyn Enhancer>>,
        fetcher: Arc<dyn HtmlFetcher>,
    ) -> Self {
        let config = config.normalized();
        let relays = RelayChain::from_config(fetcher, &config);
        let pipelines = Pipelines::new(store, Arc::new(config), parser, enhancer, relays);
        Self { pipelines }
    }

    pub fn store(&self) -> &Arc<S> {
        self.pipelines.store()
    }

    pub fn config(&self) -> &Arc<BoardConfig> {
        self.pipelines.config()
    }

    pub fn pipelines(&self) -> &Pipelines<S> {
        &self.pipelines
    }

    /// Offer a paste or drop payload. Must be called inside a Tokio runtime.
    pub fn dispatch(&self, payload: Payload) -> Intercept {
        dispatch::dispatch(&self.pipelines, payload)
    }

    /// Controller for `card_id`, if the card exists.
    pub fn controller(&self, card_id: &CardId) -> Option<CardController<S>> {
        self.store().contains(card_id).then(|| {
            CardController::new(self.store().clone(), self.config().clone(), card_id.clone())
        })
    }

    pub fn cards(&self) -> Vec<Card> {
        self.store().list()
    }

    pub fn remove(&self, card_id: &CardId) -> bool {
        self.store().remove(card_id)
    }
}

impl Board<MemoryStore> {
    /// Board backed by a [`MemoryStore`], configured from the user's config
    /// file and environment. Installs the `RUST_LOG` subscriber unless one is
    /// already set.
    ///
    /// A missing enhancement API key is not an error: enhancement is simply
    /// skipped.
    pub fn from_env(screen: (f32, f32)) -> anyhow::Result<Self> {
        logging::init();
        let config = BoardConfig::load();
        let fetcher = ReqwestFetcher::new(config.relay_timeout()).context("Failed to build HTTP client")?;

        let enhancer: Option<Arc<dyn Enhancer>> = match OpenAiEnhancer::from_env(&config.enhancer) {
            Ok(enhancer) => Some(Arc::new(enhancer)),
            Err(ServiceError::MissingApiKey { var }) => {
                info!(var, "no enhancement API key, enhancement disabled");
                None
            }
            Err(e) => {
                warn!(error = %e, "enhancement client unavailable");
                None
            }
        };

        let store = Arc::new(MemoryStore::with_screen(screen.0, screen.1));
        Ok(Self::new(
            store,
            config,
            Arc::new(DelimitedParser),
            enhancer,
            Arc::new(fetcher),
        ))
    }
}
