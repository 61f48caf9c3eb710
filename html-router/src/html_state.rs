use std::sync::Arc;

use common::create_template_engine;
use common::utils::config::AppConfig;
use common::utils::template_engine::{ProvidesTemplateEngine, TemplateEngine};
use ingestion_gateway::IngestionGateway;
use retrieval_gateway::{LookupGateway, QueryGateway};
use tracing::debug;

use crate::SessionStoreType;

#[derive(Clone)]
pub struct HtmlState {
    pub templates: Arc<TemplateEngine>,
    pub session_store: Arc<SessionStoreType>,
    pub ingestion: Arc<IngestionGateway>,
    pub queries: Arc<QueryGateway>,
    pub lookups: Arc<LookupGateway>,
    pub config: AppConfig,
}

impl HtmlState {
    /// Assemble the surface state. Passing `None` for the template engine
    /// builds the default one for this crate's template directory.
    pub fn new_with_resources(
        session_store: Arc<SessionStoreType>,
        ingestion: Arc<IngestionGateway>,
        queries: Arc<QueryGateway>,
        lookups: Arc<LookupGateway>,
        config: AppConfig,
        template_engine: Option<Arc<TemplateEngine>>,
    ) -> Self {
        let templates =
            template_engine.unwrap_or_else(|| Arc::new(create_template_engine!("templates")));
        debug!("Template engine configured for html_router.");

        Self {
            templates,
            session_store,
            ingestion,
            queries,
            lookups,
            config,
        }
    }
}

impl ProvidesTemplateEngine for HtmlState {
    fn template_engine(&self) -> &Arc<TemplateEngine> {
        &self.templates
    }
}
