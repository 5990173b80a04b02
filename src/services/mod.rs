//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;
pub mod sessions;
pub mod stats;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    repository::{HealthRepository, Repository},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub stats: stats::StatsService,
    pub sessions: sessions::SessionService,
    /// Database connectivity probe for readiness checks
    pub health: Arc<dyn HealthRepository>,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(
        repository: Repository,
        session_store: Arc<dyn sessions::SessionStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), config.catalog.clone()),
            loans: loans::LoansService::new(repository.clone(), config.catalog.loans_per_page),
            stats: stats::StatsService::new(repository.clone(), config.catalog.title_search_word.clone()),
            sessions: sessions::SessionService::new(session_store, config.session.clone()),
            health: repository.health,
        }
    }
}
