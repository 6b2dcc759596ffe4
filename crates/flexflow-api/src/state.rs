//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over the repository traits; AppState pins them to the
//! SQLite implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flexflow_core::graph::service::GraphService;
use flexflow_core::routing::engine::RoutingEngine;
use flexflow_infra::config::load_global_config;
use flexflow_infra::data_dir::resolve_data_dir;
use flexflow_infra::sqlite::graph::SqliteGraphRepository;
use flexflow_infra::sqlite::history::SqliteHistoryRepository;
use flexflow_infra::sqlite::item::SqliteItemRepository;
use flexflow_infra::sqlite::pool::DatabasePool;
use flexflow_types::config::GlobalConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteGraphService = GraphService<SqliteGraphRepository>;

pub type ConcreteRoutingEngine =
    RoutingEngine<SqliteGraphRepository, SqliteItemRepository, SqliteHistoryRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub graph_service: Arc<ConcreteGraphService>,
    pub routing: Arc<ConcreteRoutingEngine>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load config, open the database and wire
    /// services.
    pub async fn init(data_dir: Option<&Path>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir(data_dir);
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::open(&data_dir).await?;

        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");
        Ok(Self::from_parts(db_pool, config, data_dir))
    }

    pub fn from_parts(db_pool: DatabasePool, config: GlobalConfig, data_dir: PathBuf) -> Self {
        let graph_service = GraphService::new(SqliteGraphRepository::new(db_pool.clone()));

        // One engine per process: the per-item locks live inside it.
        let routing = RoutingEngine::new(
            SqliteGraphRepository::new(db_pool.clone()),
            SqliteItemRepository::new(db_pool.clone()),
            SqliteHistoryRepository::new(db_pool),
        )
        .with_dead_end_policy(config.routing.dead_end_policy);

        Self {
            graph_service: Arc::new(graph_service),
            routing: Arc::new(routing),
            config: Arc::new(config),
            data_dir,
        }
    }
}
