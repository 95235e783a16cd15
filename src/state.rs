use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::RwLock;

use crate::catalog::{CourseCatalog, SharedCatalog};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::events::PurchaseEvents;
use crate::payment::PaymentGateway;
use crate::services::{CategoryRegistry, ProgressTracker, PurchaseService, SessionContext};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub catalog: SharedCatalog,
    pub categories: Arc<RwLock<CategoryRegistry>>,
    pub session: Arc<SessionContext>,
    pub purchases: PurchaseService,
    pub progress: Arc<ProgressTracker>,
    pub events: PurchaseEvents,
}

impl AppState {
    pub async fn build(
        config: AppConfig,
        db: SqlitePool,
        catalog: CourseCatalog,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self, AppError> {
        let categories = CategoryRegistry::seed(&catalog.category_options());
        let catalog = catalog.into_shared();
        let session = SessionContext::init(db.clone()).await?;
        let events = PurchaseEvents::default();

        Ok(Self {
            purchases: PurchaseService::new(catalog.clone(), gateway, events.clone()),
            progress: Arc::new(ProgressTracker::new(catalog.clone())),
            categories: Arc::new(RwLock::new(categories)),
            session: Arc::new(session),
            config: Arc::new(config),
            catalog,
            events,
            db,
        })
    }
}
