use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{LoginRequest, User};
use crate::validation::validate_login;

/// Storage key of the logged-in user.
pub const SESSION_KEY: &str = "learnhub_user";

const DEMO_EMAIL: &str = "demo@example.com";
const DEFAULT_AVATAR: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=150&h=150&fit=crop&crop=face";

/// Who is logged in. Presence of a user is the whole authentication model:
/// any credentials are accepted.
pub struct SessionContext {
    db: SqlitePool,
    user: RwLock<Option<User>>,
}

impl SessionContext {
    /// Restores the stored user, discarding a value that does not parse.
    pub async fn init(db: SqlitePool) -> Result<Self, AppError> {
        let user = match repository::fetch_value(&db, SESSION_KEY).await? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    info!("Restored session for {}", user.email);
                    Some(user)
                }
                Err(e) => {
                    warn!("Discarding unreadable stored session: {}", e);
                    repository::delete_value(&db, SESSION_KEY).await?;
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            db,
            user: RwLock::new(user),
        })
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<User, AppError> {
        validate_login(&req.email, &req.password)?;

        let email = req.email.trim().to_string();
        let name = if email == DEMO_EMAIL {
            "Demo User".to_string()
        } else {
            email.split('@').next().unwrap_or_default().to_string()
        };
        let user = User {
            id: "1".to_string(),
            name,
            email,
            avatar: DEFAULT_AVATAR.to_string(),
        };

        let raw = serde_json::to_string(&user)?;
        repository::upsert_value(&self.db, SESSION_KEY, &raw).await?;
        *self.user.write().await = Some(user.clone());
        info!("Logged in as {}", user.email);
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        repository::delete_value(&self.db, SESSION_KEY).await?;
        if let Some(user) = self.user.write().await.take() {
            info!("Logged out {}", user.email);
        }
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn require_user(&self) -> Result<User, AppError> {
        self.current_user().await.ok_or(AppError::Unauthorized)
    }
}
