use crate::analytics::insights::InsightReport;
use crate::client::http::{HabitClient, HttpScoring};
use crate::client::identity::{IdentityStore, StoredIdentity};
use crate::config::ClientConfig;
use crate::domain::checkin::{CheckInEngine, CheckInError};

/// Everything the terminal client holds for one run.
pub struct AppContext {
    client: HabitClient,
    store: IdentityStore,
    identity: Option<StoredIdentity>,
    engine: CheckInEngine<HttpScoring>,
}

impl AppContext {
    pub fn new(client: HabitClient, store: IdentityStore) -> Self {
        let engine = CheckInEngine::new(HttpScoring::new(client.clone()));
        Self {
            client,
            store,
            identity: None,
            engine,
        }
    }

    /// Build the context and restore a previously saved identity.
    pub async fn init(config: &ClientConfig) -> anyhow::Result<Self> {
        let client = HabitClient::from_config(config)?;
        let mut ctx = Self::new(client, IdentityStore::new(&config.identity_path));
        ctx.restore_identity().await;
        tracing::info!("Client ready against {}", ctx.client.base_url());
        Ok(ctx)
    }

    /// Revalidate the saved identity with the server. Unknown ids are
    /// discarded; an unreachable server leaves this run signed out but keeps
    /// the record for next time.
    pub async fn restore_identity(&mut self) -> Option<&StoredIdentity> {
        let saved = self.store.load()?;
        match self.client.get_user(saved.user_id).await {
            Ok(user) => {
                self.set_identity(Some(StoredIdentity {
                    user_id: user.id,
                    username: user.username,
                }));
            }
            Err(CheckInError::IdentityNotFound(id)) => {
                tracing::info!("Saved identity {} is no longer known, signing out", id);
                if let Err(e) = self.store.clear() {
                    tracing::warn!("Failed to remove identity file: {:#}", e);
                }
                self.set_identity(None);
            }
            Err(e) => {
                tracing::warn!("Could not revalidate identity {}: {}", saved.user_id, e);
                self.set_identity(None);
            }
        }
        self.identity.as_ref()
    }

    fn set_identity(&mut self, identity: Option<StoredIdentity>) {
        self.engine.set_user(identity.as_ref().map(|i| i.user_id));
        self.identity = identity;
    }

    pub async fn sign_in(&mut self, username: &str) -> Result<&StoredIdentity, CheckInError> {
        let user = self.client.create_user(username.trim()).await?;
        let identity = StoredIdentity {
            user_id: user.id,
            username: user.username,
        };
        if let Err(e) = self.store.save(&identity) {
            tracing::warn!("Signed in but could not persist identity: {:#}", e);
        }
        tracing::info!("Signed in as {} (id {})", identity.username, identity.user_id);
        self.set_identity(Some(identity));
        self.identity.as_ref().ok_or(CheckInError::IdentityNotFound(user.id))
    }

    pub fn sign_out(&mut self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to remove identity file: {:#}", e);
        }
        self.set_identity(None);
    }

    pub fn identity(&self) -> Option<&StoredIdentity> {
        self.identity.as_ref()
    }

    pub fn engine(&mut self) -> &mut CheckInEngine<HttpScoring> {
        &mut self.engine
    }

    pub fn client(&self) -> &HabitClient {
        &self.client
    }

    /// Insight cards for the signed-in user; `None` when signed out.
    pub async fn insights(&self) -> Result<Option<InsightReport>, CheckInError> {
        match &self.identity {
            Some(identity) => self.client.insights(identity.user_id).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn shutdown(self) {
        if !self.engine.partial().is_empty() {
            tracing::debug!(
                "Discarding {} unsubmitted answers at shutdown",
                self.engine.partial().len()
            );
        }
        tracing::info!("Client shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::spawn;
    use crate::domain::models::User;
    use axum::{extract::Path, http::StatusCode, routing::get, routing::post, Json, Router};
    use chrono::Utc;
    use serde_json::Value;
    use std::time::Duration;

    async fn lookup(Path(id): Path<i64>) -> Result<Json<User>, StatusCode> {
        if id == 1 {
            Ok(Json(User {
                id,
                username: "ada".to_string(),
                created_at: Utc::now(),
            }))
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    async fn create(Json(body): Json<Value>) -> Json<User> {
        Json(User {
            id: 42,
            username: body["username"].as_str().unwrap_or_default().to_string(),
            created_at: Utc::now(),
        })
    }

    async fn fake_server() -> String {
        let app = Router::new()
            .route("/api/user", post(create))
            .route("/api/user/:id", get(lookup));
        spawn(app).await
    }

    fn saved(dir: &tempfile::TempDir, user_id: i64) -> IdentityStore {
        let store = IdentityStore::new(dir.path().join("identity.json"));
        store
            .save(&StoredIdentity {
                user_id,
                username: "someone".to_string(),
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_known_identity_is_restored() {
        let dir = tempfile::tempdir().unwrap();
        let client = HabitClient::new(&fake_server().await, Duration::from_secs(2)).unwrap();
        let mut ctx = AppContext::new(client, saved(&dir, 1));

        let identity = ctx.restore_identity().await.cloned().unwrap();
        assert_eq!(identity.username, "ada");
        assert_eq!(ctx.engine().user_id(), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_identity_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = saved(&dir, 99);
        let path = store.path().to_path_buf();
        let client = HabitClient::new(&fake_server().await, Duration::from_secs(2)).unwrap();
        let mut ctx = AppContext::new(client, store);

        assert!(ctx.restore_identity().await.is_none());
        assert!(ctx.engine().user_id().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreachable_server_keeps_identity_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = saved(&dir, 1);
        let path = store.path().to_path_buf();
        let client = HabitClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let mut ctx = AppContext::new(client, store);

        assert!(ctx.restore_identity().await.is_none());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::new(dir.path().join("identity.json"));
        let client = HabitClient::new(&fake_server().await, Duration::from_secs(2)).unwrap();
        let mut ctx = AppContext::new(client, store.clone());

        let identity = ctx.sign_in("  grace ").await.unwrap().clone();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.username, "grace");
        assert_eq!(store.load(), Some(identity));
        assert_eq!(ctx.engine().user_id(), Some(42));

        ctx.sign_out();
        assert!(ctx.identity().is_none());
        assert!(store.load().is_none());
        assert!(ctx.insights().await.unwrap().is_none());
    }
}
