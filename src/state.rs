use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;
use crate::user::{
    jwt::JwtKeys,
    repo::{PgUserStore, UserStore},
    services::AuthService,
};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
}

impl AppState {
    /// Connects to PostgreSQL, applies pending migrations and wires the
    /// service on top of the pool.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        migrate(&db).await?;

        let users = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;
        Self::from_parts(users, config)
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: &AppConfig) -> anyhow::Result<Self> {
        let keys = JwtKeys::from(&config.jwt);
        let auth = AuthService::new(users, keys, &config.auth)?;
        Ok(Self { auth })
    }
}

async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run database migrations")?;
    tracing::info!("database migrations applied");
    Ok(())
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
