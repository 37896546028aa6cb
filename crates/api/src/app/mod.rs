//! HTTP application wiring.
//!
//! - `pipeline.rs`: the audited, permission-checked request pipeline
//! - `routes/`: handlers, one file per resource with extra routes
//! - `errors.rs`: error taxonomy and `{"error": ...}` responses

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Extension, Router};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tracing::info;

use totes_auth::{Hs256JwtValidator, PermissionRegistry};
use totes_infra::{
    AppConfig, AuditLog, AuditLogWriter, InMemoryAuditLog, PolicyResolver, PostgresAuditLog, Services, StorageBackend,
};
use totes_infra::seed::{AdminAccount, seed};
use totes_infra::store::apply_schema;

use crate::middleware;

pub mod errors;
pub mod pipeline;
pub mod routes;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub audit: AuditLogWriter,
    pub policy: PolicyResolver,
    pub registry: Arc<PermissionRegistry>,
    pub jwt: Arc<Hs256JwtValidator>,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(
        services: Services,
        audit_log: Arc<dyn AuditLog>,
        registry: PermissionRegistry,
        jwt_secret: &str,
        token_ttl: chrono::Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            policy: PolicyResolver::new(services.clone()),
            services,
            audit: AuditLogWriter::new(audit_log),
            registry: Arc::new(registry),
            jwt: Arc::new(Hs256JwtValidator::new(jwt_secret)),
            token_ttl,
            bcrypt_cost,
        }
    }

    /// Connect the configured backend and seed reference data.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let registry = config.registry()?;

        let (services, audit_log): (Services, Arc<dyn AuditLog>) = match config.storage.backend {
            StorageBackend::Memory => {
                info!("using in-memory storage; data is lost on exit");
                (Services::in_memory(), Arc::new(InMemoryAuditLog::new()))
            }
            StorageBackend::Postgres => {
                let url = config
                    .storage
                    .database_url
                    .as_deref()
                    .context("storage.database_url is required for the postgres backend")?;
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connecting to postgres")?;
                apply_schema(&pool).await.context("applying schema")?;
                info!("connected to postgres");
                (Services::postgres(pool.clone()), Arc::new(PostgresAuditLog::new(pool)))
            }
        };

        let admin = match (&config.bootstrap.admin_email, &config.bootstrap.admin_password) {
            (Some(email), Some(password)) => Some(AdminAccount {
                email: email.clone(),
                password: password.clone(),
                bcrypt_cost: config.auth.bcrypt_cost,
            }),
            _ => None,
        };
        seed(&services, &registry, admin).await?;

        Ok(Self::new(
            services,
            audit_log,
            registry,
            &config.auth.jwt_secret,
            config.token_ttl(),
            config.auth.bcrypt_cost,
        ))
    }
}

/// Build the full HTTP router.
///
/// `/health` sits outside the auth middleware; everything else gets a
/// [`crate::context::RequestContext`] and runs through the pipeline.
pub fn build_app(state: AppState) -> Router {
    let auth_state = middleware::AuthState { jwt: state.jwt.clone() };

    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(state))
            .layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware)),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
