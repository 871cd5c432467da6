//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::domain::{Credential, IdentityProvider, ServiceProvider};
use crate::middleware::ObservabilityLayer;
use crate::migration;
use crate::openapi::ApiDoc;
use crate::repository::{
    credential::CredentialRepositoryImpl, identity_provider::IdentityProviderRepositoryImpl,
    service_provider::ServiceProviderRepositoryImpl,
};
use crate::search::elasticsearch::{ElasticsearchClient, ElasticsearchSearchRepository};
use crate::search::Document;
use crate::service::{CredentialService, IdentityProviderService, ServiceProviderService};
use crate::state::HasServices;
use anyhow::Result;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa_swagger_ui::SwaggerUi;

type CredentialSearchImpl = ElasticsearchSearchRepository<Credential>;
type IdentityProviderSearchImpl = ElasticsearchSearchRepository<IdentityProvider>;
type ServiceProviderSearchImpl = ElasticsearchSearchRepository<ServiceProvider>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub search_client: ElasticsearchClient,
    pub credential_service: Arc<CredentialService<CredentialRepositoryImpl, CredentialSearchImpl>>,
    pub identity_provider_service:
        Arc<IdentityProviderService<IdentityProviderRepositoryImpl, IdentityProviderSearchImpl>>,
    pub service_provider_service:
        Arc<ServiceProviderService<ServiceProviderRepositoryImpl, ServiceProviderSearchImpl>>,
}

impl HasServices for AppState {
    type CredentialRepo = CredentialRepositoryImpl;
    type IdentityProviderRepo = IdentityProviderRepositoryImpl;
    type ServiceProviderRepo = ServiceProviderRepositoryImpl;
    type CredentialSearch = CredentialSearchImpl;
    type IdentityProviderSearch = IdentityProviderSearchImpl;
    type ServiceProviderSearch = ServiceProviderSearchImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn credential_service(
        &self,
    ) -> &CredentialService<Self::CredentialRepo, Self::CredentialSearch> {
        &self.credential_service
    }

    fn identity_provider_service(
        &self,
    ) -> &IdentityProviderService<Self::IdentityProviderRepo, Self::IdentityProviderSearch> {
        &self.identity_provider_service
    }

    fn service_provider_service(
        &self,
    ) -> &ServiceProviderService<Self::ServiceProviderRepo, Self::ServiceProviderSearch> {
        &self.service_provider_service
    }

    async fn check_ready(&self) -> (bool, bool) {
        let db_ok = sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok();
        let search_ok = self.search_client.ping().await.is_ok();
        (db_ok, search_ok)
    }
}

/// Run the server
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    if config.run_migrations {
        migration::run_migrations(&config).await?;
    }

    // Create database connection pool
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    let search_client = ElasticsearchClient::new(config.elasticsearch.clone())?;
    for index in [
        Credential::INDEX_NAME,
        IdentityProvider::INDEX_NAME,
        ServiceProvider::INDEX_NAME,
    ] {
        // The index is re-checked by /ready; writes fail with 502 until it is reachable
        if let Err(e) = search_client.ensure_index(index).await {
            warn!(index, error = %e, "Failed to ensure search index");
        }
    }

    // Create repositories
    let credential_repo = Arc::new(CredentialRepositoryImpl::new(db_pool.clone()));
    let identity_provider_repo = Arc::new(IdentityProviderRepositoryImpl::new(db_pool.clone()));
    let service_provider_repo = Arc::new(ServiceProviderRepositoryImpl::new(db_pool.clone()));

    // Create services
    let credential_service = Arc::new(CredentialService::new(
        credential_repo,
        Arc::new(ElasticsearchSearchRepository::new(search_client.clone())),
    ));
    let identity_provider_service = Arc::new(IdentityProviderService::new(
        identity_provider_repo,
        Arc::new(ElasticsearchSearchRepository::new(search_client.clone())),
    ));
    let service_provider_service = Arc::new(ServiceProviderService::new(
        service_provider_repo,
        Arc::new(ElasticsearchSearchRepository::new(search_client.clone())),
    ));

    let metrics_enabled = config.telemetry.metrics_enabled;
    let expose_docs = !config.is_production();
    let http_addr = config.http_addr();

    let state = AppState {
        config: Arc::new(config),
        db_pool,
        search_client,
        credential_service,
        identity_provider_service,
        service_provider_service,
    };

    let mut app = build_router(state).merge(
        Router::new()
            .route("/metrics", get(api::metrics::metrics_handler))
            .with_state(Arc::new(prometheus_handle)),
    );

    if expose_docs {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::build()));
    }

    if metrics_enabled {
        app = app.layer(ObservabilityLayer);
    }

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Build the HTTP router with generic state type
///
/// Works with both the production `AppState` and test implementations of
/// `HasServices`.
pub fn build_router<S: HasServices>(state: S) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // Credentials
        .route(
            "/api/credentials",
            get(api::credential::list::<S>).post(api::credential::create::<S>),
        )
        .route(
            "/api/credentials/{id}",
            get(api::credential::get::<S>)
                .put(api::credential::update::<S>)
                .patch(api::credential::partial_update::<S>)
                .delete(api::credential::delete::<S>),
        )
        .route(
            "/api/_search/credentials",
            get(api::credential::search::<S>),
        )
        // Identity providers
        .route(
            "/api/identity-providers",
            get(api::identity_provider::list::<S>).post(api::identity_provider::create::<S>),
        )
        .route(
            "/api/identity-providers/{id}",
            get(api::identity_provider::get::<S>)
                .put(api::identity_provider::update::<S>)
                .patch(api::identity_provider::partial_update::<S>)
                .delete(api::identity_provider::delete::<S>),
        )
        .route(
            "/api/_search/identity-providers",
            get(api::identity_provider::search::<S>),
        )
        // Service providers
        .route(
            "/api/service-providers",
            get(api::service_provider::list::<S>).post(api::service_provider::create::<S>),
        )
        .route(
            "/api/service-providers/{id}",
            get(api::service_provider::get::<S>)
                .put(api::service_provider::update::<S>)
                .patch(api::service_provider::partial_update::<S>)
                .delete(api::service_provider::delete::<S>),
        )
        .route(
            "/api/_search/service-providers",
            get(api::service_provider::search::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
