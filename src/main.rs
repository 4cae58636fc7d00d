//src/main.rs

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod domain;
mod handlers;
mod middleware;
mod models;
mod services;
mod storage;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug para ver o detalhe; padrão é info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bind_addr = app_state.config.bind_addr.clone();
    let max_upload_bytes = app_state.config.max_upload_bytes;

    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register-vendor", post(handlers::auth::register_vendor))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let lead_routes = Router::new()
        .route(
            "/",
            post(handlers::leads::create_lead).get(handlers::leads::list_leads),
        )
        .route(
            "/{id}",
            get(handlers::leads::get_lead).put(handlers::leads::update_lead),
        )
        .route("/{id}/assign", put(handlers::leads::assign_lead))
        .route("/{id}/advance", post(handlers::leads::advance_status))
        .route("/{id}/history", get(handlers::leads::status_history))
        // Formulários das etapas
        .route(
            "/{id}/stages/{stage}",
            get(handlers::leads::get_stage_details).put(handlers::leads::save_stage_details),
        )
        // Documentos
        .route(
            "/{id}/documents",
            post(handlers::documents::upload_documents).get(handlers::documents::list_documents),
        )
        .route("/{id}/payments", get(handlers::payments::list_payments))
        // Instalação
        .route("/{id}/installation", get(handlers::installation::get_installation))
        .route(
            "/{id}/installation/start",
            post(handlers::installation::start_installation),
        )
        .route(
            "/{id}/installation/updates",
            post(handlers::installation::add_installation_update),
        )
        .route(
            "/{id}/installation/installers",
            put(handlers::installation::assign_installers),
        )
        .route(
            "/{id}/installation/handover-ready",
            put(handlers::installation::set_handover_ready),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/leads", lead_routes)
        // Links assinados: sem JWT
        .route("/files/{*key}", get(handlers::documents::download_file))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
