// src/handlers/installation.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermAssignInstallers, RequirePrivilege},
    },
    models::{
        installation::{
            AssignInstallersPayload, HandoverReadyPayload, InstallationUpdate,
            InstallationUpdatePayload, InstallationView, StartInstallationPayload,
        },
        lead::Lead,
    },
};

// GET /api/leads/{id}/installation
#[utoipa::path(
    get,
    path = "/api/leads/{id}/installation",
    tag = "Installation",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Situação da instalação", body = InstallationView)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_installation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let view = app_state
        .installation_service
        .view(&mut *rls_conn, user.0.vendor_id, lead_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(view)))
}

// POST /api/leads/{id}/installation/start
#[utoipa::path(
    post,
    path = "/api/leads/{id}/installation/start",
    tag = "Installation",
    request_body = StartInstallationPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Instalação iniciada", body = Lead),
        (status = 409, description = "Já iniciada ou etapa não alcançada")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_installation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<StartInstallationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .installation_service
        .start_installation(&mut *rls_conn, &user.0, lead_id, payload.actual_installation_start_date)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// POST /api/leads/{id}/installation/updates
#[utoipa::path(
    post,
    path = "/api/leads/{id}/installation/updates",
    tag = "Installation",
    request_body = InstallationUpdatePayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 201, description = "Atualização registrada", body = InstallationUpdate),
        (status = 409, description = "Instalação não iniciada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_installation_update(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<InstallationUpdatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let update = app_state
        .installation_service
        .add_update(&mut *rls_conn, &user.0, lead_id, payload.update_date, &payload.remark)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(update)))
}

// PUT /api/leads/{id}/installation/installers
#[utoipa::path(
    put,
    path = "/api/leads/{id}/installation/installers",
    tag = "Installation",
    request_body = AssignInstallersPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Equipe definida", body = InstallationView),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_installers(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePrivilege<PermAssignInstallers>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<AssignInstallersPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let view = app_state
        .installation_service
        .assign_installers(&mut *rls_conn, &user.0, lead_id, &payload.installer_ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(view)))
}

// PUT /api/leads/{id}/installation/handover-ready
#[utoipa::path(
    put,
    path = "/api/leads/{id}/installation/handover-ready",
    tag = "Installation",
    request_body = HandoverReadyPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Obra marcada (ou desmarcada) como pronta", body = Lead),
        (status = 409, description = "Instalação não iniciada")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_handover_ready(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<HandoverReadyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .installation_service
        .set_handover_ready(&mut *rls_conn, &user.0, lead_id, payload.ready)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}
