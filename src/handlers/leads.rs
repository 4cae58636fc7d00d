// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    domain::{gating::localize_tabs, Stage},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermCreateLead, PermReassignLead, RequirePrivilege},
    },
    models::{
        lead::{
            AdvanceStatusPayload, AssignLeadPayload, Lead, LeadDetailsPayload, LeadListQuery,
            LeadView, StatusChange,
        },
        stages::StageDetail,
    },
};

// =============================================================================
//  1. LEADS
// =============================================================================

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = LeadDetailsPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePrivilege<PermCreateLead>,
    Json(payload): Json<LeadDetailsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .create_lead(&mut *rls_conn, &user.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(LeadListQuery),
    responses(
        (status = 200, description = "Leads da empresa", body = Vec<Lead>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<LeadListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let leads = app_state
        .lead_service
        .list_leads(&mut *rls_conn, user.0.vendor_id, query.status.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(leads)))
}

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead com as abas liberadas", body = LeadView),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .get_lead(&mut *rls_conn, user.0.vendor_id, lead_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut view = app_state.lead_service.lead_view(lead, &user.0);
    localize_tabs(&mut view.stage_tabs, |key| {
        app_state.i18n_store.translate(&locale.0, key)
    });

    Ok((StatusCode::OK, Json(view)))
}

// PUT /api/leads/{id}
#[utoipa::path(
    put,
    path = "/api/leads/{id}",
    tag = "Leads",
    request_body = LeadDetailsPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Detalhes atualizados", body = Lead),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<LeadDetailsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .update_details(&mut *rls_conn, &user.0, lead_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// PUT /api/leads/{id}/assign
#[utoipa::path(
    put,
    path = "/api/leads/{id}/assign",
    tag = "Leads",
    request_body = AssignLeadPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead reatribuído", body = Lead),
        (status = 400, description = "Usuário de outra empresa"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePrivilege<PermReassignLead>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<AssignLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .reassign_lead(&mut *rls_conn, &user.0, lead_id, payload.user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// =============================================================================
//  2. STATUS
// =============================================================================

// POST /api/leads/{id}/advance
#[utoipa::path(
    post,
    path = "/api/leads/{id}/advance",
    tag = "Leads",
    request_body = AdvanceStatusPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Status avançado", body = Lead),
        (status = 403, description = "Sem permissão na etapa atual"),
        (status = 409, description = "Transição inválida ou etapa sem dados")
    ),
    security(("api_jwt" = []))
)]
pub async fn advance_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<AdvanceStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .lead_service
        .advance_status(&mut *rls_conn, &user.0, lead_id, payload.to_status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(lead)))
}

// GET /api/leads/{id}/history
#[utoipa::path(
    get,
    path = "/api/leads/{id}/history",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Histórico de status", body = Vec<StatusChange>)
    ),
    security(("api_jwt" = []))
)]
pub async fn status_history(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let history = app_state
        .lead_service
        .status_history(&mut *rls_conn, user.0.vendor_id, lead_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(history)))
}

// =============================================================================
//  3. DADOS DAS ETAPAS
// =============================================================================

// GET /api/leads/{id}/stages/{stage}
#[utoipa::path(
    get,
    path = "/api/leads/{id}/stages/{stage}",
    tag = "Stages",
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        ("stage" = String, Path, description = "Status da etapa, ex: booking-stage")
    ),
    responses(
        (status = 200, description = "Dados salvos da etapa (null se ainda não salvos)", body = Option<StageDetail>),
        (status = 409, description = "Etapa ainda não alcançada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stage_details(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((lead_id, stage)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let stage: Stage = stage
        .parse()
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .lead_service
        .get_stage_details(&mut *rls_conn, &user.0, lead_id, stage)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/leads/{id}/stages/{stage}
#[utoipa::path(
    put,
    path = "/api/leads/{id}/stages/{stage}",
    tag = "Stages",
    request_body(content = Value, description = "Formulário da etapa"),
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        ("stage" = String, Path, description = "Status da etapa, ex: booking-stage")
    ),
    responses(
        (status = 200, description = "Dados salvos", body = StageDetail),
        (status = 400, description = "Formulário inválido"),
        (status = 403, description = "Sem permissão na etapa")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_stage_details(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((lead_id, stage)): Path<(Uuid, String)>,
    Json(data): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let stage: Stage = stage
        .parse()
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .lead_service
        .save_stage_details(&mut *rls_conn, &user.0, lead_id, stage, data)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}
