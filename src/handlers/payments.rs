// src/handlers/payments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermViewPayments, RequirePrivilege},
    },
    models::payment::PaymentSummary,
};

// GET /api/leads/{id}/payments
#[utoipa::path(
    get,
    path = "/api/leads/{id}/payments",
    tag = "Payments",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Pagamentos lançados e total recebido", body = PaymentSummary),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePrivilege<PermViewPayments>,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .payment_service
        .list_payments(&mut *rls_conn, user.0.vendor_id, lead_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}
