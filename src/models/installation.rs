// src/models/installation.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallationUpdate {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub update_date: NaiveDate,
    #[schema(example = "Módulos inferiores da cozinha instalados")]
    pub remark: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Instalador vinculado (JOIN com users para trazer o nome)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadInstaller {
    pub user_id: Uuid,
    #[schema(example = "Suresh Patil")]
    pub full_name: String,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallationView {
    // Falso => a tela mostra o estado "instalação não iniciada"
    pub started: bool,
    pub actual_installation_start_date: Option<NaiveDate>,
    pub usable_handover_ready: bool,
    pub installers: Vec<LeadInstaller>,
    pub updates: Vec<InstallationUpdate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartInstallationPayload {
    #[schema(example = "2024-10-01")]
    pub actual_installation_start_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallationUpdatePayload {
    pub update_date: NaiveDate,
    #[validate(length(min = 3, message = "too_short"))]
    pub remark: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignInstallersPayload {
    #[validate(length(min = 1, message = "required"))]
    pub installer_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandoverReadyPayload {
    pub ready: bool,
}
