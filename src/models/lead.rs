// src/models/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{gating::StageGroupTabs, validation::phone_number, Stage};

// O que sai do banco (Tabela leads)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,

    #[schema(ignore)]
    pub vendor_id: Uuid,

    #[schema(example = 1042)]
    pub lead_code: i64,

    #[schema(example = "Anita Sharma")]
    pub client_name: String,

    #[schema(example = "9876543210")]
    pub contact_no: String,

    pub email: Option<String>,

    #[schema(example = "Flat 702, Tower B, Baner, Pune")]
    pub site_address: String,

    #[schema(example = "Instagram")]
    pub source: Option<String>,

    #[schema(example = "3BHK")]
    pub property_type: Option<String>,

    // Texto livre no banco: o funil trata status desconhecido sem quebrar
    #[schema(example = "site-measurement-stage")]
    pub status: String,

    pub assigned_to: Option<Uuid>,

    pub usable_handover_ready: bool,
    pub actual_installation_start_date: Option<NaiveDate>,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn stage(&self) -> Option<Stage> {
        self.status.parse().ok()
    }

    pub fn installation_started(&self) -> bool {
        self.actual_installation_start_date.is_some()
    }
}

// Formulário "Detalhes do Lead" (criação e edição)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetailsPayload {
    #[validate(length(min = 2, message = "too_short"))]
    #[schema(example = "Anita Sharma")]
    pub client_name: String,

    #[validate(custom(function = "phone_number"))]
    #[schema(example = "9876543210")]
    pub contact_no: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "anita@email.com")]
    pub email: Option<String>,

    #[validate(length(min = 5, message = "too_short"))]
    #[schema(example = "Flat 702, Tower B, Baner, Pune")]
    pub site_address: String,

    pub source: Option<String>,
    pub property_type: Option<String>,

    // Só na criação; a troca de responsável tem rota própria
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignLeadPayload {
    pub user_id: Uuid,
}

// O destino é explícito: um clique duplo não avança duas etapas.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceStatusPayload {
    #[schema(example = "designing-stage")]
    pub to_status: Stage,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeadListQuery {
    /// Filtra pelo status atual
    pub status: Option<String>,
}

// Resposta do detalhe: o lead + abas liberadas para o usuário atual
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadView {
    #[serde(flatten)]
    pub lead: Lead,
    pub stage_tabs: Vec<StageGroupTabs>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub from_status: String,
    pub to_status: String,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
}
