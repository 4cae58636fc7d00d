// src/domain/stages.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- A ORDEM FIXA DO FUNIL ---
// A posição no array é o "índice" usado em toda a lógica de liberação de etapas.
// Serializa com o mesmo texto persistido em `leads.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Stage {
    #[serde(rename = "lead-details-stage")]
    LeadDetails,
    #[serde(rename = "site-measurement-stage")]
    SiteMeasurement,
    #[serde(rename = "designing-stage")]
    Designing,
    #[serde(rename = "booking-stage")]
    Booking,
    #[serde(rename = "final-measurement-stage")]
    FinalMeasurement,
    #[serde(rename = "client-documentation-stage")]
    ClientDocumentation,
    #[serde(rename = "client-approval-stage")]
    ClientApproval,
    #[serde(rename = "tech-check-stage")]
    TechCheck,
    #[serde(rename = "order-login-stage")]
    OrderLogin,
    #[serde(rename = "production-stage")]
    Production,
    #[serde(rename = "ready-to-dispatch-stage")]
    ReadyToDispatch,
    #[serde(rename = "site-readiness-stage")]
    SiteReadiness,
    #[serde(rename = "dispatch-planning-stage")]
    DispatchPlanning,
    #[serde(rename = "dispatch-stage")]
    Dispatch,
    #[serde(rename = "under-installation-stage")]
    UnderInstallation,
    #[serde(rename = "final-handover-stage")]
    FinalHandover,
}

// Agrupamento usado nas abas agrupadas da tela do lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StageGroup {
    Lead,
    Booking,
    Production,
    Installation,
}

impl StageGroup {
    pub const ALL: [StageGroup; 4] = [
        StageGroup::Lead,
        StageGroup::Booking,
        StageGroup::Production,
        StageGroup::Installation,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStage(pub String);

impl fmt::Display for UnknownStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "etapa desconhecida: '{}'", self.0)
    }
}

impl std::error::Error for UnknownStage {}

impl Stage {
    pub const ALL: [Stage; 16] = [
        Stage::LeadDetails,
        Stage::SiteMeasurement,
        Stage::Designing,
        Stage::Booking,
        Stage::FinalMeasurement,
        Stage::ClientDocumentation,
        Stage::ClientApproval,
        Stage::TechCheck,
        Stage::OrderLogin,
        Stage::Production,
        Stage::ReadyToDispatch,
        Stage::SiteReadiness,
        Stage::DispatchPlanning,
        Stage::Dispatch,
        Stage::UnderInstallation,
        Stage::FinalHandover,
    ];

    /// O valor persistido em `leads.status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::LeadDetails => "lead-details-stage",
            Stage::SiteMeasurement => "site-measurement-stage",
            Stage::Designing => "designing-stage",
            Stage::Booking => "booking-stage",
            Stage::FinalMeasurement => "final-measurement-stage",
            Stage::ClientDocumentation => "client-documentation-stage",
            Stage::ClientApproval => "client-approval-stage",
            Stage::TechCheck => "tech-check-stage",
            Stage::OrderLogin => "order-login-stage",
            Stage::Production => "production-stage",
            Stage::ReadyToDispatch => "ready-to-dispatch-stage",
            Stage::SiteReadiness => "site-readiness-stage",
            Stage::DispatchPlanning => "dispatch-planning-stage",
            Stage::Dispatch => "dispatch-stage",
            Stage::UnderInstallation => "under-installation-stage",
            Stage::FinalHandover => "final-handover-stage",
        }
    }

    pub fn index(&self) -> usize {
        // ALL é exaustivo, então a busca sempre encontra.
        Stage::ALL.iter().position(|s| s == self).unwrap_or_default()
    }

    pub fn next(&self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    pub fn group(&self) -> StageGroup {
        match self {
            Stage::LeadDetails | Stage::SiteMeasurement | Stage::Designing => StageGroup::Lead,
            Stage::Booking
            | Stage::FinalMeasurement
            | Stage::ClientDocumentation
            | Stage::ClientApproval => StageGroup::Booking,
            Stage::TechCheck | Stage::OrderLogin | Stage::Production | Stage::ReadyToDispatch => {
                StageGroup::Production
            }
            Stage::SiteReadiness
            | Stage::DispatchPlanning
            | Stage::Dispatch
            | Stage::UnderInstallation
            | Stage::FinalHandover => StageGroup::Installation,
        }
    }

    /// Chave de tradução do rótulo da aba
    pub fn label_key(&self) -> String {
        format!("stage.{}", self.as_str())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

/// O `indexOf` do status atual dentro da ordem fixa.
/// `None` quando o status não pertence ao funil.
pub fn stage_index(status: &str) -> Option<usize> {
    Stage::ALL.iter().position(|s| s.as_str() == status)
}
