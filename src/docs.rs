// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::domain;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register_vendor,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::create_user,
        handlers::users::list_users,

        // --- Leads ---
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::assign_lead,
        handlers::leads::advance_status,
        handlers::leads::status_history,

        // --- Stages ---
        handlers::leads::get_stage_details,
        handlers::leads::save_stage_details,

        // --- Documents ---
        handlers::documents::upload_documents,
        handlers::documents::list_documents,
        handlers::documents::download_file,

        // --- Payments ---
        handlers::payments::list_payments,

        // --- Installation ---
        handlers::installation::get_installation,
        handlers::installation::start_installation,
        handlers::installation::add_installation_update,
        handlers::installation::assign_installers,
        handlers::installation::set_handover_ready,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::Vendor,
            models::auth::RegisterVendorPayload,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::AuthResponse,

            // --- Pipeline ---
            domain::stages::Stage,
            domain::stages::StageGroup,
            domain::gating::StageTab,
            domain::gating::StageGroupTabs,

            // --- Leads ---
            models::lead::Lead,
            models::lead::LeadDetailsPayload,
            models::lead::AssignLeadPayload,
            models::lead::AdvanceStatusPayload,
            models::lead::LeadView,
            models::lead::StatusChange,

            // --- Formulários das etapas ---
            models::stages::StageDetail,
            models::stages::ChecklistItem,
            models::stages::PaymentInput,
            models::stages::SiteMeasurementForm,
            models::stages::DesigningForm,
            models::stages::BookingForm,
            models::stages::FinalMeasurementForm,
            models::stages::ClientDocumentationForm,
            models::stages::ClientApprovalForm,
            models::stages::TechCheckForm,
            models::stages::OrderLoginEntry,
            models::stages::OrderLoginForm,
            models::stages::ProductionForm,
            models::stages::ReadyToDispatchForm,
            models::stages::SiteReadinessForm,
            models::stages::DispatchPlanningForm,
            models::stages::DispatchForm,
            models::stages::FinalHandoverForm,

            // --- Documents ---
            models::document::DocTypeTag,
            models::document::FileKind,
            models::document::DocumentView,
            models::document::DocumentBuckets,

            // --- Payments ---
            models::payment::PaymentLog,
            models::payment::PaymentSummary,

            // --- Installation ---
            models::installation::InstallationUpdate,
            models::installation::LeadInstaller,
            models::installation::InstallationView,
            models::installation::StartInstallationPayload,
            models::installation::InstallationUpdatePayload,
            models::installation::AssignInstallersPayload,
            models::installation::HandoverReadyPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Registro da empresa e login"),
        (name = "Users", description = "Usuários da empresa"),
        (name = "Leads", description = "Leads, status e histórico"),
        (name = "Stages", description = "Formulários de cada etapa do pipeline"),
        (name = "Documents", description = "Upload e links assinados"),
        (name = "Payments", description = "Pagamentos lançados nas etapas"),
        (name = "Installation", description = "Instalação na obra e entrega")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
