// src/models/stages.rs

// Formulários de cada etapa do funil.
// Cada um é validado de forma declarativa e gravado como JSONB em `lead_stage_details`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    domain::{
        validation::{is_filled, not_blank, phone_number, positive_amount, require_together},
        Stage,
    },
};

// O que sai do banco
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageDetail {
    pub lead_id: Uuid,
    #[schema(example = "booking-stage")]
    pub stage: String,
    pub data: Value,
    pub updated_by: Uuid,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
//  BLOCOS REUTILIZADOS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Nível do piso conferido")]
    pub item: String,
    #[serde(default)]
    pub done: bool,
    pub remark: Option<String>,
}

/// Pagamento opcional dentro de um formulário.
/// Valor, detalhes e comprovante: ou todos, ou nenhum.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_payment_group"))]
pub struct PaymentInput {
    #[schema(example = "25000.00")]
    pub amount: Option<Decimal>,
    #[schema(example = "NEFT UTR 20240611")]
    pub payment_details: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub proof_document_id: Option<Uuid>,
}

impl PaymentInput {
    pub fn is_filled(&self) -> bool {
        self.amount.is_some()
            && is_filled(self.payment_details.as_deref())
            && self.proof_document_id.is_some()
    }
}

fn validate_payment_group(payment: &PaymentInput) -> Result<(), ValidationError> {
    require_together(&[
        ("amount", payment.amount.is_some()),
        ("paymentDetails", is_filled(payment.payment_details.as_deref())),
        ("proofDocumentId", payment.proof_document_id.is_some()),
    ])?;

    if let Some(amount) = &payment.amount {
        positive_amount(amount)?;
    }
    Ok(())
}

// Campo obrigatório só quando o irmão indica reprovação
fn required_when_rejected(accepted: bool, remark: Option<&str>) -> Result<(), ValidationError> {
    if !accepted && !is_filled(remark) {
        let mut err = ValidationError::new("required_if_rejected");
        err.message = Some("required_if_rejected".into());
        return Err(err);
    }
    Ok(())
}

// =============================================================================
//  FORMULÁRIOS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteMeasurementForm {
    pub measurement_date: NaiveDate,
    #[validate(length(min = 1, message = "required"), nested)]
    pub checklist: Vec<ChecklistItem>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesigningForm {
    pub design_meeting_date: Option<NaiveDate>,
    #[validate(length(min = 5, message = "too_short"))]
    #[schema(example = "Cozinha em L com ilha, acabamento laca fosca")]
    pub design_remarks: String,
    #[validate(range(max = 20, message = "out_of_range"))]
    pub revision_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    #[validate(custom(function = "positive_amount"))]
    #[schema(example = "450000.00")]
    pub final_quotation_amount: Decimal,
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(nested)]
    pub payment: PaymentInput,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalMeasurementForm {
    pub measurement_date: NaiveDate,
    #[validate(length(min = 5, message = "too_short"))]
    pub critical_discussion_notes: String,
    #[serde(default)]
    #[validate(nested)]
    pub checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDocumentationForm {
    #[validate(length(max = 2000, message = "too_long"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_client_approval"))]
pub struct ClientApprovalForm {
    pub approved: bool,
    pub approval_remark: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub payment: PaymentInput,
}

fn validate_client_approval(form: &ClientApprovalForm) -> Result<(), ValidationError> {
    required_when_rejected(form.approved, form.approval_remark.as_deref())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TechCheckForm {
    #[validate(length(min = 1, message = "required"), nested)]
    pub checklist: Vec<ChecklistItem>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLoginEntry {
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Hettich")]
    pub supplier: String,
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "PO-2024-0117")]
    pub order_number: String,
    pub po_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLoginForm {
    #[validate(length(min = 1, message = "required"), nested)]
    pub orders: Vec<OrderLoginEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionForm {
    pub expected_completion_date: NaiveDate,
    #[validate(range(max = 100, message = "out_of_range"))]
    pub progress_percent: Option<u8>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_ready_to_dispatch"))]
pub struct ReadyToDispatchForm {
    pub qc_passed: bool,
    pub qc_notes: Option<String>,
    #[validate(range(min = 1, message = "out_of_range"))]
    pub package_count: Option<u32>,
    #[serde(default)]
    #[validate(nested)]
    pub payment: PaymentInput,
}

fn validate_ready_to_dispatch(form: &ReadyToDispatchForm) -> Result<(), ValidationError> {
    required_when_rejected(form.qc_passed, form.qc_notes.as_deref())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteReadinessForm {
    #[validate(length(min = 1, message = "required"), nested)]
    pub checklist: Vec<ChecklistItem>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_dispatch_planning"))]
pub struct DispatchPlanningForm {
    pub planned_dispatch_date: NaiveDate,
    pub required_installation_date: Option<NaiveDate>,
    pub vehicle_type: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub payment: PaymentInput,
}

fn validate_dispatch_planning(form: &DispatchPlanningForm) -> Result<(), ValidationError> {
    match form.required_installation_date {
        Some(install) if install < form.planned_dispatch_date => {
            let mut err = ValidationError::new("installation_before_dispatch");
            err.message = Some("installation_before_dispatch".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchForm {
    pub dispatch_date: NaiveDate,
    #[validate(length(min = 4, max = 15, message = "invalid_vehicle_no"))]
    #[schema(example = "MH12AB1234")]
    pub vehicle_no: String,
    #[validate(custom(function = "not_blank"))]
    pub driver_name: String,
    #[validate(custom(function = "phone_number"))]
    #[schema(example = "9876543210")]
    pub driver_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalHandoverForm {
    pub handover_date: NaiveDate,
    pub client_feedback: Option<String>,
    #[validate(range(min = 1, max = 5, message = "out_of_range"))]
    pub rating: Option<u8>,
    pub remarks: Option<String>,
}

// =============================================================================
//  DESPACHO POR ETAPA
// =============================================================================

#[derive(Debug, Clone)]
pub enum StageForm {
    SiteMeasurement(SiteMeasurementForm),
    Designing(DesigningForm),
    Booking(BookingForm),
    FinalMeasurement(FinalMeasurementForm),
    ClientDocumentation(ClientDocumentationForm),
    ClientApproval(ClientApprovalForm),
    TechCheck(TechCheckForm),
    OrderLogin(OrderLoginForm),
    Production(ProductionForm),
    ReadyToDispatch(ReadyToDispatchForm),
    SiteReadiness(SiteReadinessForm),
    DispatchPlanning(DispatchPlanningForm),
    Dispatch(DispatchForm),
    FinalHandover(FinalHandoverForm),
}

fn from_json<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, AppError> {
    serde_json::from_value(data).map_err(|e| AppError::InvalidPayload(e.to_string()))
}

impl StageForm {
    /// Interpreta o corpo JSON de acordo com a etapa.
    /// Detalhes do lead e instalação têm operações próprias e não passam por aqui.
    pub fn parse(stage: Stage, data: Value) -> Result<Self, AppError> {
        let form = match stage {
            Stage::LeadDetails | Stage::UnderInstallation => {
                return Err(AppError::StageHasDedicatedOperations(stage));
            }
            Stage::SiteMeasurement => StageForm::SiteMeasurement(from_json(data)?),
            Stage::Designing => StageForm::Designing(from_json(data)?),
            Stage::Booking => StageForm::Booking(from_json(data)?),
            Stage::FinalMeasurement => StageForm::FinalMeasurement(from_json(data)?),
            Stage::ClientDocumentation => StageForm::ClientDocumentation(from_json(data)?),
            Stage::ClientApproval => StageForm::ClientApproval(from_json(data)?),
            Stage::TechCheck => StageForm::TechCheck(from_json(data)?),
            Stage::OrderLogin => StageForm::OrderLogin(from_json(data)?),
            Stage::Production => StageForm::Production(from_json(data)?),
            Stage::ReadyToDispatch => StageForm::ReadyToDispatch(from_json(data)?),
            Stage::SiteReadiness => StageForm::SiteReadiness(from_json(data)?),
            Stage::DispatchPlanning => StageForm::DispatchPlanning(from_json(data)?),
            Stage::Dispatch => StageForm::Dispatch(from_json(data)?),
            Stage::FinalHandover => StageForm::FinalHandover(from_json(data)?),
        };
        Ok(form)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            StageForm::SiteMeasurement(f) => f.validate(),
            StageForm::Designing(f) => f.validate(),
            StageForm::Booking(f) => f.validate(),
            StageForm::FinalMeasurement(f) => f.validate(),
            StageForm::ClientDocumentation(f) => f.validate(),
            StageForm::ClientApproval(f) => f.validate(),
            StageForm::TechCheck(f) => f.validate(),
            StageForm::OrderLogin(f) => f.validate(),
            StageForm::Production(f) => f.validate(),
            StageForm::ReadyToDispatch(f) => f.validate(),
            StageForm::SiteReadiness(f) => f.validate(),
            StageForm::DispatchPlanning(f) => f.validate(),
            StageForm::Dispatch(f) => f.validate(),
            StageForm::FinalHandover(f) => f.validate(),
        }
    }

    /// O pagamento embutido, somente quando o grupo está completo.
    pub fn payment(&self) -> Option<&PaymentInput> {
        let payment = match self {
            StageForm::Booking(f) => &f.payment,
            StageForm::ClientApproval(f) => &f.payment,
            StageForm::ReadyToDispatch(f) => &f.payment,
            StageForm::DispatchPlanning(f) => &f.payment,
            _ => return None,
        };
        payment.is_filled().then_some(payment)
    }

    pub fn to_value(&self) -> Value {
        let value = match self {
            StageForm::SiteMeasurement(f) => serde_json::to_value(f),
            StageForm::Designing(f) => serde_json::to_value(f),
            StageForm::Booking(f) => serde_json::to_value(f),
            StageForm::FinalMeasurement(f) => serde_json::to_value(f),
            StageForm::ClientDocumentation(f) => serde_json::to_value(f),
            StageForm::ClientApproval(f) => serde_json::to_value(f),
            StageForm::TechCheck(f) => serde_json::to_value(f),
            StageForm::OrderLogin(f) => serde_json::to_value(f),
            StageForm::Production(f) => serde_json::to_value(f),
            StageForm::ReadyToDispatch(f) => serde_json::to_value(f),
            StageForm::SiteReadiness(f) => serde_json::to_value(f),
            StageForm::DispatchPlanning(f) => serde_json::to_value(f),
            StageForm::Dispatch(f) => serde_json::to_value(f),
            StageForm::FinalHandover(f) => serde_json::to_value(f),
        };
        // Structs simples sempre serializam
        value.unwrap_or_else(|_| json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(payment: Value) -> Value {
        json!({
            "finalQuotationAmount": 450000,
            "expectedDeliveryDate": "2024-08-01",
            "payment": payment,
        })
    }

    #[test]
    fn booking_payment_group_all_or_nothing() {
        let proof = Uuid::new_v4();

        let empty = StageForm::parse(Stage::Booking, booking(json!({}))).unwrap();
        assert!(empty.validate().is_ok());
        assert!(empty.payment().is_none());

        let full = StageForm::parse(
            Stage::Booking,
            booking(json!({"amount": 50000, "paymentDetails": "UPI ref 88", "proofDocumentId": proof})),
        )
        .unwrap();
        assert!(full.validate().is_ok());
        assert!(full.payment().is_some());

        let partials = [
            json!({"amount": 50000}),
            json!({"paymentDetails": "UPI ref 88"}),
            json!({"proofDocumentId": proof}),
            json!({"amount": 50000, "paymentDetails": "UPI ref 88"}),
            json!({"amount": 50000, "proofDocumentId": proof}),
            json!({"paymentDetails": "UPI ref 88", "proofDocumentId": proof}),
        ];
        for partial in partials {
            let form = StageForm::parse(Stage::Booking, booking(partial.clone())).unwrap();
            let errors = form.validate().unwrap_err();
            assert!(
                errors.errors().contains_key("payment"),
                "parcial aceito: {partial}"
            );
        }
    }

    #[test]
    fn booking_requires_positive_quotation() {
        let form = StageForm::parse(
            Stage::Booking,
            json!({"finalQuotationAmount": 0}),
        )
        .unwrap();
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("final_quotation_amount"));
    }

    #[test]
    fn client_rejection_needs_remark() {
        let rejected = StageForm::parse(Stage::ClientApproval, json!({"approved": false})).unwrap();
        assert!(rejected.validate().is_err());

        let explained = StageForm::parse(
            Stage::ClientApproval,
            json!({"approved": false, "approvalRemark": "Cliente quer trocar o acabamento"}),
        )
        .unwrap();
        assert!(explained.validate().is_ok());

        let approved = StageForm::parse(Stage::ClientApproval, json!({"approved": true})).unwrap();
        assert!(approved.validate().is_ok());
    }

    #[test]
    fn dispatch_planning_rejects_installation_before_dispatch() {
        let form = StageForm::parse(
            Stage::DispatchPlanning,
            json!({"plannedDispatchDate": "2024-09-10", "requiredInstallationDate": "2024-09-01"}),
        )
        .unwrap();
        assert!(form.validate().is_err());

        let form = StageForm::parse(
            Stage::DispatchPlanning,
            json!({"plannedDispatchDate": "2024-09-10", "requiredInstallationDate": "2024-09-12"}),
        )
        .unwrap();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn checklists_and_nested_entries_are_validated() {
        let empty = StageForm::parse(
            Stage::SiteMeasurement,
            json!({"measurementDate": "2024-05-02", "checklist": []}),
        )
        .unwrap();
        assert!(empty.validate().is_err());

        let blank_item = StageForm::parse(
            Stage::TechCheck,
            json!({"checklist": [{"item": "  ", "done": true}]}),
        )
        .unwrap();
        assert!(blank_item.validate().is_err());

        let orders = StageForm::parse(
            Stage::OrderLogin,
            json!({"orders": [{"supplier": "Hettich", "orderNumber": ""}]}),
        )
        .unwrap();
        assert!(orders.validate().is_err());
    }

    #[test]
    fn dispatch_checks_vehicle_and_phone() {
        let form = StageForm::parse(
            Stage::Dispatch,
            json!({
                "dispatchDate": "2024-09-10",
                "vehicleNo": "MH12AB1234",
                "driverName": "Ramesh",
                "driverPhone": "98765"
            }),
        )
        .unwrap();
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("driver_phone"));
    }

    #[test]
    fn dedicated_stages_are_not_forms() {
        assert!(matches!(
            StageForm::parse(Stage::UnderInstallation, json!({})),
            Err(AppError::StageHasDedicatedOperations(Stage::UnderInstallation))
        ));
        assert!(matches!(
            StageForm::parse(Stage::LeadDetails, json!({})),
            Err(AppError::StageHasDedicatedOperations(Stage::LeadDetails))
        ));
    }

    #[test]
    fn malformed_body_is_invalid_payload() {
        let result = StageForm::parse(Stage::Production, json!({"expectedCompletionDate": "amanhã"}));
        assert!(matches!(result, Err(AppError::InvalidPayload(_))));
    }

    #[test]
    fn stored_value_keeps_camel_case() {
        let form = StageForm::parse(
            Stage::Production,
            json!({"expectedCompletionDate": "2024-07-15", "progressPercent": 40}),
        )
        .unwrap();
        let value = form.to_value();
        assert_eq!(value["expectedCompletionDate"], "2024-07-15");
        assert_eq!(value["progressPercent"], 40);
    }
}
