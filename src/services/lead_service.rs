// src/services/lead_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DocumentRepository, LeadRepository, PaymentRepository, UserRepository},
    domain::{
        gating::{build_tabs, is_stage_reached},
        privileges::{can_act_on_stage, privilege_name},
        Stage,
    },
    models::{
        auth::User,
        document::LeadDocument,
        lead::{Lead, LeadDetailsPayload, LeadView, StatusChange},
        stages::{StageDetail, StageForm},
    },
};

// =============================================================================
//  REGRAS PURAS (sem banco)
// =============================================================================

/// A etapa está liberada para leitura? Entrega final também abre durante a
/// instalação, assim que a obra é marcada como pronta.
pub(crate) fn stage_visible(lead: &Lead, stage: Stage) -> bool {
    is_stage_reached(stage, &lead.status)
        || (stage == Stage::FinalHandover
            && lead.status == Stage::UnderInstallation.as_str()
            && lead.usable_handover_ready)
}

/// Etapa alcançada + privilégio da etapa para o status atual.
pub(crate) fn ensure_can_act(lead: &Lead, stage: Stage, user_type: Option<&str>) -> Result<(), AppError> {
    if !stage_visible(lead, stage) {
        return Err(AppError::StageNotReached(stage));
    }
    if !can_act_on_stage(stage, user_type, Some(&lead.status)) {
        return Err(AppError::PermissionDenied(privilege_name(stage)));
    }
    Ok(())
}

/// Valida um avanço de status e devolve a etapa atual.
/// Só o próximo passo é aceito; pular ou voltar é transição inválida.
pub(crate) fn check_advance(lead: &Lead, to: Stage, user_type: Option<&str>) -> Result<Stage, AppError> {
    let current = lead
        .stage()
        .ok_or_else(|| AppError::UnknownStatus(lead.status.clone()))?;

    if current.next() != Some(to) {
        return Err(AppError::InvalidTransition {
            from: current.to_string(),
            to: to.to_string(),
        });
    }

    if !can_act_on_stage(current, user_type, Some(&lead.status)) {
        return Err(AppError::PermissionDenied(privilege_name(current)));
    }

    if current == Stage::UnderInstallation && !lead.usable_handover_ready {
        return Err(AppError::HandoverNotReady);
    }

    Ok(current)
}

/// Etapas cujo formulário precisa estar salvo antes de avançar.
pub(crate) fn requires_saved_details(stage: Stage) -> bool {
    !matches!(stage, Stage::LeadDetails | Stage::UnderInstallation)
}

pub(crate) fn ensure_details_saved(current: Stage, saved: bool) -> Result<(), AppError> {
    if requires_saved_details(current) && !saved {
        return Err(AppError::StageDetailsMissing(current));
    }
    Ok(())
}

/// Lançamento gerado ao salvar um formulário com o grupo de pagamento completo.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PaymentEntry {
    pub amount: Decimal,
    pub details: String,
    pub payment_date: NaiveDate,
    pub proof_document_id: Uuid,
}

pub(crate) fn payment_entry(form: &StageForm, today: NaiveDate) -> Option<PaymentEntry> {
    let payment = form.payment()?;
    Some(PaymentEntry {
        amount: payment.amount?,
        details: payment.payment_details.clone()?,
        payment_date: payment.payment_date.unwrap_or(today),
        proof_document_id: payment.proof_document_id?,
    })
}

/// O comprovante tem que ser um documento do próprio lead.
pub(crate) fn ensure_proof_on_lead(
    proof_id: Uuid,
    proof: Option<&LeadDocument>,
    lead_id: Uuid,
) -> Result<(), AppError> {
    match proof {
        Some(doc) if doc.lead_id == lead_id => Ok(()),
        _ => Err(AppError::DocumentNotFound(proof_id)),
    }
}

// =============================================================================
//  SERVICE
// =============================================================================

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
    user_repo: UserRepository,
    payment_repo: PaymentRepository,
    document_repo: DocumentRepository,
}

impl LeadService {
    pub fn new(
        repo: LeadRepository,
        user_repo: UserRepository,
        payment_repo: PaymentRepository,
        document_repo: DocumentRepository,
    ) -> Self {
        Self { repo, user_repo, payment_repo, document_repo }
    }

    pub async fn get_lead<'e, E>(&self, executor: E, vendor_id: Uuid, lead_id: Uuid) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_lead(executor, vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))
    }

    /// O lead com as abas calculadas para quem está pedindo.
    pub fn lead_view(&self, lead: Lead, user: &User) -> LeadView {
        let stage_tabs = build_tabs(&lead.status, user.user_type(), lead.usable_handover_ready);
        LeadView { lead, stage_tabs }
    }

    // --- LEADS ---

    pub async fn create_lead<'e, E>(
        &self,
        executor: E,
        actor: &User,
        payload: &LeadDetailsPayload,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Sem responsável informado, o lead fica com quem criou
        let mut payload = payload.clone();
        let assignee = payload.assigned_to.unwrap_or(actor.id);
        self.user_repo
            .find_active_in_vendor(&mut *tx, actor.vendor_id, assignee)
            .await?
            .ok_or(AppError::InvalidAssignee(assignee))?;
        payload.assigned_to = Some(assignee);

        let lead = self
            .repo
            .create_lead(&mut *tx, actor.vendor_id, actor.id, &payload)
            .await?;

        tx.commit().await?;

        tracing::info!("📋 Lead #{} criado por {}", lead.lead_code, actor.email);
        Ok(lead)
    }

    pub async fn list_leads<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Filtro com status fora do funil é erro do cliente, não lista vazia
        if let Some(status) = status {
            status.parse::<Stage>()?;
        }
        self.repo.list_leads(executor, vendor_id, status).await
    }

    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        payload: &LeadDetailsPayload,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let lead = self
            .repo
            .find_lead_for_update(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        ensure_can_act(&lead, Stage::LeadDetails, actor.user_type())?;

        let updated = self
            .repo
            .update_details(&mut *tx, actor.vendor_id, lead_id, payload)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn reassign_lead<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        assignee: Uuid,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.user_repo
            .find_active_in_vendor(&mut *tx, actor.vendor_id, assignee)
            .await?
            .ok_or(AppError::InvalidAssignee(assignee))?;

        let lead = self
            .repo
            .update_assignee(&mut *tx, actor.vendor_id, lead_id, assignee)
            .await?;

        tx.commit().await?;

        tracing::info!("🔁 Lead #{} reatribuído para {}", lead.lead_code, assignee);
        Ok(lead)
    }

    // --- DADOS DAS ETAPAS ---

    pub async fn get_stage_details<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        stage: Stage,
    ) -> Result<Option<StageDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !requires_saved_details(stage) {
            return Err(AppError::StageHasDedicatedOperations(stage));
        }

        // Leitura dentro de transação, como nas escritas
        let mut tx = executor.begin().await?;

        let lead = self
            .repo
            .find_lead(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        if !stage_visible(&lead, stage) {
            return Err(AppError::StageNotReached(stage));
        }

        let detail = self
            .repo
            .find_stage_detail(&mut *tx, lead_id, stage.as_str())
            .await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Valida e grava o formulário da etapa. Um pagamento completo no
    /// formulário vira lançamento na mesma transação.
    pub async fn save_stage_details<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        stage: Stage,
        data: Value,
    ) -> Result<StageDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let form = StageForm::parse(stage, data)?;

        let mut tx = executor.begin().await?;

        let lead = self
            .repo
            .find_lead_for_update(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        ensure_can_act(&lead, stage, actor.user_type())?;
        form.validate()?;

        let detail = self
            .repo
            .upsert_stage_detail(&mut *tx, lead_id, stage.as_str(), &form.to_value(), actor.id)
            .await?;

        if let Some(entry) = payment_entry(&form, Utc::now().date_naive()) {
            let proof = self
                .document_repo
                .find_document(&mut *tx, actor.vendor_id, entry.proof_document_id)
                .await?;
            ensure_proof_on_lead(entry.proof_document_id, proof.as_ref(), lead_id)?;

            let log = self
                .payment_repo
                .insert_payment(
                    &mut *tx,
                    actor.vendor_id,
                    lead_id,
                    stage.as_str(),
                    entry.amount,
                    &entry.details,
                    entry.payment_date,
                    Some(entry.proof_document_id),
                    actor.id,
                )
                .await?;
            tracing::info!("💰 Pagamento de {} registrado na etapa {}", log.amount, stage);
        }

        tx.commit().await?;
        Ok(detail)
    }

    // --- STATUS ---

    pub async fn advance_status<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        to: Stage,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // FOR UPDATE: dois avanços simultâneos não pulam etapa
        let lead = self
            .repo
            .find_lead_for_update(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        let current = check_advance(&lead, to, actor.user_type())?;

        let saved = !requires_saved_details(current)
            || self
                .repo
                .find_stage_detail(&mut *tx, lead_id, current.as_str())
                .await?
                .is_some();
        ensure_details_saved(current, saved)?;

        let updated = self
            .repo
            .update_status(&mut *tx, actor.vendor_id, lead_id, to.as_str())
            .await?;
        self.repo
            .insert_status_change(&mut *tx, lead_id, current.as_str(), to.as_str(), actor.id)
            .await?;

        tx.commit().await?;

        tracing::info!("➡️ Lead #{}: {} -> {}", updated.lead_code, current, to);
        Ok(updated)
    }

    pub async fn status_history<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
    ) -> Result<Vec<StatusChange>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Leitura dentro de transação, como nas escritas
        let mut tx = executor.begin().await?;

        self.repo
            .find_lead(&mut *tx, vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        let history = self.repo.list_status_history(&mut *tx, lead_id).await?;
        tx.commit().await?;
        Ok(history)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::privileges::roles::{ADMIN, FACTORY, SALES_EXECUTIVE, SITE_SUPERVISOR};

    pub(crate) fn lead_at(status: &str) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            lead_code: 1,
            client_name: "Anita Sharma".into(),
            contact_no: "9876543210".into(),
            email: None,
            site_address: "Baner, Pune".into(),
            source: None,
            property_type: None,
            status: status.into(),
            assigned_to: None,
            usable_handover_ready: false,
            actual_installation_start_date: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn advances_exactly_one_step() {
        let lead = lead_at("booking-stage");
        assert_eq!(
            check_advance(&lead, Stage::FinalMeasurement, Some(ADMIN)).unwrap(),
            Stage::Booking
        );
    }

    #[test]
    fn skipping_or_going_back_is_rejected() {
        let lead = lead_at("booking-stage");
        for to in [Stage::ClientDocumentation, Stage::Designing, Stage::Booking] {
            assert!(matches!(
                check_advance(&lead, to, Some(ADMIN)),
                Err(AppError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn last_stage_cannot_advance() {
        let lead = lead_at("final-handover-stage");
        assert!(matches!(
            check_advance(&lead, Stage::FinalHandover, Some(ADMIN)),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn unknown_status_cannot_advance() {
        let lead = lead_at("lost");
        assert!(matches!(
            check_advance(&lead, Stage::SiteMeasurement, Some(ADMIN)),
            Err(AppError::UnknownStatus(s)) if s == "lost"
        ));
    }

    #[test]
    fn advancing_needs_privilege_of_current_stage() {
        let lead = lead_at("tech-check-stage");
        assert!(check_advance(&lead, Stage::OrderLogin, Some(FACTORY)).is_ok());
        assert!(matches!(
            check_advance(&lead, Stage::OrderLogin, Some(SALES_EXECUTIVE)),
            Err(AppError::PermissionDenied("can_tech_check"))
        ));
    }

    #[test]
    fn installation_needs_handover_ready() {
        let mut lead = lead_at("under-installation-stage");
        assert!(matches!(
            check_advance(&lead, Stage::FinalHandover, Some(SITE_SUPERVISOR)),
            Err(AppError::HandoverNotReady)
        ));

        lead.usable_handover_ready = true;
        assert!(check_advance(&lead, Stage::FinalHandover, Some(SITE_SUPERVISOR)).is_ok());
    }

    #[test]
    fn acting_on_future_stage_is_not_reached() {
        let lead = lead_at("designing-stage");
        assert!(matches!(
            ensure_can_act(&lead, Stage::Booking, Some(ADMIN)),
            Err(AppError::StageNotReached(Stage::Booking))
        ));
    }

    #[test]
    fn sales_executive_is_locked_out_of_past_stages() {
        let lead = lead_at("booking-stage");
        assert!(ensure_can_act(&lead, Stage::Booking, Some(SALES_EXECUTIVE)).is_ok());
        assert!(matches!(
            ensure_can_act(&lead, Stage::Designing, Some(SALES_EXECUTIVE)),
            Err(AppError::PermissionDenied("can_designing"))
        ));
        // Admin continua podendo corrigir etapas anteriores
        assert!(ensure_can_act(&lead, Stage::Designing, Some(ADMIN)).is_ok());
    }

    #[test]
    fn final_handover_opens_during_installation_once_ready() {
        let mut lead = lead_at("under-installation-stage");
        assert!(!stage_visible(&lead, Stage::FinalHandover));

        lead.usable_handover_ready = true;
        assert!(stage_visible(&lead, Stage::FinalHandover));
        assert!(ensure_can_act(&lead, Stage::FinalHandover, Some(SITE_SUPERVISOR)).is_ok());
    }

    #[test]
    fn lead_details_and_installation_skip_the_saved_form_check() {
        assert!(!requires_saved_details(Stage::LeadDetails));
        assert!(!requires_saved_details(Stage::UnderInstallation));
        assert!(requires_saved_details(Stage::Dispatch));
    }

    #[test]
    fn advance_is_refused_until_current_form_is_saved() {
        assert!(matches!(
            ensure_details_saved(Stage::Booking, false),
            Err(AppError::StageDetailsMissing(Stage::Booking))
        ));
        assert!(ensure_details_saved(Stage::Booking, true).is_ok());
        assert!(ensure_details_saved(Stage::LeadDetails, false).is_ok());
        assert!(ensure_details_saved(Stage::UnderInstallation, false).is_ok());
    }

    fn booking_form(payment: Value) -> StageForm {
        StageForm::parse(
            Stage::Booking,
            serde_json::json!({
                "finalQuotationAmount": 450000,
                "expectedDeliveryDate": "2024-08-01",
                "payment": payment,
            }),
        )
        .unwrap()
    }

    #[test]
    fn complete_payment_group_becomes_a_payment_entry() {
        let proof = Uuid::new_v4();
        let today = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();

        let form = booking_form(serde_json::json!({
            "amount": 50000, "paymentDetails": "UPI ref 88", "proofDocumentId": proof
        }));
        assert_eq!(
            payment_entry(&form, today),
            Some(PaymentEntry {
                amount: Decimal::from(50000),
                details: "UPI ref 88".into(),
                payment_date: today,
                proof_document_id: proof,
            })
        );

        let dated = booking_form(serde_json::json!({
            "amount": 50000, "paymentDetails": "UPI ref 88", "proofDocumentId": proof,
            "paymentDate": "2024-06-01"
        }));
        assert_eq!(
            payment_entry(&dated, today).unwrap().payment_date,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }

    #[test]
    fn form_without_payment_records_nothing() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
        assert_eq!(payment_entry(&booking_form(serde_json::json!({})), today), None);
    }

    fn document_of(lead_id: Uuid) -> LeadDocument {
        LeadDocument {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            lead_id,
            stage: "booking-stage".into(),
            doc_type_tag: "payment-proof".into(),
            original_name: "comprovante.pdf".into(),
            storage_key: "v/l/comprovante.pdf".into(),
            content_type: Some("application/pdf".into()),
            size_bytes: 4,
            uploaded_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn payment_proof_must_belong_to_the_same_lead() {
        let lead_id = Uuid::new_v4();
        let own = document_of(lead_id);
        assert!(ensure_proof_on_lead(own.id, Some(&own), lead_id).is_ok());

        let other = document_of(Uuid::new_v4());
        assert!(matches!(
            ensure_proof_on_lead(other.id, Some(&other), lead_id),
            Err(AppError::DocumentNotFound(id)) if id == other.id
        ));

        let missing = Uuid::new_v4();
        assert!(matches!(
            ensure_proof_on_lead(missing, None, lead_id),
            Err(AppError::DocumentNotFound(id)) if id == missing
        ));
    }
}
