// src/services/installation_service.rs

use chrono::NaiveDate;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InstallationRepository, LeadRepository, UserRepository},
    domain::Stage,
    models::{
        auth::User,
        installation::{InstallationUpdate, InstallationView},
        lead::Lead,
    },
    services::lead_service::ensure_can_act,
};

// Antes da data de início a tela mostra só o aviso "não iniciada"
fn ensure_started(lead: &Lead) -> Result<(), AppError> {
    if lead.installation_started() {
        Ok(())
    } else {
        Err(AppError::InstallationNotStarted)
    }
}

#[derive(Clone)]
pub struct InstallationService {
    repo: InstallationRepository,
    lead_repo: LeadRepository,
    user_repo: UserRepository,
}

impl InstallationService {
    pub fn new(repo: InstallationRepository, lead_repo: LeadRepository, user_repo: UserRepository) -> Self {
        Self { repo, lead_repo, user_repo }
    }

    pub async fn view<'e, E>(&self, executor: E, vendor_id: Uuid, lead_id: Uuid) -> Result<InstallationView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Leitura dentro de transação, como nas escritas
        let mut tx = executor.begin().await?;

        let lead = self
            .lead_repo
            .find_lead(&mut *tx, vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        let installers = self.repo.list_installers(&mut *tx, lead_id).await?;
        let updates = self.repo.list_updates(&mut *tx, lead_id).await?;
        tx.commit().await?;

        Ok(InstallationView {
            started: lead.installation_started(),
            actual_installation_start_date: lead.actual_installation_start_date,
            usable_handover_ready: lead.usable_handover_ready,
            installers,
            updates,
        })
    }

    pub async fn start_installation<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        start_date: NaiveDate,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let lead = self
            .lead_repo
            .find_lead_for_update(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        ensure_can_act(&lead, Stage::UnderInstallation, actor.user_type())?;
        if lead.installation_started() {
            return Err(AppError::InstallationAlreadyStarted);
        }

        let lead = self
            .lead_repo
            .set_installation_start(&mut *tx, actor.vendor_id, lead_id, start_date)
            .await?;

        tx.commit().await?;

        tracing::info!("🔧 Instalação do lead #{} iniciada em {}", lead.lead_code, start_date);
        Ok(lead)
    }

    pub async fn add_update<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        update_date: NaiveDate,
        remark: &str,
    ) -> Result<InstallationUpdate, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let lead = self
            .lead_repo
            .find_lead(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        ensure_can_act(&lead, Stage::UnderInstallation, actor.user_type())?;
        ensure_started(&lead)?;

        let update = self
            .repo
            .insert_update(&mut *tx, lead_id, update_date, remark.trim(), actor.id)
            .await?;

        tx.commit().await?;
        Ok(update)
    }

    /// Substitui a equipe inteira. A checagem de papel fica no extrator da rota.
    pub async fn assign_installers<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        installer_ids: &[Uuid],
    ) -> Result<InstallationView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let lead = self
            .lead_repo
            .find_lead_for_update(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        for installer_id in installer_ids {
            self.user_repo
                .find_active_in_vendor(&mut *tx, actor.vendor_id, *installer_id)
                .await?
                .ok_or(AppError::InvalidAssignee(*installer_id))?;
        }

        self.repo.clear_installers(&mut *tx, lead_id).await?;
        for installer_id in installer_ids {
            self.repo.add_installer(&mut *tx, lead_id, *installer_id).await?;
        }

        let installers = self.repo.list_installers(&mut *tx, lead_id).await?;
        let updates = self.repo.list_updates(&mut *tx, lead_id).await?;

        tx.commit().await?;

        tracing::info!("👷 {} instalador(es) no lead #{}", installers.len(), lead.lead_code);
        Ok(InstallationView {
            started: lead.installation_started(),
            actual_installation_start_date: lead.actual_installation_start_date,
            usable_handover_ready: lead.usable_handover_ready,
            installers,
            updates,
        })
    }

    pub async fn set_handover_ready<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        ready: bool,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let lead = self
            .lead_repo
            .find_lead_for_update(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        ensure_can_act(&lead, Stage::UnderInstallation, actor.user_type())?;
        ensure_started(&lead)?;

        let lead = self
            .lead_repo
            .set_handover_ready(&mut *tx, actor.vendor_id, lead_id, ready)
            .await?;

        tx.commit().await?;
        Ok(lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lead_service::tests::lead_at;

    #[test]
    fn updates_wait_for_the_start_date() {
        let mut lead = lead_at("under-installation-stage");
        assert!(matches!(ensure_started(&lead), Err(AppError::InstallationNotStarted)));

        lead.actual_installation_start_date = NaiveDate::from_ymd_opt(2024, 10, 1);
        assert!(ensure_started(&lead).is_ok());
    }
}
