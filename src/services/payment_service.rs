// src/services/payment_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadRepository, PaymentRepository},
    models::payment::PaymentSummary,
};

// Os lançamentos nascem no salvamento das etapas (lead_service); aqui só leitura.
#[derive(Clone)]
pub struct PaymentService {
    repo: PaymentRepository,
    lead_repo: LeadRepository,
}

impl PaymentService {
    pub fn new(repo: PaymentRepository, lead_repo: LeadRepository) -> Self {
        Self { repo, lead_repo }
    }

    pub async fn list_payments<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
    ) -> Result<PaymentSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Leitura dentro de transação, como nas escritas
        let mut tx = executor.begin().await?;

        self.lead_repo
            .find_lead(&mut *tx, vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        let payments = self.repo.list_by_lead(&mut *tx, vendor_id, lead_id).await?;
        tx.commit().await?;
        Ok(PaymentSummary::from_logs(payments))
    }
}
