// src/db/payment_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::payment::PaymentLog};

const PAYMENT_COLUMNS: &str = r#"
    id, vendor_id, lead_id, stage, amount, payment_details, payment_date,
    proof_document_id, created_by, created_at
"#;

#[derive(Clone, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        stage: &str,
        amount: Decimal,
        payment_details: &str,
        payment_date: NaiveDate,
        proof_document_id: Option<Uuid>,
        created_by: Uuid,
    ) -> Result<PaymentLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, PaymentLog>(&format!(
            r#"
            INSERT INTO lead_payments (
                vendor_id, lead_id, stage, amount, payment_details,
                payment_date, proof_document_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(vendor_id)
        .bind(lead_id)
        .bind(stage)
        .bind(amount)
        .bind(payment_details)
        .bind(payment_date)
        .bind(proof_document_id)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    pub async fn list_by_lead<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
    ) -> Result<Vec<PaymentLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, PaymentLog>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM lead_payments
            WHERE vendor_id = $1 AND lead_id = $2
            ORDER BY payment_date, created_at
            "#
        ))
        .bind(vendor_id)
        .bind(lead_id)
        .fetch_all(executor)
        .await?;

        Ok(payments)
    }
}
