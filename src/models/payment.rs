// src/models/payment.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// O que sai do banco (Tabela lead_payments)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLog {
    pub id: Uuid,
    #[schema(ignore)]
    pub vendor_id: Uuid,
    pub lead_id: Uuid,
    #[schema(example = "booking-stage")]
    pub stage: String,
    #[schema(example = "50000.00")]
    pub amount: Decimal,
    #[schema(example = "UPI ref 88213")]
    pub payment_details: String,
    pub payment_date: NaiveDate,
    pub proof_document_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Resumo para o topo da aba de pagamentos
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    #[schema(example = "150000.00")]
    pub total_received: Decimal,
    pub payments: Vec<PaymentLog>,
}

impl PaymentSummary {
    pub fn from_logs(payments: Vec<PaymentLog>) -> Self {
        let total_received = payments.iter().map(|p| p.amount).sum();
        Self { total_received, payments }
    }
}
