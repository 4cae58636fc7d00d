// src/db/lead_repo.rs

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        lead::{Lead, LeadDetailsPayload, StatusChange},
        stages::StageDetail,
    },
};

const LEAD_COLUMNS: &str = r#"
    id, vendor_id, lead_code, client_name, contact_no, email, site_address,
    source, property_type, status, assigned_to, usable_handover_ready,
    actual_installation_start_date, created_by, created_at, updated_at
"#;

// Tudo aqui roda na conexão RLS da requisição, então o repositório não guarda pool
#[derive(Clone, Default)]
pub struct LeadRepository;

impl LeadRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn create_lead<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        created_by: Uuid,
        payload: &LeadDetailsPayload,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            INSERT INTO leads (
                vendor_id, client_name, contact_no, email, site_address,
                source, property_type, assigned_to, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(vendor_id)
        .bind(&payload.client_name)
        .bind(&payload.contact_no)
        .bind(&payload.email)
        .bind(&payload.site_address)
        .bind(&payload.source)
        .bind(&payload.property_type)
        .bind(payload.assigned_to)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

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
        let leads = sqlx::query_as::<_, Lead>(&format!(
            r#"
            SELECT {LEAD_COLUMNS}
            FROM leads
            WHERE vendor_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(vendor_id)
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(leads)
    }

    pub async fn find_lead<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1 AND vendor_id = $2"
        ))
        .bind(lead_id)
        .bind(vendor_id)
        .fetch_optional(executor)
        .await?;

        Ok(lead)
    }

    /// Trava a linha até o fim da transação (avanço de status concorrente).
    pub async fn find_lead_for_update<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1 AND vendor_id = $2 FOR UPDATE"
        ))
        .bind(lead_id)
        .bind(vendor_id)
        .fetch_optional(executor)
        .await?;

        Ok(lead)
    }

    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        payload: &LeadDetailsPayload,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads
            SET client_name = $3, contact_no = $4, email = $5, site_address = $6,
                source = $7, property_type = $8, updated_at = NOW()
            WHERE id = $1 AND vendor_id = $2
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(lead_id)
        .bind(vendor_id)
        .bind(&payload.client_name)
        .bind(&payload.contact_no)
        .bind(&payload.email)
        .bind(&payload.site_address)
        .bind(&payload.source)
        .bind(&payload.property_type)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LeadNotFound(lead_id))?;

        Ok(lead)
    }

    pub async fn update_assignee<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        assigned_to: Uuid,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads SET assigned_to = $3, updated_at = NOW()
            WHERE id = $1 AND vendor_id = $2
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(lead_id)
        .bind(vendor_id)
        .bind(assigned_to)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LeadNotFound(lead_id))?;

        Ok(lead)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        status: &str,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads SET status = $3, updated_at = NOW()
            WHERE id = $1 AND vendor_id = $2
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(lead_id)
        .bind(vendor_id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LeadNotFound(lead_id))?;

        Ok(lead)
    }

    pub async fn set_installation_start<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        start_date: NaiveDate,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads SET actual_installation_start_date = $3, updated_at = NOW()
            WHERE id = $1 AND vendor_id = $2
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(lead_id)
        .bind(vendor_id)
        .bind(start_date)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LeadNotFound(lead_id))?;

        Ok(lead)
    }

    pub async fn set_handover_ready<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        ready: bool,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads SET usable_handover_ready = $3, updated_at = NOW()
            WHERE id = $1 AND vendor_id = $2
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(lead_id)
        .bind(vendor_id)
        .bind(ready)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LeadNotFound(lead_id))?;

        Ok(lead)
    }

    // =========================================================================
    //  HISTÓRICO DE STATUS
    // =========================================================================

    pub async fn insert_status_change<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        from_status: &str,
        to_status: &str,
        changed_by: Uuid,
    ) -> Result<StatusChange, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let change = sqlx::query_as::<_, StatusChange>(
            r#"
            INSERT INTO lead_status_history (lead_id, from_status, to_status, changed_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, lead_id, from_status, to_status, changed_by, changed_at
            "#,
        )
        .bind(lead_id)
        .bind(from_status)
        .bind(to_status)
        .bind(changed_by)
        .fetch_one(executor)
        .await?;

        Ok(change)
    }

    pub async fn list_status_history<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
    ) -> Result<Vec<StatusChange>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let history = sqlx::query_as::<_, StatusChange>(
            r#"
            SELECT id, lead_id, from_status, to_status, changed_by, changed_at
            FROM lead_status_history
            WHERE lead_id = $1
            ORDER BY changed_at
            "#,
        )
        .bind(lead_id)
        .fetch_all(executor)
        .await?;

        Ok(history)
    }

    // =========================================================================
    //  DADOS POR ETAPA (JSONB)
    // =========================================================================

    pub async fn find_stage_detail<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        stage: &str,
    ) -> Result<Option<StageDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let detail = sqlx::query_as::<_, StageDetail>(
            r#"
            SELECT lead_id, stage, data, updated_by, updated_at
            FROM lead_stage_details
            WHERE lead_id = $1 AND stage = $2
            "#,
        )
        .bind(lead_id)
        .bind(stage)
        .fetch_optional(executor)
        .await?;

        Ok(detail)
    }

    // Salvar de novo sobrescreve: o formulário é sempre enviado inteiro
    pub async fn upsert_stage_detail<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        stage: &str,
        data: &Value,
        updated_by: Uuid,
    ) -> Result<StageDetail, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let detail = sqlx::query_as::<_, StageDetail>(
            r#"
            INSERT INTO lead_stage_details (lead_id, stage, data, updated_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (lead_id, stage)
            DO UPDATE SET data = EXCLUDED.data,
                          updated_by = EXCLUDED.updated_by,
                          updated_at = NOW()
            RETURNING lead_id, stage, data, updated_by, updated_at
            "#,
        )
        .bind(lead_id)
        .bind(stage)
        .bind(data)
        .bind(updated_by)
        .fetch_one(executor)
        .await?;

        Ok(detail)
    }
}
