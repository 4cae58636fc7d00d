// src/db/installation_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::installation::{InstallationUpdate, LeadInstaller},
};

#[derive(Clone, Default)]
pub struct InstallationRepository;

impl InstallationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_update<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        update_date: NaiveDate,
        remark: &str,
        created_by: Uuid,
    ) -> Result<InstallationUpdate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let update = sqlx::query_as::<_, InstallationUpdate>(
            r#"
            INSERT INTO lead_installation_updates (lead_id, update_date, remark, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, lead_id, update_date, remark, created_by, created_at
            "#,
        )
        .bind(lead_id)
        .bind(update_date)
        .bind(remark)
        .bind(created_by)
        .fetch_one(executor)
        .await?;

        Ok(update)
    }

    pub async fn list_updates<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
    ) -> Result<Vec<InstallationUpdate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updates = sqlx::query_as::<_, InstallationUpdate>(
            r#"
            SELECT id, lead_id, update_date, remark, created_by, created_at
            FROM lead_installation_updates
            WHERE lead_id = $1
            ORDER BY update_date DESC, created_at DESC
            "#,
        )
        .bind(lead_id)
        .fetch_all(executor)
        .await?;

        Ok(updates)
    }

    pub async fn clear_installers<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM lead_installers WHERE lead_id = $1")
            .bind(lead_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn add_installer<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO lead_installers (lead_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(lead_id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_installers<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
    ) -> Result<Vec<LeadInstaller>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installers = sqlx::query_as::<_, LeadInstaller>(
            r#"
            SELECT li.user_id, u.full_name, li.assigned_at
            FROM lead_installers li
            JOIN users u ON u.id = li.user_id
            WHERE li.lead_id = $1
            ORDER BY u.full_name
            "#,
        )
        .bind(lead_id)
        .fetch_all(executor)
        .await?;

        Ok(installers)
    }
}
