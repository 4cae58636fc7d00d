// src/db/vendor_repo.rs

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::auth::Vendor};

// Só é usado dentro da transação de cadastro, então não guarda pool
#[derive(Clone, Default)]
pub struct VendorRepository;

impl VendorRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_vendor<'e, E>(&self, executor: E, name: &str) -> Result<Vendor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>(
            "INSERT INTO vendors (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(vendor)
    }
}
