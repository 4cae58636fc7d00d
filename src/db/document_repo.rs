// src/db/document_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::document::LeadDocument};

const DOCUMENT_COLUMNS: &str = r#"
    id, vendor_id, lead_id, stage, doc_type_tag, original_name, storage_key,
    content_type, size_bytes, uploaded_by, created_at
"#;

#[derive(Clone, Default)]
pub struct DocumentRepository;

impl DocumentRepository {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_document<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        stage: &str,
        doc_type_tag: &str,
        original_name: &str,
        storage_key: &str,
        content_type: Option<&str>,
        size_bytes: i64,
        uploaded_by: Uuid,
    ) -> Result<LeadDocument, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, LeadDocument>(&format!(
            r#"
            INSERT INTO lead_documents (
                vendor_id, lead_id, stage, doc_type_tag, original_name,
                storage_key, content_type, size_bytes, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(vendor_id)
        .bind(lead_id)
        .bind(stage)
        .bind(doc_type_tag)
        .bind(original_name)
        .bind(storage_key)
        .bind(content_type)
        .bind(size_bytes)
        .bind(uploaded_by)
        .fetch_one(executor)
        .await?;

        Ok(document)
    }

    pub async fn find_document<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<LeadDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, LeadDocument>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM lead_documents WHERE id = $1 AND vendor_id = $2"
        ))
        .bind(document_id)
        .bind(vendor_id)
        .fetch_optional(executor)
        .await?;

        Ok(document)
    }

    /// Filtros opcionais por etapa e por tipo; mais recentes primeiro.
    pub async fn list_documents<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        stage: Option<&str>,
        doc_type_tag: Option<&str>,
    ) -> Result<Vec<LeadDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let documents = sqlx::query_as::<_, LeadDocument>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM lead_documents
            WHERE vendor_id = $1
              AND lead_id = $2
              AND ($3::text IS NULL OR stage = $3)
              AND ($4::text IS NULL OR doc_type_tag = $4)
            ORDER BY created_at DESC
            "#
        ))
        .bind(vendor_id)
        .bind(lead_id)
        .bind(stage)
        .bind(doc_type_tag)
        .fetch_all(executor)
        .await?;

        Ok(documents)
    }
}
