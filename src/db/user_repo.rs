// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::User};

const USER_COLUMNS: &str = "id, vendor_id, email, full_name, user_type, password_hash, is_active, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Login e validação do token acontecem antes de sabermos a empresa,
    // então estas duas buscas usam a pool direto.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    /// Usuário ativo da mesma empresa (responsável por lead, instalador...)
    pub async fn find_active_in_vendor<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND vendor_id = $2 AND is_active"
        ))
        .bind(user_id)
        .bind(vendor_id)
        .fetch_optional(executor)
        .await?;
        Ok(maybe_user)
    }

    pub async fn list_by_vendor<'e, E>(&self, executor: E, vendor_id: Uuid) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE vendor_id = $1 ORDER BY full_name"
        ))
        .bind(vendor_id)
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    // Cria um novo usuário no banco de dados
    // Com tratamento de erro específico para e-mails duplicados.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        email: &str,
        full_name: &str,
        password_hash: &str,
        user_type: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (vendor_id, email, full_name, password_hash, user_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(vendor_id)
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .bind(user_type)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    if let Some(constraint) = db_err.constraint() {
                        return match constraint {
                            // Índice único em lower(email) criado na migration
                            "idx_users_email_lower" => AppError::EmailAlreadyExists,
                            _ => AppError::UniqueConstraintViolation(constraint.to_string()),
                        };
                    }
                }
            }
            e.into()
        })?;

        Ok(user)
    }
}
