// src/services/user_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{CreateUserPayload, User},
    services::auth::hash_password,
};

// Usuários da empresa. A checagem de `can_manage_users` fica no extrator da rota.
#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        payload: &CreateUserPayload,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let hashed_password = hash_password(&payload.password).await?;

        let user = self
            .repo
            .create_user(
                executor,
                vendor_id,
                payload.email.trim(),
                payload.full_name.trim(),
                &hashed_password,
                &payload.user_type,
            )
            .await?;

        tracing::info!("👤 Usuário {} criado como {}", user.email, user.user_type);
        Ok(user)
    }

    pub async fn list_users<'e, E>(&self, executor: E, vendor_id: Uuid) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_by_vendor(executor, vendor_id).await
    }
}
