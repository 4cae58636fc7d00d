// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};
use utoipa::ToSchema;

use crate::domain::privileges::is_known_role;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub vendor_id: Uuid,

    #[schema(example = "ops@interiores.com")]
    pub email: String,

    #[schema(example = "Priya Nair")]
    pub full_name: String,

    // Papel como texto: os predicados de privilégio comparam strings
    #[schema(example = "sales-executive")]
    pub user_type: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn user_type(&self) -> Option<&str> {
        Some(self.user_type.as_str())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: Uuid,
    #[schema(example = "Casa Bella Interiors")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

fn known_role(user_type: &str) -> Result<(), ValidationError> {
    if is_known_role(user_type) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_user_type");
        err.message = Some("invalid_user_type".into());
        Err(err)
    }
}

// Cadastro de um novo fornecedor junto com o primeiro administrador
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVendorPayload {
    #[validate(length(min = 2, message = "too_short"))]
    #[schema(example = "Casa Bella Interiors")]
    pub vendor_name: String,
    #[validate(length(min = 2, message = "too_short"))]
    pub full_name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// Um admin cria os usuários da própria empresa
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 2, message = "too_short"))]
    pub full_name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
    #[validate(custom(function = "known_role"))]
    #[schema(example = "site-supervisor")]
    pub user_type: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // Subject (ID do usuário)
    pub vendor_id: Uuid, // Empresa do usuário
    pub exp: usize,      // Expiration time (quando o token expira)
    pub iat: usize,      // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_rejects_unknown_role() {
        let payload = CreateUserPayload {
            full_name: "Suresh Patil".into(),
            email: "suresh@obra.com".into(),
            password: "segredo123".into(),
            user_type: "installer".into(),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_type"));
    }

    #[test]
    fn create_user_accepts_known_role() {
        let payload = CreateUserPayload {
            full_name: "Suresh Patil".into(),
            email: "suresh@obra.com".into(),
            password: "segredo123".into(),
            user_type: "site-supervisor".into(),
        };
        assert!(payload.validate().is_ok());
    }
}
