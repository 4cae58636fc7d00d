// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{UserRepository, VendorRepository},
    domain::privileges::roles,
    models::auth::{Claims, RegisterVendorPayload, User},
};

const TOKEN_TTL_DAYS: i64 = 7;

// bcrypt é caro: roda fora do executor assíncrono
pub(crate) async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub(crate) fn encode_token(
    secret: &str,
    user_id: Uuid,
    vendor_id: Uuid,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

    let claims = Claims {
        sub: user_id,
        vendor_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

pub(crate) fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    vendor_repo: VendorRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        vendor_repo: VendorRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, vendor_repo, jwt_secret, pool }
    }

    /// Cria a empresa e o primeiro admin juntos; devolve o token do admin.
    pub async fn register_vendor(&self, payload: &RegisterVendorPayload) -> Result<String, AppError> {
        // 1. Hashing (fora da transação, pois não toca no banco)
        let hashed_password = hash_password(&payload.password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let vendor = self
            .vendor_repo
            .create_vendor(&mut *tx, payload.vendor_name.trim())
            .await?;

        // Se falhar aqui (e-mail repetido), a empresa criada acima é desfeita no drop do tx
        let admin = self
            .user_repo
            .create_user(
                &mut *tx,
                vendor.id,
                payload.email.trim(),
                payload.full_name.trim(),
                &hashed_password,
                roles::ADMIN,
            )
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("🏢 Empresa '{}' criada com o admin {}", vendor.name, admin.email);

        encode_token(&self.jwt_secret, admin.id, vendor.id, Utc::now())
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Só depois da senha, para não revelar quais contas existem
        if !user.is_active {
            return Err(AppError::InactiveUser);
        }

        encode_token(&self.jwt_secret, user.id, user.vendor_id, Utc::now())
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.vendor_id != claims.vendor_id {
            return Err(AppError::InvalidToken);
        }
        if !user.is_active {
            return Err(AppError::InactiveUser);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_user_and_vendor() {
        let user_id = Uuid::new_v4();
        let vendor_id = Uuid::new_v4();
        let token = encode_token("segredo", user_id, vendor_id, Utc::now()).unwrap();

        let claims = decode_token("segredo", &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.vendor_id, vendor_id);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = encode_token("segredo", Uuid::new_v4(), Uuid::new_v4(), Utc::now()).unwrap();
        assert!(matches!(decode_token("outro", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_invalid() {
        let issued = Utc::now() - chrono::Duration::days(TOKEN_TTL_DAYS + 1);
        let token = encode_token("segredo", Uuid::new_v4(), Uuid::new_v4(), issued).unwrap();
        assert!(matches!(decode_token("segredo", &token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify("segredo123", &hashed).unwrap());
        assert!(!verify("outra", &hashed).unwrap());
    }
}
