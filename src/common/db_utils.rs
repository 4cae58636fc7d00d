// src/common/db_utils.rs

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Adquire uma conexão da pool e grava a empresa e o usuário da requisição
/// nas variáveis que as policies de RLS leem.
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut conn = app_state.db_pool.acquire().await?;

    // `false`: vale para a sessão inteira, não só para a próxima transação.
    // A conexão volta para a pool, então sempre sobrescrevemos os dois valores.
    sqlx::query("SELECT set_config('app.vendor_id', $1, false), set_config('app.user_id', $2, false)")
        .bind(user.0.vendor_id.to_string())
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}
