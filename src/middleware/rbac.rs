// src/middleware/rbac.rs

// Privilégios que dependem só do papel. Os de etapa dependem do status
// do lead e são checados nos services, depois de carregar o lead.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    domain::privileges,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

/// 1. O Trait que define o que é um Privilégio
pub trait PrivilegeDef: Send + Sync + 'static {
    fn name() -> &'static str;
    fn allows(user_type: Option<&str>) -> bool;
}

pub(crate) fn authorize<T: PrivilegeDef>(user: Option<&AuthenticatedUser>) -> Result<(), AppError> {
    let user = user.ok_or(AppError::InvalidToken)?;
    if T::allows(user.user_type()) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(T::name()))
    }
}

/// 2. O Extractor (Guardião)
pub struct RequirePrivilege<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePrivilege<T>
where
    T: PrivilegeDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize::<T>(parts.extensions.get::<AuthenticatedUser>())
            .map(|_| RequirePrivilege(PhantomData))
            .map_err(|e| {
                let app_state = AppState::from_ref(state);
                let locale = Locale::from_headers(&parts.headers);
                tracing::warn!("⛔ Acesso negado: {}", e);
                e.to_api_error(&locale, &app_state.i18n_store)
            })
    }
}

// ---
// DEFINIÇÃO DOS PRIVILÉGIOS (TIPOS)
// ---

pub struct PermManageUsers;
impl PrivilegeDef for PermManageUsers {
    fn name() -> &'static str { "can_manage_users" }
    fn allows(user_type: Option<&str>) -> bool { privileges::can_manage_users(user_type) }
}

pub struct PermCreateLead;
impl PrivilegeDef for PermCreateLead {
    fn name() -> &'static str { "can_create_lead" }
    fn allows(user_type: Option<&str>) -> bool { privileges::can_create_lead(user_type) }
}

pub struct PermReassignLead;
impl PrivilegeDef for PermReassignLead {
    fn name() -> &'static str { "can_reassign_lead" }
    fn allows(user_type: Option<&str>) -> bool { privileges::can_reassign_lead(user_type) }
}

pub struct PermViewPayments;
impl PrivilegeDef for PermViewPayments {
    fn name() -> &'static str { "can_view_payments" }
    fn allows(user_type: Option<&str>) -> bool { privileges::can_view_payments(user_type) }
}

pub struct PermAssignInstallers;
impl PrivilegeDef for PermAssignInstallers {
    fn name() -> &'static str { "can_assign_installers" }
    fn allows(user_type: Option<&str>) -> bool { privileges::can_assign_installers(user_type) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::User;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(user_type: &str) -> AuthenticatedUser {
        AuthenticatedUser(User {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            email: "x@y.com".into(),
            full_name: "Teste".into(),
            user_type: user_type.into(),
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn admin_can_manage_users() {
        assert!(authorize::<PermManageUsers>(Some(&user("admin"))).is_ok());
    }

    #[test]
    fn operational_roles_cannot_list_or_create_users() {
        for role in ["factory", "sales-executive", "site-supervisor"] {
            let err = authorize::<PermManageUsers>(Some(&user(role))).unwrap_err();
            assert!(matches!(err, AppError::PermissionDenied("can_manage_users")));
        }
    }

    #[test]
    fn factory_cannot_view_payments() {
        let err = authorize::<PermViewPayments>(Some(&user("factory"))).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied("can_view_payments")));
    }

    #[test]
    fn sales_executive_creates_but_does_not_reassign() {
        let sales = user("sales-executive");
        assert!(authorize::<PermCreateLead>(Some(&sales)).is_ok());
        assert!(authorize::<PermReassignLead>(Some(&sales)).is_err());
    }

    #[test]
    fn missing_user_is_unauthenticated() {
        assert!(matches!(
            authorize::<PermAssignInstallers>(None),
            Err(AppError::InvalidToken)
        ));
    }
}
