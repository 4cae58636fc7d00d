use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{
    common::i18n::I18nStore,
    domain::{stages::UnknownStage, Stage},
    middleware::i18n::Locale,
};

// Erros de domínio. Cada variante vira uma chave de tradução em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("Corpo da requisição inválido: {0}")]
    InvalidPayload(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Usuário inativo")]
    InactiveUser,

    #[error("Lead não encontrado: {0}")]
    LeadNotFound(Uuid),

    #[error("Documento não encontrado: {0}")]
    DocumentNotFound(Uuid),

    #[error("Etapa desconhecida: {0}")]
    UnknownStage(String),

    #[error("Status fora do funil: {0}")]
    UnknownStatus(String),

    #[error("A etapa {0} ainda não foi alcançada")]
    StageNotReached(Stage),

    #[error("A etapa {0} tem operações próprias")]
    StageHasDedicatedOperations(Stage),

    #[error("Os dados da etapa {0} ainda não foram salvos")]
    StageDetailsMissing(Stage),

    #[error("Transição inválida de {from} para {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Sem permissão: {0}")]
    PermissionDenied(&'static str),

    #[error("Instalação não iniciada")]
    InstallationNotStarted,

    #[error("Instalação já iniciada")]
    InstallationAlreadyStarted,

    #[error("Obra ainda não liberada para entrega")]
    HandoverNotReady,

    #[error("Usuário {0} não pertence a esta empresa")]
    InvalidAssignee(Uuid),

    #[error("Tipo de arquivo não suportado: {0}")]
    UnsupportedFile(String),

    #[error("Tipo de documento inválido: {0}")]
    InvalidDocType(String),

    #[error("Nenhum arquivo enviado")]
    MissingFile,

    #[error("Upload inválido: {0}")]
    InvalidMultipart(String),

    #[error("Link de download inválido ou expirado")]
    InvalidSignature,

    #[error("Arquivo não encontrado no armazenamento")]
    FileNotFound,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Erro de armazenamento: {0}")]
    StorageError(#[from] std::io::Error),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl From<UnknownStage> for AppError {
    fn from(e: UnknownStage) -> Self {
        AppError::UnknownStage(e.0)
    }
}

// O erro já traduzido, pronto para a resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "code": self.code,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Status HTTP e chave de tradução de cada variante.
    pub fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "error.validation"),
            AppError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "error.invalid_payload"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "error.email_exists"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "error.invalid_credentials"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "error.invalid_token"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "error.user_not_found"),
            AppError::InactiveUser => (StatusCode::FORBIDDEN, "error.inactive_user"),
            AppError::LeadNotFound(_) => (StatusCode::NOT_FOUND, "error.lead_not_found"),
            AppError::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "error.document_not_found"),
            AppError::UnknownStage(_) => (StatusCode::BAD_REQUEST, "error.unknown_stage"),
            AppError::UnknownStatus(_) => (StatusCode::CONFLICT, "error.unknown_status"),
            AppError::StageNotReached(_) => (StatusCode::CONFLICT, "error.stage_not_reached"),
            AppError::StageHasDedicatedOperations(_) => {
                (StatusCode::BAD_REQUEST, "error.stage_dedicated")
            }
            AppError::StageDetailsMissing(_) => (StatusCode::CONFLICT, "error.stage_details_missing"),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, "error.invalid_transition"),
            AppError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "error.permission_denied"),
            AppError::InstallationNotStarted => {
                (StatusCode::CONFLICT, "error.installation_not_started")
            }
            AppError::InstallationAlreadyStarted => {
                (StatusCode::CONFLICT, "error.installation_already_started")
            }
            AppError::HandoverNotReady => (StatusCode::CONFLICT, "error.handover_not_ready"),
            AppError::InvalidAssignee(_) => (StatusCode::BAD_REQUEST, "error.invalid_assignee"),
            AppError::UnsupportedFile(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "error.unsupported_file")
            }
            AppError::InvalidDocType(_) => (StatusCode::BAD_REQUEST, "error.invalid_doc_type"),
            AppError::MissingFile => (StatusCode::BAD_REQUEST, "error.missing_file"),
            AppError::InvalidMultipart(_) => (StatusCode::BAD_REQUEST, "error.invalid_multipart"),
            AppError::InvalidSignature => (StatusCode::FORBIDDEN, "error.invalid_signature"),
            AppError::FileNotFound => (StatusCode::NOT_FOUND, "error.file_not_found"),
            AppError::UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "error.unique_violation"),
            AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "error.not_found")
            }
            // Todos os outros erros viram 500 com a mensagem genérica.
            AppError::StorageError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error.internal"),
        }
    }

    // Argumentos interpolados na mensagem traduzida
    fn message_args(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::LeadNotFound(id) | AppError::DocumentNotFound(id) | AppError::InvalidAssignee(id) => {
                vec![("id", id.to_string())]
            }
            AppError::UnknownStage(value) | AppError::UnknownStatus(value) => {
                vec![("value", value.clone())]
            }
            AppError::StageNotReached(stage)
            | AppError::StageHasDedicatedOperations(stage)
            | AppError::StageDetailsMissing(stage) => vec![("stage", stage.to_string())],
            AppError::InvalidTransition { from, to } => {
                vec![("from", from.clone()), ("to", to.clone())]
            }
            AppError::PermissionDenied(privilege) => vec![("privilege", privilege.to_string())],
            AppError::UnsupportedFile(name) | AppError::InvalidDocType(name) => {
                vec![("value", name.clone())]
            }
            _ => Vec::new(),
        }
    }

    /// Converte o erro de domínio na resposta traduzida para o idioma da requisição.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada; o cliente só vê a genérica.
            tracing::error!("🔥 Erro Interno do Servidor: {}", self);
        }

        let args = self.message_args();
        let args: Vec<(&str, &str)> = args.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut fields = BTreeMap::new();
                collect_validation_details(errors, "", &locale.0, store, &mut fields);
                Some(json!(fields))
            }
            AppError::InvalidPayload(reason) | AppError::InvalidMultipart(reason) => {
                Some(json!({ "reason": reason }))
            }
            _ => None,
        };

        ApiError {
            status,
            code: key,
            error: store.translate_with(&locale.0, key, &args),
            details,
        }
    }
}

// Achata erros aninhados em "campo", "pai.campo" e "lista[0].campo".
fn collect_validation_details(
    errors: &ValidationErrors,
    prefix: &str,
    lang: &str,
    store: &I18nStore,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors.iter().map(|e| {
                    let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                    store
                        .translate_opt(lang, &format!("validation.{}", code))
                        .unwrap_or_else(|| code.to_string())
                });
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_validation_details(inner, &path, lang, store, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_validation_details(inner, &format!("{}[{}]", path, index), lang, store, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 5, message = "too_short"))]
        name: String,
    }

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn validation_errors_carry_translated_details() {
        let store = I18nStore::load_embedded("en").unwrap();
        let errors = Probe { name: "ab".into() }.validate().unwrap_err();

        let api = AppError::ValidationError(errors).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.code, "error.validation");
        let details = api.details.unwrap();
        assert_eq!(details["name"][0], store.translate("en", "validation.too_short"));
    }

    #[test]
    fn permission_denied_names_the_privilege() {
        let store = I18nStore::load_embedded("en").unwrap();
        let api = AppError::PermissionDenied("can_dispatch").to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.error.contains("can_dispatch"));
    }

    #[test]
    fn unexpected_errors_use_generic_message() {
        let store = I18nStore::load_embedded("en").unwrap();
        let api = AppError::InternalServerError(anyhow::anyhow!("pool exausto"))
            .to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("pool exausto"));
        assert_eq!(api.error, store.translate("en", "error.internal"));
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let (status, _) = AppError::DatabaseError(sqlx::Error::RowNotFound).status_and_key();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn every_key_has_english_and_portuguese_text() {
        let store = I18nStore::load_embedded("en").unwrap();
        let samples = [
            AppError::InvalidToken,
            AppError::HandoverNotReady,
            AppError::InstallationNotStarted,
            AppError::StageNotReached(Stage::Dispatch),
            AppError::InvalidTransition { from: "a".into(), to: "b".into() },
            AppError::UnsupportedFile("x.exe".into()),
            AppError::InvalidSignature,
            AppError::MissingFile,
        ];
        for err in samples {
            let (_, key) = err.status_and_key();
            assert!(store.translate_opt("en", key).is_some(), "en sem {key}");
            assert!(store.translate_opt("pt", key).is_some(), "pt sem {key}");
        }
    }
}
