// src/handlers/documents.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    domain::Stage,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::document::{
        DocTypeTag, DocumentBuckets, DocumentListQuery, DocumentView, DownloadQuery, UploadedFile,
    },
};

// Campos esperados no form: stage, doc_type e um ou mais "files"
struct UploadForm {
    stage: Stage,
    doc_type: DocTypeTag,
    files: Vec<UploadedFile>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut stage = None;
    let mut doc_type = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidMultipart(e.body_text()))?
    {
        match field.name().unwrap_or_default() {
            "stage" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidMultipart(e.body_text()))?;
                stage = Some(text.trim().parse::<Stage>()?);
            }
            "doc_type" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidMultipart(e.body_text()))?;
                doc_type = Some(
                    text.trim()
                        .parse::<DocTypeTag>()
                        .map_err(AppError::InvalidDocType)?,
                );
            }
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidMultipart(e.body_text()))?;
                // Input de arquivo vazio chega como parte sem nome
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                files.push(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => {
                tracing::debug!("Campo multipart ignorado: {}", other);
            }
        }
    }

    Ok(UploadForm {
        stage: stage.ok_or_else(|| AppError::InvalidMultipart("stage".into()))?,
        doc_type: doc_type.ok_or_else(|| AppError::InvalidMultipart("doc_type".into()))?,
        files,
    })
}

// POST /api/leads/{id}/documents
#[utoipa::path(
    post,
    path = "/api/leads/{id}/documents",
    tag = "Documents",
    request_body(content_type = "multipart/form-data", description = "Campos: stage, doc_type, files (repetível)"),
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 201, description = "Arquivos enviados", body = Vec<DocumentView>),
        (status = 400, description = "Extensão não aceita ou form inválido"),
        (status = 403, description = "Sem permissão na etapa")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_documents(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_upload_form(multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let views = app_state
        .document_service
        .upload(&mut *rls_conn, &user.0, lead_id, form.stage, form.doc_type, form.files)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(views)))
}

// GET /api/leads/{id}/documents
#[utoipa::path(
    get,
    path = "/api/leads/{id}/documents",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "ID do lead"),
        DocumentListQuery
    ),
    responses(
        (status = 200, description = "Documentos separados em imagens e arquivos", body = DocumentBuckets)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_documents(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(lead_id): Path<Uuid>,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let buckets = app_state
        .document_service
        .list(
            &mut *rls_conn,
            user.0.vendor_id,
            lead_id,
            query.stage.as_deref(),
            query.doc_type.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(buckets)))
}

// GET /files/{*key}?expires=..&sig=..
// Público: quem autoriza é a assinatura do link
#[utoipa::path(
    get,
    path = "/files/{key}",
    tag = "Documents",
    params(
        ("key" = String, Path, description = "Chave interna do arquivo"),
        DownloadQuery
    ),
    responses(
        (status = 200, description = "Conteúdo do arquivo"),
        (status = 403, description = "Link inválido ou expirado"),
        (status = 404, description = "Arquivo não encontrado")
    )
)]
pub async fn download_file(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(key): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let (bytes, content_type) = app_state
        .document_service
        .download(&key, query.expires, &query.sig)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
