// src/models/document.rs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DocTypeTag {
    SitePhotos,
    MeasurementSheet,
    DesignFile,
    Quotation,
    PaymentProof,
    ClientDocument,
    ProductionFile,
    DispatchPhoto,
    InstallationPhoto,
    HandoverDocument,
    Other,
}

impl DocTypeTag {
    pub const ALL: [DocTypeTag; 11] = [
        DocTypeTag::SitePhotos,
        DocTypeTag::MeasurementSheet,
        DocTypeTag::DesignFile,
        DocTypeTag::Quotation,
        DocTypeTag::PaymentProof,
        DocTypeTag::ClientDocument,
        DocTypeTag::ProductionFile,
        DocTypeTag::DispatchPhoto,
        DocTypeTag::InstallationPhoto,
        DocTypeTag::HandoverDocument,
        DocTypeTag::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocTypeTag::SitePhotos => "site-photos",
            DocTypeTag::MeasurementSheet => "measurement-sheet",
            DocTypeTag::DesignFile => "design-file",
            DocTypeTag::Quotation => "quotation",
            DocTypeTag::PaymentProof => "payment-proof",
            DocTypeTag::ClientDocument => "client-document",
            DocTypeTag::ProductionFile => "production-file",
            DocTypeTag::DispatchPhoto => "dispatch-photo",
            DocTypeTag::InstallationPhoto => "installation-photo",
            DocTypeTag::HandoverDocument => "handover-document",
            DocTypeTag::Other => "other",
        }
    }
}

impl FromStr for DocTypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocTypeTag::ALL
            .iter()
            .find(|tag| tag.as_str() == s)
            .copied()
            .ok_or_else(|| s.to_string())
    }
}

// "Balde" de exibição: imagens viram galeria, o resto vira lista de arquivos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Document,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "dwg", "dxf", "txt", "csv", "zip"];

impl FileKind {
    /// Classifica pela extensão; `None` para extensões não aceitas.
    pub fn from_file_name(name: &str) -> Option<FileKind> {
        let ext = file_extension(name)?;
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Image)
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Document)
        } else {
            None
        }
    }
}

/// Extensão em minúsculas, sem o ponto.
pub fn file_extension(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Content-Type servido no download, a partir da extensão da chave.
pub fn content_type_for(name: &str) -> &'static str {
    match file_extension(name).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("csv") => "text/csv",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

// Um arquivo lido do multipart, ainda não gravado
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

// O que sai do banco (Tabela lead_documents)
#[derive(Debug, Clone, FromRow)]
pub struct LeadDocument {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub lead_id: Uuid,
    pub stage: String,
    pub doc_type_tag: String,
    pub original_name: String,
    pub storage_key: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// O que a API devolve: nunca expõe a chave interna, só a URL assinada
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub id: Uuid,
    #[schema(example = "planta-cozinha.pdf")]
    pub original_name: String,
    pub signed_url: String,
    pub created_at: DateTime<Utc>,
    #[schema(example = "design-file")]
    pub doc_type_tag: String,
    #[schema(example = "designing-stage")]
    pub stage: String,
    pub kind: FileKind,
    pub size_bytes: i64,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBuckets {
    pub images: Vec<DocumentView>,
    pub documents: Vec<DocumentView>,
}

impl DocumentBuckets {
    pub fn push(&mut self, view: DocumentView) {
        match view.kind {
            FileKind::Image => self.images.push(view),
            FileKind::Document => self.documents.push(view),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DocumentListQuery {
    /// Filtra por etapa (ex: "booking-stage")
    pub stage: Option<String>,
    /// Filtra por tipo (ex: "payment-proof")
    pub doc_type: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DownloadQuery {
    pub expires: i64,
    pub sig: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension_case_insensitively() {
        assert_eq!(FileKind::from_file_name("sala.JPG"), Some(FileKind::Image));
        assert_eq!(FileKind::from_file_name("foto.final.webp"), Some(FileKind::Image));
        assert_eq!(FileKind::from_file_name("orcamento.pdf"), Some(FileKind::Document));
        assert_eq!(FileKind::from_file_name("planta.DWG"), Some(FileKind::Document));
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        assert_eq!(FileKind::from_file_name("setup.exe"), None);
        assert_eq!(FileKind::from_file_name("README"), None);
    }

    #[test]
    fn doc_type_tags_parse_from_their_names() {
        for tag in DocTypeTag::ALL {
            assert_eq!(tag.as_str().parse::<DocTypeTag>(), Ok(tag));
        }
        assert!("receipt".parse::<DocTypeTag>().is_err());
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("v/l/a.PDF"), "application/pdf");
        assert_eq!(content_type_for("v/l/b.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("v/l/c.dwg"), "application/octet-stream");
        assert_eq!(file_extension("sem-extensao."), None);
    }
}
