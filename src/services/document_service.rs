// src/services/document_service.rs

use std::sync::Arc;

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DocumentRepository, LeadRepository},
    domain::Stage,
    models::{
        auth::User,
        document::{
            content_type_for, file_extension, DocTypeTag, DocumentBuckets, DocumentView, FileKind,
            LeadDocument, UploadedFile,
        },
    },
    services::lead_service::{ensure_can_act, stage_visible},
    storage::{FileStorage, UrlSigner},
};

// Chave interna: empresa/lead/uuid.ext (o nome original fica só no banco)
fn storage_key(vendor_id: Uuid, lead_id: Uuid, extension: &str) -> String {
    format!("{}/{}/{}.{}", vendor_id, lead_id, Uuid::new_v4(), extension)
}

/// Rejeita o lote inteiro se algum arquivo tiver extensão não aceita.
fn classify(files: &[UploadedFile]) -> Result<Vec<(FileKind, String)>, AppError> {
    if files.is_empty() {
        return Err(AppError::MissingFile);
    }
    files
        .iter()
        .map(|file| {
            let kind = FileKind::from_file_name(&file.file_name)
                .ok_or_else(|| AppError::UnsupportedFile(file.file_name.clone()))?;
            let ext = file_extension(&file.file_name)
                .ok_or_else(|| AppError::UnsupportedFile(file.file_name.clone()))?;
            Ok((kind, ext))
        })
        .collect()
}

#[derive(Clone)]
pub struct DocumentService {
    repo: DocumentRepository,
    lead_repo: LeadRepository,
    storage: Arc<dyn FileStorage>,
    signer: UrlSigner,
}

impl DocumentService {
    pub fn new(
        repo: DocumentRepository,
        lead_repo: LeadRepository,
        storage: Arc<dyn FileStorage>,
        signer: UrlSigner,
    ) -> Self {
        Self { repo, lead_repo, storage, signer }
    }

    /// Cada listagem gera links novos; nada assinado fica salvo.
    pub fn to_view(&self, document: &LeadDocument) -> DocumentView {
        DocumentView {
            id: document.id,
            original_name: document.original_name.clone(),
            signed_url: self.signer.sign(&document.storage_key),
            created_at: document.created_at,
            doc_type_tag: document.doc_type_tag.clone(),
            stage: document.stage.clone(),
            // Extensões são checadas no upload; linhas antigas caem em "document"
            kind: FileKind::from_file_name(&document.original_name).unwrap_or(FileKind::Document),
            size_bytes: document.size_bytes,
        }
    }

    pub async fn upload<'e, E>(
        &self,
        executor: E,
        actor: &User,
        lead_id: Uuid,
        stage: Stage,
        doc_type: DocTypeTag,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<DocumentView>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let classified = classify(&files)?;

        let mut tx = executor.begin().await?;

        let lead = self
            .lead_repo
            .find_lead(&mut *tx, actor.vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        ensure_can_act(&lead, stage, actor.user_type())?;

        let keys: Vec<String> = classified
            .iter()
            .map(|(_, ext)| storage_key(actor.vendor_id, lead_id, ext))
            .collect();
        self.store_all(&files, &keys).await?;

        // Arquivos já estão no disco: se o banco falhar, eles saem
        let persisted: Result<Vec<DocumentView>, AppError> = async {
            let mut views = Vec::with_capacity(files.len());
            for (file, key) in files.iter().zip(keys.iter()) {
                let document = self
                    .repo
                    .insert_document(
                        &mut *tx,
                        actor.vendor_id,
                        lead_id,
                        stage.as_str(),
                        doc_type.as_str(),
                        &file.file_name,
                        key,
                        file.content_type.as_deref(),
                        file.bytes.len() as i64,
                        actor.id,
                    )
                    .await?;
                views.push(self.to_view(&document));
            }
            tx.commit().await?;
            Ok(views)
        }
        .await;

        let views = match persisted {
            Ok(views) => views,
            Err(e) => {
                self.discard(&keys).await;
                return Err(e);
            }
        };

        tracing::info!(
            "📎 {} arquivo(s) '{}' no lead #{} ({})",
            views.len(),
            doc_type.as_str(),
            lead.lead_code,
            stage
        );
        Ok(views)
    }

    /// Grava o lote inteiro ou nada: numa falha, remove o que já foi escrito.
    async fn store_all(&self, files: &[UploadedFile], keys: &[String]) -> Result<(), AppError> {
        for (written, (file, key)) in files.iter().zip(keys.iter()).enumerate() {
            if let Err(e) = self.storage.put(key, &file.bytes).await {
                self.discard(&keys[..written]).await;
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn discard(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!("Arquivo órfão {} não removido: {}", key, e);
            }
        }
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        vendor_id: Uuid,
        lead_id: Uuid,
        stage: Option<&str>,
        doc_type: Option<&str>,
    ) -> Result<DocumentBuckets, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let stage = stage
            .map(|s| s.parse::<Stage>().map_err(AppError::from))
            .transpose()?;
        let doc_type = doc_type
            .map(|t| t.parse::<DocTypeTag>().map_err(AppError::InvalidDocType))
            .transpose()?;

        // Leitura dentro de transação, como nas escritas
        let mut tx = executor.begin().await?;

        let lead = self
            .lead_repo
            .find_lead(&mut *tx, vendor_id, lead_id)
            .await?
            .ok_or(AppError::LeadNotFound(lead_id))?;

        if let Some(stage) = stage {
            if !stage_visible(&lead, stage) {
                return Err(AppError::StageNotReached(stage));
            }
        }

        let documents = self
            .repo
            .list_documents(
                &mut *tx,
                vendor_id,
                lead_id,
                stage.map(|s| s.as_str()),
                doc_type.map(|t| t.as_str()),
            )
            .await?;
        tx.commit().await?;

        let mut buckets = DocumentBuckets::default();
        for document in &documents {
            buckets.push(self.to_view(document));
        }
        Ok(buckets)
    }

    /// Download pelo link assinado: sem JWT, a assinatura é a autorização.
    pub async fn download(&self, key: &str, expires: i64, sig: &str) -> Result<(Vec<u8>, &'static str), AppError> {
        if !self.signer.verify(key, expires, sig) {
            return Err(AppError::InvalidSignature);
        }

        let bytes = self.storage.get(key).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::FileNotFound,
            _ => AppError::StorageError(e),
        })?;

        Ok((bytes, content_type_for(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalFileStorage;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.into(),
            content_type: None,
            bytes: b"conteudo".to_vec(),
        }
    }

    fn service(root: std::path::PathBuf) -> DocumentService {
        DocumentService::new(
            DocumentRepository::new(),
            LeadRepository::new(),
            Arc::new(LocalFileStorage::new(root)),
            UrlSigner::new("segredo", "http://localhost:3000".into(), 600).unwrap(),
        )
    }

    #[test]
    fn classify_rejects_whole_batch_on_unsupported_file() {
        let files = vec![file("planta.pdf"), file("virus.exe")];
        assert!(matches!(classify(&files), Err(AppError::UnsupportedFile(n)) if n == "virus.exe"));
    }

    #[test]
    fn classify_requires_at_least_one_file() {
        assert!(matches!(classify(&[]), Err(AppError::MissingFile)));
    }

    #[test]
    fn classify_keeps_order_and_extension() {
        let classified = classify(&[file("sala.JPG"), file("orcamento.pdf")]).unwrap();
        assert_eq!(classified[0], (FileKind::Image, "jpg".to_string()));
        assert_eq!(classified[1], (FileKind::Document, "pdf".to_string()));
    }

    #[test]
    fn storage_key_is_scoped_by_vendor_and_lead() {
        let vendor = Uuid::new_v4();
        let lead = Uuid::new_v4();
        let key = storage_key(vendor, lead, "pdf");
        assert!(key.starts_with(&format!("{}/{}/", vendor, lead)));
        assert!(key.ends_with(".pdf"));
    }

    // Disco que recusa gravar um nome específico
    struct FailingOn {
        inner: LocalFileStorage,
        bad_suffix: &'static str,
    }

    #[async_trait::async_trait]
    impl FileStorage for FailingOn {
        async fn put(&self, key: &str, bytes: &[u8]) -> std::io::Result<()> {
            if key.ends_with(self.bad_suffix) {
                return Err(std::io::Error::other("disco cheio"));
            }
            self.inner.put(key, bytes).await
        }
        async fn get(&self, key: &str) -> std::io::Result<Vec<u8>> {
            self.inner.get(key).await
        }
        async fn delete(&self, key: &str) -> std::io::Result<()> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn failed_batch_write_removes_files_already_stored() {
        let dir = tempfile::tempdir().unwrap();
        let inner = LocalFileStorage::new(dir.path().to_path_buf());
        let service = DocumentService::new(
            DocumentRepository::new(),
            LeadRepository::new(),
            Arc::new(FailingOn { inner: inner.clone(), bad_suffix: ".png" }),
            UrlSigner::new("segredo", "http://localhost:3000".into(), 600).unwrap(),
        );

        let files = vec![file("a.pdf"), file("b.jpg"), file("c.png")];
        let keys = vec!["v/l/1.pdf".to_string(), "v/l/2.jpg".to_string(), "v/l/3.png".to_string()];

        let result = service.store_all(&files, &keys).await;
        assert!(matches!(result, Err(AppError::StorageError(_))));
        assert!(inner.get("v/l/1.pdf").await.is_err());
        assert!(inner.get("v/l/2.jpg").await.is_err());
    }

    #[tokio::test]
    async fn discard_removes_every_stored_key() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path().to_path_buf());
        let keys = vec!["v/l/1.pdf".to_string(), "v/l/2.pdf".to_string()];
        service.store_all(&[file("a.pdf"), file("b.pdf")], &keys).await.unwrap();
        assert_eq!(service.storage.get("v/l/2.pdf").await.unwrap(), b"conteudo");

        service.discard(&keys).await;
        assert!(service.storage.get("v/l/1.pdf").await.is_err());
        assert!(service.storage.get("v/l/2.pdf").await.is_err());
    }

    #[tokio::test]
    async fn download_checks_signature_and_serves_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path().to_path_buf());
        service.storage.put("v/l/a.pdf", b"%PDF").await.unwrap();

        let url = service.signer.sign("v/l/a.pdf");
        let query = url.split_once('?').unwrap().1;
        let mut expires = 0;
        let mut sig = "";
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = v.parse().unwrap(),
                Some(("sig", v)) => sig = v,
                _ => {}
            }
        }

        let (bytes, content_type) = service.download("v/l/a.pdf", expires, sig).await.unwrap();
        assert_eq!(bytes, b"%PDF");
        assert_eq!(content_type, "application/pdf");

        assert!(matches!(
            service.download("v/l/a.pdf", expires, "forjada").await,
            Err(AppError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn download_of_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path().to_path_buf());
        let url = service.signer.sign("v/l/sumiu.pdf");
        let (_, query) = url.split_once('?').unwrap();
        let (expires, sig) = query.split_once('&').unwrap();
        let expires: i64 = expires.trim_start_matches("expires=").parse().unwrap();
        let sig = sig.trim_start_matches("sig=");

        assert!(matches!(
            service.download("v/l/sumiu.pdf", expires, sig).await,
            Err(AppError::FileNotFound)
        ));
    }
}
