// src/storage.rs

// Armazenamento dos arquivos enviados e assinatura dos links de download.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
    async fn get(&self, key: &str) -> io::Result<Vec<u8>>;
    async fn delete(&self, key: &str) -> io::Result<()>;
}

// Disco local: a chave vira um caminho relativo dentro de `root`
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, key: &str) -> io::Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("chave de arquivo inválida: {}", key),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await
    }

    async fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(key)?).await
    }

    // Apagar o que já não existe não é erro
    async fn delete(&self, key: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.resolve(key)?).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Links temporários: sig = base64url(HMAC-SHA256(segredo, "chave:expira")).
#[derive(Clone)]
pub struct UrlSigner {
    keyed: HmacSha256,
    base_url: String,
    ttl_secs: i64,
}

impl UrlSigner {
    pub fn new(
        secret: &str,
        base_url: String,
        ttl_secs: i64,
    ) -> Result<Self, hmac::digest::InvalidLength> {
        let keyed = HmacSha256::new_from_slice(secret.as_bytes())?;
        Ok(Self { keyed, base_url, ttl_secs })
    }

    fn mac(&self, key: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(key.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    fn signature(&self, key: &str, expires: i64) -> String {
        let tag = self.mac(key, expires).finalize().into_bytes();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag)
    }

    pub fn sign_at(&self, key: &str, now: i64) -> String {
        let expires = now + self.ttl_secs;
        format!(
            "{}/files/{}?expires={}&sig={}",
            self.base_url,
            key,
            expires,
            self.signature(key, expires)
        )
    }

    pub fn sign(&self, key: &str) -> String {
        self.sign_at(key, Utc::now().timestamp())
    }

    pub fn verify_at(&self, key: &str, expires: i64, sig: &str, now: i64) -> bool {
        if expires < now {
            return false;
        }
        let Ok(decoded) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(sig) else {
            return false;
        };
        // verify_slice compara em tempo constante
        self.mac(key, expires).verify_slice(&decoded).is_ok()
    }

    pub fn verify(&self, key: &str, expires: i64, sig: &str) -> bool {
        self.verify_at(key, expires, sig, Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UrlSigner {
        UrlSigner::new("segredo", "https://api.interiores.com".into(), 600).unwrap()
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let (_, query) = url.split_once('?').unwrap();
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap()
    }

    #[test]
    fn signed_url_verifies_until_expiry() {
        let signer = signer();
        let url = signer.sign_at("v1/l1/a.pdf", 1_000);
        assert!(url.starts_with("https://api.interiores.com/files/v1/l1/a.pdf?"));

        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let sig = query_param(&url, "sig");
        assert_eq!(expires, 1_600);
        assert!(signer.verify_at("v1/l1/a.pdf", expires, sig, 1_599));
        assert!(!signer.verify_at("v1/l1/a.pdf", expires, sig, 1_601));
    }

    #[test]
    fn signature_is_url_safe() {
        let url = signer().sign_at("v1/l1/foto.jpg", 0);
        let sig = query_param(&url, "sig");
        assert!(sig.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tampering_breaks_the_signature() {
        let signer = signer();
        let url = signer.sign_at("v1/l1/a.pdf", 0);
        let sig = query_param(&url, "sig");
        assert!(!signer.verify_at("v1/l1/b.pdf", 600, sig, 0));
        assert!(!signer.verify_at("v1/l1/a.pdf", 6_000, sig, 0));

        let other = UrlSigner::new("outro", "https://api.interiores.com".into(), 600).unwrap();
        assert!(!other.verify_at("v1/l1/a.pdf", 600, sig, 0));
    }

    #[test]
    fn garbage_or_truncated_signature_is_rejected() {
        let signer = signer();
        let url = signer.sign_at("v1/l1/a.pdf", 0);
        let sig = query_param(&url, "sig");
        assert!(!signer.verify_at("v1/l1/a.pdf", 600, "não-é-base64!", 0));
        assert!(!signer.verify_at("v1/l1/a.pdf", 600, &sig[..sig.len() - 4], 0));
        assert!(!signer.verify_at("v1/l1/a.pdf", 600, "", 0));
    }

    #[test]
    fn signature_is_hmac_sha256_of_key_and_expiry() {
        let signer = signer();
        let url = signer.sign_at("v1/l1/a.pdf", 0);
        let sig = query_param(&url, "sig");

        let mut mac = HmacSha256::new_from_slice(b"segredo").unwrap();
        mac.update(b"v1/l1/a.pdf:600");
        let expected =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        assert_eq!(sig, expected);
    }

    #[tokio::test]
    async fn local_storage_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf());

        storage.put("v1/l1/planta.pdf", b"%PDF-1.7").await.unwrap();
        let bytes = storage.get("v1/l1/planta.pdf").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn local_storage_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf());

        storage.put("v1/l1/foto.png", b"png").await.unwrap();
        storage.delete("v1/l1/foto.png").await.unwrap();
        assert!(storage.get("v1/l1/foto.png").await.is_err());
        storage.delete("v1/l1/foto.png").await.unwrap();
    }

    #[tokio::test]
    async fn local_storage_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf());

        assert!(storage.put("../fora.txt", b"x").await.is_err());
        assert!(storage.get("/etc/passwd").await.is_err());
        assert!(storage.get("").await.is_err());
    }
}
