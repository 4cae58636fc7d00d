// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        DocumentRepository, InstallationRepository, LeadRepository, PaymentRepository,
        UserRepository, VendorRepository,
    },
    services::{
        auth::AuthService, document_service::DocumentService,
        installation_service::InstallationService, lead_service::LeadService,
        payment_service::PaymentService, user_service::UserService,
    },
    storage::{FileStorage, LocalFileStorage, UrlSigner},
};

// Valores lidos do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub signed_url_ttl_secs: i64,
    pub default_locale: String,
    pub max_upload_bytes: usize,
}

fn required<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).with_context(|| format!("{} deve ser definida", key))
}

fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} inválida: '{}'", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave/valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        // 0.0.0.0 não é endereço de cliente: o padrão usa localhost na mesma porta
        let port = bind_addr.rsplit_once(':').map_or("3000", |(_, port)| port);
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            db_max_connections: parsed_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string())),
            signed_url_ttl_secs: parsed_or(&lookup, "SIGNED_URL_TTL_SECS", 900)?,
            default_locale: lookup("DEFAULT_LOCALE").unwrap_or_else(|| "en".to_string()),
            max_upload_bytes: parsed_or(&lookup, "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            bind_addr,
            public_base_url,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub lead_service: LeadService,
    pub document_service: DocumentService,
    pub payment_service: PaymentService,
    pub installation_service: InstallationService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let i18n_store = I18nStore::load_embedded(&config.default_locale)?;

        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .with_context(|| format!("Falha ao criar {}", config.upload_dir.display()))?;
        let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(config.upload_dir.clone()));
        let signer = UrlSigner::new(
            &config.jwt_secret,
            config.public_base_url.clone(),
            config.signed_url_ttl_secs,
        )
        .map_err(|_| anyhow::anyhow!("JWT_SECRET inválido para assinar links"))?;

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let vendor_repo = VendorRepository::new();
        let lead_repo = LeadRepository::new();
        let document_repo = DocumentRepository::new();
        let payment_repo = PaymentRepository::new();
        let installation_repo = InstallationRepository::new();

        let auth_service = AuthService::new(
            user_repo.clone(),
            vendor_repo,
            config.jwt_secret.clone(),
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo.clone());
        let lead_service = LeadService::new(
            lead_repo.clone(),
            user_repo.clone(),
            payment_repo.clone(),
            document_repo.clone(),
        );
        let document_service =
            DocumentService::new(document_repo, lead_repo.clone(), storage, signer);
        let payment_service = PaymentService::new(payment_repo, lead_repo.clone());
        let installation_service =
            InstallationService::new(installation_repo, lead_repo, user_repo);

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            auth_service,
            user_service,
            lead_service,
            document_service,
            payment_service,
            installation_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/leads"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.signed_url_ttl_secs, 900);
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.public_base_url, "http://localhost:3000");
    }

    #[test]
    fn default_base_url_follows_bind_port_on_localhost() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/leads"),
            ("JWT_SECRET", "segredo"),
            ("BIND_ADDR", "0.0.0.0:8080"),
        ]))
        .unwrap();
        assert_eq!(config.public_base_url, "http://localhost:8080");
    }

    #[test]
    fn requires_database_url_and_secret() {
        assert!(Config::from_lookup(lookup_from(&[("JWT_SECRET", "x")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DATABASE_URL", "x")])).is_err());
    }

    #[test]
    fn rejects_malformed_numbers() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/leads"),
            ("JWT_SECRET", "segredo"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/leads"),
            ("JWT_SECRET", "segredo"),
            ("PUBLIC_BASE_URL", "https://api.interiores.com/"),
        ]))
        .unwrap();
        assert_eq!(config.public_base_url, "https://api.interiores.com");
    }
}
