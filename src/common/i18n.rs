// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

// Catálogos embutidos no binário: um JSON plano "chave" -> "texto" por idioma.
const EMBEDDED_CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

type Catalog = HashMap<String, String>;

#[derive(Clone, Debug)]
pub struct I18nStore {
    default_lang: String,
    catalogs: Arc<HashMap<String, Catalog>>,
}

impl I18nStore {
    pub fn from_catalogs(default_lang: &str, catalogs: HashMap<String, Catalog>) -> Self {
        Self {
            default_lang: default_lang.to_string(),
            catalogs: Arc::new(catalogs),
        }
    }

    pub fn load_embedded(default_lang: &str) -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in EMBEDDED_CATALOGS {
            let catalog: Catalog = serde_json::from_str(raw)
                .with_context(|| format!("catálogo de idioma '{}' inválido", lang))?;
            catalogs.insert(lang.to_string(), catalog);
        }

        if !catalogs.contains_key(default_lang) {
            anyhow::bail!("idioma padrão '{}' não tem catálogo", default_lang);
        }

        Ok(Self::from_catalogs(default_lang, catalogs))
    }

    /// Idioma pedido -> idioma padrão -> None
    pub fn translate_opt(&self, lang: &str, key: &str) -> Option<String> {
        self.catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(&self.default_lang).and_then(|c| c.get(key)))
            .cloned()
    }

    /// Sem tradução nenhuma, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.translate_opt(lang, key).unwrap_or_else(|| key.to_string())
    }

    /// Traduz e substitui `{nome}` pelos argumentos.
    pub fn translate_with(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.translate(lang, key);
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load_embedded("en").unwrap()
    }

    #[test]
    fn catalogs_have_the_same_keys() {
        let store = store();
        let en = &store.catalogs["en"];
        let pt = &store.catalogs["pt"];
        for key in en.keys() {
            assert!(pt.contains_key(key), "pt sem a chave {key}");
        }
        assert_eq!(en.len(), pt.len());
    }

    #[test]
    fn unknown_language_falls_back_to_default() {
        let store = store();
        assert_eq!(
            store.translate("fr", "error.missing_file"),
            store.translate("en", "error.missing_file")
        );
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(store().translate("pt", "error.nao_existe"), "error.nao_existe");
        assert_eq!(store().translate_opt("pt", "error.nao_existe"), None);
    }

    #[test]
    fn interpolates_arguments() {
        let text = store().translate_with("pt", "error.invalid_transition", &[("from", "a"), ("to", "b")]);
        assert_eq!(text, "Não é possível mover o lead de a para b.");
    }

    #[test]
    fn every_stage_has_a_label() {
        let store = store();
        for stage in crate::domain::Stage::ALL {
            assert!(store.translate_opt("pt", &stage.label_key()).is_some());
        }
    }

    #[test]
    fn rejects_default_without_catalog() {
        assert!(I18nStore::load_embedded("de").is_err());
    }
}
