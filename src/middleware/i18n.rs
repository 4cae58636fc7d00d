// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

const DEFAULT_LANG: &str = "en";

// Extrator de idioma (primeira tag do Accept-Language, sem a região)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                // parse já ordena pelo peso `q`
                accept_language::parse(header_str)
                    .first()
                    .map(|tag_string| {
                        // "pt-BR" -> "pt"
                        tag_string
                            .split('-')
                            .next()
                            .unwrap_or(tag_string)
                            .to_ascii_lowercase()
                    })
            })
            .filter(|lang| !lang.is_empty() && lang != "*")
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn strips_region() {
        assert_eq!(Locale::from_headers(&headers("pt-BR,pt;q=0.9")).0, "pt");
    }

    #[test]
    fn honours_quality_weights() {
        assert_eq!(Locale::from_headers(&headers("en;q=0.5, pt-BR;q=0.9")).0, "pt");
    }

    #[test]
    fn defaults_to_english() {
        assert_eq!(Locale::from_headers(&HeaderMap::new()).0, "en");
        assert_eq!(Locale::from_headers(&headers("*")).0, "en");
    }

    #[tokio::test]
    async fn extracts_from_request_parts() {
        let (mut parts, _) = Request::builder()
            .header(header::ACCEPT_LANGUAGE, "pt")
            .body(())
            .unwrap()
            .into_parts();
        let locale = Locale::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(locale, Locale("pt".into()));
    }
}
