//! Parsing and record emission for structured knowledge-base articles.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use super::types::IndexItemError;
use crate::language::SUPPORTED_LANGUAGES;

/// One structured article as it appears in the source tree.
///
/// Title and body are keyed by language tag; an absent language is an empty
/// string, never a missing record. At least one language variant is expected
/// to be non-empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    /// Stable article identifier.
    #[serde(deserialize_with = "string_or_number")]
    pub article_id: String,
    /// Application scope tag (`ana`, `self-care`, `hakki`, ...).
    #[serde(default)]
    pub app_name: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Per-language titles.
    #[serde(default)]
    pub title: BTreeMap<String, String>,
    /// Per-language bodies.
    #[serde(default)]
    pub body: BTreeMap<String, String>,
}

/// One non-empty language variant of an article, ready for embedding.
#[derive(Debug, Clone)]
pub struct ArticleVariant {
    /// Language tag of the variant.
    pub language: &'static str,
    /// Title in the variant language (possibly empty).
    pub title: String,
    /// Payload submitted to the embedding model.
    pub payload: String,
}

impl Article {
    /// Emit one variant per supported language with any content.
    ///
    /// The payload format is `"[Article {id}] [{app}] {title}\n{body}"`, which
    /// keeps the identity and scope visible to the retriever and the prompt.
    pub fn language_variants(&self) -> Vec<ArticleVariant> {
        SUPPORTED_LANGUAGES
            .iter()
            .filter_map(|language| {
                let title = self.field(&self.title, language);
                let body = self.field(&self.body, language);
                if title.is_empty() && body.is_empty() {
                    return None;
                }
                Some(ArticleVariant {
                    language,
                    title: title.to_string(),
                    payload: format!(
                        "[Article {}] [{}] {}\n{}",
                        self.article_id, self.app_name, title, body
                    ),
                })
            })
            .collect()
    }

    fn field<'a>(&self, map: &'a BTreeMap<String, String>, language: &str) -> &'a str {
        map.get(language).map(String::as_str).unwrap_or("").trim()
    }
}

/// Accept both a bare article list and a `{ "articles": [...] }` wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum ArticleFile {
    List(Vec<Value>),
    Wrapped { articles: Vec<Value> },
}

/// Parse one article JSON file, isolating per-item failures.
///
/// A malformed element is recorded against its position and skipped; the rest
/// of the file still indexes. Only a file that is not valid JSON at all (or
/// not shaped like an article collection) fails as a whole.
pub fn parse_article_file(
    source: &str,
    contents: &str,
) -> Result<(Vec<Article>, Vec<IndexItemError>), serde_json::Error> {
    let file: ArticleFile = serde_json::from_str(contents)?;
    let items = match file {
        ArticleFile::List(items) => items,
        ArticleFile::Wrapped { articles } => articles,
    };

    let mut parsed = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (position, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Article>(item) {
            Ok(article) => parsed.push(article),
            Err(error) => errors.push(IndexItemError {
                source: format!("{source}#{position}"),
                message: error.to_string(),
            }),
        }
    }

    Ok((parsed, errors))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "article_id must be a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_cover_each_non_empty_language() {
        let article: Article = serde_json::from_value(serde_json::json!({
            "article_id": "17",
            "app_name": "ana",
            "title": { "en": "Reset password", "ar": "إعادة تعيين كلمة المرور", "ckb": "" },
            "body": { "en": "Open settings.", "ar": "افتح الإعدادات.", "ckb": "" }
        }))
        .expect("article");

        let variants = article.language_variants();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].language, "en");
        assert_eq!(
            variants[0].payload,
            "[Article 17] [ana] Reset password\nOpen settings."
        );
        assert_eq!(variants[1].language, "ar");
    }

    #[test]
    fn variant_survives_with_only_a_body() {
        let article: Article = serde_json::from_value(serde_json::json!({
            "article_id": 42,
            "app_name": "self-care",
            "body": { "kmr": "Vegerandina SIMê" }
        }))
        .expect("article");

        let variants = article.language_variants();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].language, "kmr");
        assert_eq!(variants[0].title, "");
        // Numeric ids normalize to their decimal rendering.
        assert!(variants[0].payload.starts_with("[Article 42] [self-care] "));
    }

    #[test]
    fn unsupported_languages_are_ignored() {
        let article: Article = serde_json::from_value(serde_json::json!({
            "article_id": "9",
            "title": { "fr": "Bonjour", "en": "Hello" },
            "body": { "fr": "Texte", "en": "Text" }
        }))
        .expect("article");

        let variants = article.language_variants();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].language, "en");
    }

    #[test]
    fn parse_accepts_bare_list_and_wrapper() {
        let bare = r#"[{"article_id": "1", "title": {"en": "A"}, "body": {"en": "B"}}]"#;
        let (articles, errors) = parse_article_file("a.json", bare).expect("parse");
        assert_eq!(articles.len(), 1);
        assert!(errors.is_empty());

        let wrapped =
            r#"{"articles": [{"article_id": "2", "title": {"en": "A"}, "body": {"en": "B"}}]}"#;
        let (articles, errors) = parse_article_file("b.json", wrapped).expect("parse");
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].article_id, "2");
        assert!(errors.is_empty());
    }

    #[test]
    fn malformed_items_are_skipped_not_fatal() {
        let contents = r#"[
            {"article_id": "1", "title": {"en": "Good"}, "body": {"en": "Body"}},
            {"title": {"en": "Missing id"}},
            {"article_id": "3", "title": {"en": "Also good"}, "body": {"en": "Body"}}
        ]"#;
        let (articles, errors) = parse_article_file("kb.json", contents).expect("parse");
        assert_eq!(articles.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].source, "kb.json#1");
    }

    #[test]
    fn invalid_json_fails_the_file() {
        assert!(parse_article_file("broken.json", "not json").is_err());
    }
}
