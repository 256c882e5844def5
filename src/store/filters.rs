//! Filter helpers for vector store queries.

use serde_json::{Value, json};

use super::types::QueryFilter;

/// Compose the Qdrant filter payload from optional query predicates.
///
/// Returns `None` when no predicate is set so the query body stays minimal.
pub fn build_query_filter(filter: &QueryFilter) -> Option<Value> {
    let mut must: Vec<Value> = Vec::new();

    if let Some(language) = filter.language.as_ref().and_then(|value| non_empty(value)) {
        must.push(json!({
            "key": "language",
            "match": { "value": language }
        }));
    }

    if let Some(app_name) = filter.app_name.as_ref().and_then(|value| non_empty(value)) {
        must.push(json!({
            "key": "app_name",
            "match": { "value": app_name }
        }));
    }

    if let Some(doc_type) = filter.doc_type.as_ref().and_then(|value| non_empty(value)) {
        must.push(json!({
            "key": "type",
            "match": { "value": doc_type }
        }));
    }

    if must.is_empty() {
        None
    } else {
        Some(json!({ "must": must }))
    }
}

fn non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_query_filter_handles_language() {
        let filter = build_query_filter(&QueryFilter {
            language: Some("ckb".into()),
            ..Default::default()
        })
        .expect("filter");

        assert_eq!(
            filter,
            json!({
                "must": [
                    {
                        "key": "language",
                        "match": { "value": "ckb" }
                    }
                ]
            })
        );
    }

    #[test]
    fn build_query_filter_combines_predicates() {
        let filter = build_query_filter(&QueryFilter {
            language: Some("en".into()),
            app_name: Some("self-care".into()),
            doc_type: Some("article".into()),
        })
        .expect("filter");

        let must = filter["must"].as_array().expect("must clause");
        assert_eq!(must.len(), 3);
        assert_eq!(must[1]["key"], "app_name");
        assert_eq!(must[1]["match"]["value"], "self-care");
        assert_eq!(must[2]["match"]["value"], "article");
    }

    #[test]
    fn build_query_filter_ignores_blank_values() {
        let filter = build_query_filter(&QueryFilter {
            language: Some("   ".into()),
            ..Default::default()
        });
        assert!(filter.is_none());
    }

    #[test]
    fn build_query_filter_returns_none_when_empty() {
        assert!(build_query_filter(&QueryFilter::default()).is_none());
    }
}
