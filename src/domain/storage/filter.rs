//! Containment filters over stored documents

use serde_json::Value;

/// A JSON pattern a document must contain to match
///
/// Follows PostgreSQL `jsonb @>` semantics: objects match when every pattern
/// key is contained in the document's value for that key, arrays match when
/// every pattern element is contained in some document element, and scalars
/// compare by equality. The top-level "array contains scalar" shorthand is
/// not supported.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFilter(Value);

impl DocumentFilter {
    pub fn new(pattern: Value) -> Self {
        Self(pattern)
    }

    pub fn pattern(&self) -> &Value {
        &self.0
    }

    pub fn matches(&self, document: &Value) -> bool {
        contains(document, &self.0)
    }
}

fn contains(document: &Value, pattern: &Value) -> bool {
    match (document, pattern) {
        (Value::Object(doc), Value::Object(pat)) => pat
            .iter()
            .all(|(key, value)| doc.get(key).is_some_and(|field| contains(field, value))),
        (Value::Array(doc), Value::Array(pat)) => pat
            .iter()
            .all(|wanted| doc.iter().any(|item| contains(item, wanted))),
        (doc, pat) => doc == pat,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user_doc() -> Value {
        json!({
            "email": "ada@example.com",
            "confirmed_team": false,
            "team_info": {
                "team_id": null,
                "pending_invites": [
                    {"team_id": "t-1", "team_name": "Alpha Team"},
                    {"team_id": "t-2", "team_name": "Beta Team"}
                ]
            }
        })
    }

    #[test]
    fn test_nested_array_element() {
        let doc = user_doc();

        let t2 = DocumentFilter::new(json!({"team_info": {"pending_invites": [{"team_id": "t-2"}]}}));
        let t3 = DocumentFilter::new(json!({"team_info": {"pending_invites": [{"team_id": "t-3"}]}}));

        assert!(t2.matches(&doc));
        assert!(!t3.matches(&doc));
    }

    #[test]
    fn test_every_pattern_key_must_match() {
        let doc = user_doc();

        assert!(DocumentFilter::new(json!({})).matches(&doc));
        assert!(DocumentFilter::new(json!({"confirmed_team": false})).matches(&doc));
        assert!(!DocumentFilter::new(json!({"confirmed_team": false, "email": "eve@example.com"}))
            .matches(&doc));
        assert!(!DocumentFilter::new(json!({"missing": null})).matches(&doc));
    }

    #[test]
    fn test_array_pattern_elements_match_independently() {
        let doc = json!({"tags": ["a", "b", "c"]});

        assert!(DocumentFilter::new(json!({"tags": ["c", "a"]})).matches(&doc));
        assert!(DocumentFilter::new(json!({"tags": []})).matches(&doc));
        assert!(!DocumentFilter::new(json!({"tags": ["d"]})).matches(&doc));
        assert!(!DocumentFilter::new(json!({"tags": "a"})).matches(&doc));
    }
}
