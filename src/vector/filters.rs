//! Filter helpers for scoped vector queries.

use serde_json::{Value, json};

use super::types::SearchScope;

/// Compose the filter restricting a search to one user's one document.
///
/// Both clauses are always present. The scope is the isolation boundary for
/// search, so there is deliberately no variant of this filter with fewer
/// constraints.
pub fn build_scope_filter(scope: &SearchScope) -> Value {
    json!({
        "must": [
            {
                "key": "user_id",
                "match": { "value": scope.user_id }
            },
            {
                "key": "document_id",
                "match": { "value": scope.document_id }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_filter_constrains_user_and_document() {
        let filter = build_scope_filter(&SearchScope {
            user_id: "user-a".into(),
            document_id: "doc-1".into(),
        });

        assert_eq!(
            filter,
            json!({
                "must": [
                    {
                        "key": "user_id",
                        "match": { "value": "user-a" }
                    },
                    {
                        "key": "document_id",
                        "match": { "value": "doc-1" }
                    }
                ]
            })
        );
    }
}
