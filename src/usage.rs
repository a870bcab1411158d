//! Usage accounting helpers.
//!
//! Token counts are approximated as whitespace-delimited word counts: the word
//! count of the embedded text for embedding calls, and of prompt plus answer
//! for generation calls. Entries are append-only; aggregation belongs to the
//! admin reporting layer, which only reads them.

use std::sync::Arc;

use crate::store::{RecordStore, UsageLog, UsageOperation, now_rfc3339};

/// Approximate token count of `text` as its whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Append one usage log entry attributed to `user_id`.
///
/// Accounting failures are logged and swallowed: a missing meter entry must
/// never fail the model call it describes.
pub async fn record_usage(
    store: &Arc<dyn RecordStore>,
    user_id: &str,
    operation: UsageOperation,
    tokens: usize,
    model: &str,
) {
    let entry = UsageLog {
        user_id: user_id.to_string(),
        operation,
        tokens,
        model: model.to_string(),
        created_at: now_rfc3339(),
    };

    if let Err(error) = store.insert_usage_log(entry).await {
        tracing::warn!(
            user_id,
            ?operation,
            tokens,
            error = %error,
            "Failed to record usage entry"
        );
    }
}
