use tracing::debug;

use super::store::{ContextSnapshot, ContextStore};

/// Paired keyword rules: a prior record is related to a new prompt when the
/// keyword occurs in both the prompt and the record's key.
const RELATED_KEYWORDS: &[&str] = &["studio", "workspace", "art", "create"];

/// Retrieve the subset of the store relevant to `prompt`, merging in related
/// prior generations. Read-only; identical inputs yield identical snapshots.
pub fn resolve_context(store: &ContextStore, prompt: &str) -> ContextSnapshot {
    let base = store.snapshot();
    let prompt_lower = prompt.to_lowercase();

    let related: Vec<_> = store
        .records()
        .filter(|record| {
            let key_lower = record.key.to_lowercase();
            RELATED_KEYWORDS
                .iter()
                .any(|keyword| prompt_lower.contains(keyword) && key_lower.contains(keyword))
        })
        .collect();

    if related.is_empty() {
        return base;
    }

    debug!(
        "Merging {} related context(s) for prompt {:?}",
        related.len(),
        prompt
    );

    let mut merged = base;
    for record in related {
        merged.merge_from(&record.context);
    }
    merged
}
