use crate::term::{format_term, TermId, TermStore};
use std::sync::Arc;

/// A fresh shared term store.
pub(crate) fn setup() -> Arc<TermStore> {
    Arc::new(TermStore::new())
}

/// Render a batch of reified answers for readable assertions.
#[allow(dead_code)]
pub(crate) fn rendered(res: &[TermId], store: &TermStore) -> Vec<String> {
    res.iter().map(|t| format_term(*t, store)).collect()
}
