//! Placeholder unique identifiers

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter behind the `u-u-i-d-{n}` placeholders that replace uuids and
/// external identifiers. Every call yields a new value; nothing maps back.
#[derive(Debug, Default)]
pub struct SyntheticSequence {
    issued: AtomicU64,
}

impl SyntheticSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_uid(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        format!("u-u-i-d-{n}")
    }

    /// Number of placeholders issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}
