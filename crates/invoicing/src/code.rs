//! Invoice codes and their source.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Human-readable invoice reference, e.g. `"Z-000012"`. Customers quote
/// it to validate collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceCode(String);

impl InvoiceCode {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for InvoiceCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The financial side could not hand out a code right now. Transient:
/// the caller keeps the transaction open and retries.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invoice code source unavailable")]
pub struct CodeSourceUnavailable;

/// External source of fresh invoice codes.
pub trait InvoiceCodeSource: Send + Sync {
    fn next_code(&self) -> Result<InvoiceCode, CodeSourceUnavailable>;
}

/// Sequential code source: `Z-000001`, `Z-000002`, …
///
/// A drawn code that is never used (e.g. the following charge is
/// rejected) leaves a visible gap in the sequence; gaps are acceptable,
/// reuse is not.
#[derive(Debug)]
pub struct SequentialCodes {
    prefix: &'static str,
    next: AtomicU64,
}

impl SequentialCodes {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }

    pub fn starting_at(prefix: &'static str, first: u64) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(first),
        }
    }
}

impl InvoiceCodeSource for SequentialCodes {
    fn next_code(&self) -> Result<InvoiceCode, CodeSourceUnavailable> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(InvoiceCode::new(format!("{}-{:06}", self.prefix, n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_sequential_and_formatted() {
        let source = SequentialCodes::starting_at("Z", 12);
        assert_eq!(source.next_code().unwrap().as_str(), "Z-000012");
        assert_eq!(source.next_code().unwrap().as_str(), "Z-000013");
    }

    #[test]
    fn concurrent_draws_never_collide() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let source = Arc::new(SequentialCodes::new("Z"));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let source = Arc::clone(&source);
            handles.push(std::thread::spawn(move || {
                (0..100)
                    .map(|_| source.next_code().unwrap())
                    .collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(seen.insert(code), "duplicate invoice code");
            }
        }
        assert_eq!(seen.len(), 400);
    }
}
