//! Converts storage-driver errors into user-facing messages.

use lazy_static::lazy_static;
use regex::Regex;
use std::error::Error;

use crate::framework::error::StoreError;
use crate::framework::resource::Violation;

/// Message used when a driver error carries no SQLSTATE detail.
pub const INVALID_QUERY_MESSAGE: &str = "Database invalid query";

lazy_static! {
    static ref SQLSTATE_PREFIX: Regex = Regex::new(r"^SQLSTATE\[[0-9A-Z]*\]:").unwrap();
}

/// Turns driver errors into messages safe to show to clients.
///
/// The root of the `source()` chain is inspected. A `SQLSTATE[xxxxx]: detail`
/// message yields `detail`; anything else yields [`INVALID_QUERY_MESSAGE`],
/// suffixed with the root message in brackets in debug mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTranslator {
    debug: bool,
}

impl ErrorTranslator {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn translate(&self, error: &(dyn Error + 'static)) -> String {
        let root = root_cause(error).to_string();

        if SQLSTATE_PREFIX.is_match(&root) {
            if let Some((_, detail)) = root.split_once(':') {
                return detail.trim().to_string();
            }
        }

        if self.debug {
            format!("{} [{}]", INVALID_QUERY_MESSAGE, root)
        } else {
            INVALID_QUERY_MESSAGE.to_string()
        }
    }

    pub fn to_violation(&self, error: &(dyn Error + 'static)) -> Violation {
        Violation::new(self.translate(error))
    }

    /// Violations for a store failure. Structured constraint violations pass
    /// through untouched; everything else is translated into one violation.
    pub fn violations(&self, error: &StoreError) -> Vec<Violation> {
        match error {
            StoreError::Constraints(violations) => violations.clone(),
            other => vec![self.to_violation(other)],
        }
    }
}

fn root_cause<'a>(error: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current
}
