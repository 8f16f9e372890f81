use std::collections::HashSet;

use crate::error::Error;
use crate::kernel::database::Database;
use crate::syntax::{reader, writer};

/// Parses database text that is expected to be valid.
pub fn read(text: &str) -> Database {
    match reader::read_database(text) {
        Ok(db) => db,
        Err(e) => panic!("failed to read database: {}", e),
    }
}

/// Parses database text that is expected to be rejected.
pub fn read_err(text: &str) -> Error {
    match reader::read_database(text) {
        Ok(_) => panic!("expected the database to be rejected"),
        Err(e) => e,
    }
}

/// One read-write cycle.
pub fn rewrite(text: &str) -> String {
    writer::write_database(&read(text))
}

/// Checks the global invariant: symbols, assertions, and every named
/// hypothesis of every assertion have pairwise distinct labels.
pub fn assert_labels_unique(db: &Database) {
    let mut seen = HashSet::new();
    let mut claim = |label: &str| {
        assert!(seen.insert(label.to_string()), "label \"{}\" appears twice", label);
    };
    for symbol in db.constants().iter().chain(db.variables()) {
        claim(&symbol.label);
    }
    for assertion in db.assertions() {
        claim(&assertion.label);
        for hypothesis in &assertion.floating_hypotheses {
            claim(&hypothesis.label);
        }
        for hypothesis in &assertion.essential_hypotheses {
            claim(&hypothesis.label);
        }
        for hypothesis in &assertion.proof.floating_hypotheses {
            claim(&hypothesis.label);
        }
    }
}
