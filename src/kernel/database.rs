use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::kernel::assertion::{Assertion, AssertionId};
use crate::kernel::symbol::{Symbol, SymbolId, SymbolKind};

/// The store: every constant, variable, and assertion of a database, held
/// in insertion order and addressed by dense typed indices.
///
/// Labels live in one shared namespace. Symbols, assertions, and every named
/// hypothesis of every stored assertion reserve their label here, so a label
/// can never mean two things. The store is append-only; nothing is ever
/// removed, so indices stay valid for the life of the database.
#[derive(Default)]
pub struct Database {
    constants: Vec<Symbol>,
    variables: Vec<Symbol>,
    assertions: Vec<Assertion>,
    symbols_by_label: HashMap<String, SymbolId>,
    assertions_by_label: HashMap<String, AssertionId>,
    reserved_labels: HashSet<String>,
}

impl Database {
    pub fn new() -> Database {
        Database::default()
    }

    pub fn add_constant(&mut self, label: &str) -> Result<SymbolId> {
        self.add_symbol(label, SymbolKind::Constant)
    }

    pub fn add_variable(&mut self, label: &str) -> Result<SymbolId> {
        self.add_symbol(label, SymbolKind::Variable)
    }

    fn add_symbol(&mut self, label: &str, kind: SymbolKind) -> Result<SymbolId> {
        if !self.reserved_labels.insert(label.to_string()) {
            return Err(Error::DuplicateLabel(label.to_string()));
        }
        let table = match kind {
            SymbolKind::Constant => &mut self.constants,
            SymbolKind::Variable => &mut self.variables,
        };
        let id = SymbolId {
            kind,
            index: table.len() as u32,
        };
        table.push(Symbol {
            label: label.to_string(),
            kind,
        });
        self.symbols_by_label.insert(label.to_string(), id);
        Ok(id)
    }

    pub fn find_symbol(&self, label: &str) -> Option<SymbolId> {
        self.symbols_by_label.get(label).copied()
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        match id.kind {
            SymbolKind::Constant => &self.constants[id.index as usize],
            SymbolKind::Variable => &self.variables[id.index as usize],
        }
    }

    pub fn label(&self, id: SymbolId) -> &str {
        &self.symbol(id).label
    }

    /// Stores an assertion, reserving its label and the labels of all of
    /// its named hypotheses as one batch. When any of them is already taken
    /// (or repeats within the batch) nothing at all is recorded.
    pub fn add_assertion(&mut self, assertion: Assertion) -> Result<AssertionId> {
        {
            let mut batch: Vec<&str> = Vec::new();
            batch.push(&assertion.label);
            for hypothesis in &assertion.floating_hypotheses {
                batch.push(&hypothesis.label);
            }
            for hypothesis in &assertion.essential_hypotheses {
                batch.push(&hypothesis.label);
            }
            for hypothesis in &assertion.proof.floating_hypotheses {
                batch.push(&hypothesis.label);
            }
            for (i, label) in batch.iter().enumerate() {
                if self.reserved_labels.contains(*label) || batch[..i].contains(label) {
                    return Err(Error::DuplicateLabel((*label).to_string()));
                }
            }
            for label in batch {
                self.reserved_labels.insert(label.to_string());
            }
        }
        let id = AssertionId(self.assertions.len() as u32);
        self.assertions_by_label.insert(assertion.label.clone(), id);
        self.assertions.push(assertion);
        Ok(id)
    }

    pub fn find_assertion(&self, label: &str) -> Option<AssertionId> {
        self.assertions_by_label.get(label).copied()
    }

    pub fn assertion(&self, id: AssertionId) -> &Assertion {
        &self.assertions[id.index()]
    }

    /// Constants in declaration order.
    pub fn constants(&self) -> &[Symbol] {
        &self.constants
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> &[Symbol] {
        &self.variables
    }

    /// Assertions in insertion order.
    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// Whether a label is already claimed by anything in the database.
    pub fn is_reserved(&self, label: &str) -> bool {
        self.reserved_labels.contains(label)
    }
}
