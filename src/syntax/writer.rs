//! Writes a database back out as Metamath source. Symbols come first, one
//! `$c` and one `$v` block; every assertion then gets a fresh `${ … $}`
//! wrapping its own hypotheses and restrictions. Theorem proofs are always
//! emitted in compressed form. The output is a pure function of the store,
//! so writing, re-reading, and writing again reproduces it byte for byte.

use std::fmt::Write as _;

use indexmap::IndexSet;
use tracing::debug;

use crate::kernel::assertion::{
    Assertion, AssertionKind, DisjointRestriction, EssentialHypothesis, FloatingHypothesis,
    ProofStep,
};
use crate::kernel::code;
use crate::kernel::database::Database;
use crate::kernel::symbol::Expression;

/// Renders the whole database.
pub fn write_database(db: &Database) -> String {
    debug!("writing {} assertions", db.assertions().len());
    let mut out = String::new();
    write_symbols(db, &mut out);
    for assertion in db.assertions() {
        write_assertion(db, assertion, &mut out);
    }
    out
}

fn write_symbols(db: &Database, out: &mut String) {
    if !db.constants().is_empty() {
        out.push_str("$c");
        for symbol in db.constants() {
            out.push(' ');
            out.push_str(&symbol.label);
        }
        out.push_str(" $.\n");
    }
    if !db.variables().is_empty() {
        out.push_str("$v");
        for symbol in db.variables() {
            out.push(' ');
            out.push_str(&symbol.label);
        }
        out.push_str(" $.\n");
    }
}

fn expression_text(db: &Database, expression: &Expression) -> String {
    let labels: Vec<&str> = expression.symbols.iter().map(|&id| db.label(id)).collect();
    labels.join(" ")
}

fn write_floating(db: &Database, hypothesis: &FloatingHypothesis, out: &mut String) {
    let _ = writeln!(
        out,
        "    {} $f {} {} $.",
        hypothesis.label,
        db.label(hypothesis.typecode),
        db.label(hypothesis.variable)
    );
}

fn write_essential(db: &Database, hypothesis: &EssentialHypothesis, out: &mut String) {
    let _ = writeln!(
        out,
        "    {} $e {} $.",
        hypothesis.label,
        expression_text(db, &hypothesis.expression)
    );
}

fn write_restriction(db: &Database, restriction: &DisjointRestriction, out: &mut String) {
    let _ = writeln!(
        out,
        "    $d {} {} $.",
        db.label(restriction.variables[0]),
        db.label(restriction.variables[1])
    );
}

fn write_assertion(db: &Database, assertion: &Assertion, out: &mut String) {
    out.push_str("${\n");
    for hypothesis in &assertion.floating_hypotheses {
        write_floating(db, hypothesis, out);
    }
    for hypothesis in &assertion.essential_hypotheses {
        write_essential(db, hypothesis, out);
    }
    for restriction in &assertion.restrictions {
        write_restriction(db, restriction, out);
    }
    if assertion.kind == AssertionKind::Theorem {
        for hypothesis in &assertion.proof.floating_hypotheses {
            write_floating(db, hypothesis, out);
        }
        for restriction in &assertion.proof.restrictions {
            write_restriction(db, restriction, out);
        }
    }

    let keyword = match assertion.kind {
        AssertionKind::Axiom => "$a",
        AssertionKind::Theorem => "$p",
    };
    let _ = write!(
        out,
        "    {} {} {}",
        assertion.label,
        keyword,
        expression_text(db, &assertion.expression)
    );
    match assertion.kind {
        AssertionKind::Axiom => out.push_str(" $.\n"),
        AssertionKind::Theorem => {
            out.push('\n');
            write_proof(db, assertion, out);
        }
    }
    out.push_str("$}\n");
}

/// Emits `$= ( labels ) CODE $.`. The reference array is the proof's extra
/// floating hypotheses followed by the distinct cited assertions in order
/// of first use. Steps whose subtrees are recalled later are tagged with
/// `Z`; recalls encode the tag ordinal of their target, not its raw step
/// index.
fn write_proof(db: &Database, assertion: &Assertion, out: &mut String) {
    let proof = &assertion.proof;
    let mut cited = IndexSet::new();
    for step in &proof.steps {
        if let ProofStep::Assertion { id, .. } = step {
            cited.insert(*id);
        }
    }

    out.push_str("    $= ( ");
    for hypothesis in &proof.floating_hypotheses {
        out.push_str(&hypothesis.label);
        out.push(' ');
    }
    for &id in &cited {
        out.push_str(&db.assertion(id).label);
        out.push(' ');
    }
    out.push_str(") ");

    let mut tagged: Vec<u32> = proof
        .steps
        .iter()
        .filter_map(|step| match step {
            ProofStep::Recall(k) => Some(*k),
            _ => None,
        })
        .collect();
    tagged.sort_unstable();
    tagged.dedup();

    let mandatory = assertion.floating_hypotheses.len();
    let essentials = assertion.essential_hypotheses.len();
    let frame_len = mandatory + essentials;
    let references = proof.floating_hypotheses.len() + cited.len();

    for (i, step) in proof.steps.iter().enumerate() {
        match *step {
            ProofStep::Floating(index) => {
                let index = index as usize;
                let number = if index < mandatory {
                    index + 1
                } else {
                    // Extras live after the essentials in the number space.
                    index + essentials + 1
                };
                out.push_str(&code::encode_number(number));
            }
            ProofStep::Essential(index) => {
                out.push_str(&code::encode_number(index as usize + mandatory + 1));
            }
            ProofStep::Assertion { id, .. } => {
                let position = cited.get_index_of(&id).unwrap();
                let number = frame_len + proof.floating_hypotheses.len() + position + 1;
                out.push_str(&code::encode_number(number));
            }
            ProofStep::Recall(k) => {
                let ordinal = tagged.binary_search(&k).unwrap();
                out.push_str(&code::encode_number(frame_len + references + ordinal + 1));
            }
            ProofStep::Unknown => out.push('?'),
        }
        if tagged.binary_search(&(i as u32)).is_ok() {
            out.push('Z');
        }
    }
    out.push_str(" $.\n");
}
