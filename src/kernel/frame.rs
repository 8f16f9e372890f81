use std::collections::HashSet;

use crate::kernel::assertion::{AssertionId, DisjointRestriction, EssentialHypothesis, FloatingHypothesis};
use crate::kernel::symbol::{Expression, SymbolId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEntryKind {
    Floating,
    Essential,
    Disjoint,
}

/// One slot of a frame: which kind of declaration it is, and its position
/// within that kind's own array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameEntry {
    pub kind: FrameEntryKind,
    pub index: u32,
}

/// An ordered interleaving of frame slots. A scope's spurious frame logs
/// declaration order across all three kinds; an assertion's legacy frame
/// keeps only the hypothesis slots and is the calling convention a proof
/// citing that assertion must match, one subtree per slot.
pub type Frame = Vec<FrameEntry>;

/// The variables of an assertion, in order of first occurrence while
/// scanning its essential hypotheses (in declaration order) and then its
/// head expression. Constants and repeats are skipped.
pub fn collect_variables(
    hypotheses: &[EssentialHypothesis],
    expression: &Expression,
) -> Vec<SymbolId> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for hypothesis in hypotheses {
        scan_variables(&hypothesis.expression, &mut seen, &mut result);
    }
    scan_variables(expression, &mut seen, &mut result);
    result
}

fn scan_variables(
    expression: &Expression,
    seen: &mut HashSet<SymbolId>,
    result: &mut Vec<SymbolId>,
) {
    for &id in &expression.symbols {
        if id.is_variable() && seen.insert(id) {
            result.push(id);
        }
    }
}

/// The restrictions with both operands among the given variables.
pub fn filter_restrictions(
    restrictions: &[DisjointRestriction],
    variables: &[SymbolId],
) -> Vec<DisjointRestriction> {
    restrictions
        .iter()
        .copied()
        .filter(|restriction| restriction.variables.iter().all(|v| variables.contains(v)))
        .collect()
}

/// Walks a scope's spurious frame and splits out the mandatory floating
/// hypotheses (those whose variable the assertion actually uses) together
/// with the legacy frame. The legacy frame lists one slot per essential
/// hypothesis and per mandatory floating hypothesis, in declaration order,
/// each tagged with its index into the assertion's respective array;
/// restriction entries are dropped.
pub fn mandatory_frame(
    spurious_frame: &[FrameEntry],
    scope_floats: &[FloatingHypothesis],
    variables: &[SymbolId],
) -> (Vec<FloatingHypothesis>, Frame) {
    let mut floats = Vec::new();
    let mut legacy = Frame::new();
    let mut essential_index = 0;
    for entry in spurious_frame {
        match entry.kind {
            FrameEntryKind::Disjoint => {}
            FrameEntryKind::Essential => {
                legacy.push(FrameEntry {
                    kind: FrameEntryKind::Essential,
                    index: essential_index,
                });
                essential_index += 1;
            }
            FrameEntryKind::Floating => {
                let hypothesis = &scope_floats[entry.index as usize];
                if variables.contains(&hypothesis.variable) {
                    legacy.push(FrameEntry {
                        kind: FrameEntryKind::Floating,
                        index: floats.len() as u32,
                    });
                    floats.push(hypothesis.clone());
                }
            }
        }
    }
    (floats, legacy)
}

/// The scope restrictions that concern a proof's extra floating hypotheses:
/// both operands extra, or one extra and the other mandatory.
pub fn extra_restrictions(
    available: &[DisjointRestriction],
    mandatory_floats: &[FloatingHypothesis],
    extra_floats: &[FloatingHypothesis],
) -> Vec<DisjointRestriction> {
    let typed_by = |hypotheses: &[FloatingHypothesis], variable: SymbolId| {
        hypotheses.iter().any(|h| h.variable == variable)
    };
    available
        .iter()
        .copied()
        .filter(|restriction| {
            let extra_0 = typed_by(extra_floats, restriction.variables[0]);
            let extra_1 = typed_by(extra_floats, restriction.variables[1]);
            let mandatory_0 = typed_by(mandatory_floats, restriction.variables[0]);
            let mandatory_1 = typed_by(mandatory_floats, restriction.variables[1]);
            (extra_0 && extra_1) || (extra_0 && mandatory_1) || (mandatory_0 && extra_1)
        })
        .collect()
}

/// The legacy frames of every stored assertion, in store order.
///
/// This lives only as long as the reader: the essential/floating
/// interleaving cannot be recovered from a stored assertion, whose
/// hypotheses have already been split into per-kind arrays.
#[derive(Default)]
pub struct LegacyFrames {
    frames: Vec<Frame>,
}

impl LegacyFrames {
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn get(&self, id: AssertionId) -> &Frame {
        &self.frames[id.index()]
    }
}
