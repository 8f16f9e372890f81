//! Structural checks and canonical reordering of proof step sequences.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::kernel::assertion::{Proof, ProofStep};
use crate::kernel::frame::{FrameEntryKind, LegacyFrames};

/// Checks that a step sequence is the post-order serialisation of a single
/// proof tree. Simulated on a stack: every step pops its arity and pushes
/// one result, and exactly one result must survive. Recalls must point at
/// an earlier step.
pub fn check_well_formed(steps: &[ProofStep]) -> Result<()> {
    let mut depth = 0usize;
    for (i, step) in steps.iter().enumerate() {
        if let ProofStep::Recall(k) = step {
            if *k as usize >= i {
                return Err(Error::ArityViolation(format!(
                    "step {} recalls step {}, which is not an earlier step",
                    i, k
                )));
            }
        }
        let arity = step.arity();
        if depth < arity {
            return Err(Error::ArityViolation(format!(
                "step {} consumes {} subtrees but only {} are available",
                i, arity, depth
            )));
        }
        depth = depth - arity + 1;
    }
    if depth != 1 {
        return Err(Error::ArityViolation(format!(
            "proof finishes with {} results instead of one",
            depth
        )));
    }
    Ok(())
}

/// Rewrites a decoded proof into canonical order.
///
/// Decoded proofs supply the subtrees of every cited assertion in legacy
/// order: the cited assertion's own declaration interleaving of essential
/// and floating hypotheses. Canonical order groups the subtrees as all
/// mandatory floating-hypothesis subtrees first, then all essential ones,
/// each class in the cited assertion's array order.
///
/// The forest is handled as a parent-child index list over the post-order
/// sequence, never as a pointer graph. Re-linearisation resolves sharing:
/// the first traversal occurrence of a recalled subtree is emitted in full,
/// and every other occurrence (including the subtree's original slot when a
/// recall now precedes it) becomes a recall of the already emitted root.
/// Every recall in the output therefore points backward.
///
/// The caller is expected to have run `check_well_formed` first; a sequence
/// that is not a single post-order tree surfaces here as `Internal`.
pub fn reorder(proof: &mut Proof, frames: &LegacyFrames) -> Result<()> {
    let count = proof.steps.len();
    if count == 0 {
        return Ok(());
    }

    // Collect each step's children, in the order the subtrees were supplied.
    let mut children: Vec<Vec<u32>> = vec![Vec::new(); count];
    let mut stack: Vec<u32> = Vec::new();
    for i in 0..count {
        let arity = proof.steps[i].arity();
        if stack.len() < arity {
            return Err(Error::internal("proof stack underflow while reordering"));
        }
        children[i] = stack.split_off(stack.len() - arity);
        stack.push(i as u32);
    }
    let root = match stack[..] {
        [root] => root,
        _ => return Err(Error::internal("proof does not reduce to a single tree")),
    };

    // Put every cited assertion's subtrees into canonical order, using the
    // cited legacy frame to classify each slot.
    for i in 0..count {
        if let ProofStep::Assertion { id, .. } = proof.steps[i] {
            let frame = frames.get(id);
            if frame.len() != children[i].len() {
                return Err(Error::internal("citation arity does not match the cited frame"));
            }
            let mut floats = Vec::with_capacity(frame.len());
            let mut essentials = Vec::new();
            for (slot, &child) in frame.iter().zip(&children[i]) {
                match slot.kind {
                    FrameEntryKind::Floating => floats.push(child),
                    FrameEntryKind::Essential => essentials.push(child),
                    FrameEntryKind::Disjoint => {
                        return Err(Error::internal("restriction slot in a legacy frame"))
                    }
                }
            }
            floats.extend(essentials);
            children[i] = floats;
        }
    }

    // Re-linearise in post order, emitting each shared subtree at its first
    // use. `emitted` maps an original step index to the root of its copy in
    // the output.
    enum Task {
        Visit(u32),
        Emit(u32),
    }
    let mut out: Vec<ProofStep> = Vec::with_capacity(count);
    let mut emitted: HashMap<u32, u32> = HashMap::new();
    let mut work = vec![Task::Visit(root)];
    while let Some(task) = work.pop() {
        match task {
            Task::Visit(node) => {
                let mut target = node;
                while let ProofStep::Recall(k) = proof.steps[target as usize] {
                    target = k;
                }
                if let Some(&at) = emitted.get(&target) {
                    out.push(ProofStep::Recall(at));
                    continue;
                }
                work.push(Task::Emit(target));
                for &child in children[target as usize].iter().rev() {
                    work.push(Task::Visit(child));
                }
            }
            Task::Emit(node) => {
                out.push(proof.steps[node as usize]);
                emitted.insert(node, (out.len() - 1) as u32);
            }
        }
    }
    if out.len() != count {
        return Err(Error::internal("reordering changed the number of steps"));
    }

    proof.steps = out;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::assertion::AssertionId;
    use crate::kernel::frame::{Frame, FrameEntry};

    fn frame_of(kinds: &[FrameEntryKind]) -> Frame {
        let mut floats = 0;
        let mut essentials = 0;
        kinds
            .iter()
            .map(|&kind| {
                let index = match kind {
                    FrameEntryKind::Floating => {
                        floats += 1;
                        floats - 1
                    }
                    _ => {
                        essentials += 1;
                        essentials - 1
                    }
                };
                FrameEntry { kind, index }
            })
            .collect()
    }

    fn citation(id: u32, arity: u32) -> ProofStep {
        ProofStep::Assertion {
            id: AssertionId(id),
            arity,
        }
    }

    #[test]
    fn well_formed_accepts_a_single_tree() {
        let steps = [
            ProofStep::Floating(0),
            ProofStep::Essential(0),
            citation(0, 2),
        ];
        assert!(check_well_formed(&steps).is_ok());
    }

    #[test]
    fn well_formed_rejects_underflow() {
        let steps = [ProofStep::Floating(0), citation(0, 2)];
        assert!(matches!(
            check_well_formed(&steps),
            Err(Error::ArityViolation(_))
        ));
    }

    #[test]
    fn well_formed_rejects_leftover_results() {
        let steps = [ProofStep::Floating(0), ProofStep::Floating(1)];
        assert!(matches!(
            check_well_formed(&steps),
            Err(Error::ArityViolation(_))
        ));
    }

    #[test]
    fn well_formed_rejects_an_empty_proof() {
        assert!(matches!(check_well_formed(&[]), Err(Error::ArityViolation(_))));
    }

    #[test]
    fn well_formed_rejects_forward_recall() {
        let steps = [ProofStep::Recall(1), ProofStep::Floating(0)];
        assert!(matches!(
            check_well_formed(&steps),
            Err(Error::ArityViolation(_))
        ));
    }

    #[test]
    fn reorder_groups_floats_before_essentials() {
        // The cited assertion declared float, essential, float; the decoded
        // proof supplies subtrees in that order.
        let mut frames = LegacyFrames::default();
        frames.push(frame_of(&[
            FrameEntryKind::Floating,
            FrameEntryKind::Essential,
            FrameEntryKind::Floating,
        ]));
        let mut proof = Proof {
            steps: vec![
                ProofStep::Floating(0),
                ProofStep::Essential(0),
                ProofStep::Floating(1),
                citation(0, 3),
            ],
            ..Proof::default()
        };
        check_well_formed(&proof.steps).unwrap();
        reorder(&mut proof, &frames).unwrap();
        assert_eq!(
            proof.steps,
            vec![
                ProofStep::Floating(0),
                ProofStep::Floating(1),
                ProofStep::Essential(0),
                citation(0, 3),
            ]
        );
    }

    #[test]
    fn reorder_rewrites_recall_indices() {
        // The essential subtree is tagged and recalled; after the floats
        // move ahead of it, the recall must still point at it.
        let mut frames = LegacyFrames::default();
        frames.push(frame_of(&[
            FrameEntryKind::Essential,
            FrameEntryKind::Floating,
        ]));
        frames.push(frame_of(&[
            FrameEntryKind::Essential,
            FrameEntryKind::Essential,
        ]));
        let mut proof = Proof {
            steps: vec![
                ProofStep::Essential(0),
                ProofStep::Floating(0),
                citation(0, 2),
                ProofStep::Recall(0),
                citation(1, 2),
            ],
            ..Proof::default()
        };
        check_well_formed(&proof.steps).unwrap();
        reorder(&mut proof, &frames).unwrap();
        assert_eq!(
            proof.steps,
            vec![
                ProofStep::Floating(0),
                ProofStep::Essential(0),
                citation(0, 2),
                ProofStep::Recall(1),
                citation(1, 2),
            ]
        );
    }

    #[test]
    fn reorder_moves_a_recalled_subtree_before_its_first_use() {
        // The cited assertion declared essential, essential, float. The
        // first essential subtree is recalled from the float slot, which
        // canonical order moves to the front: the full subtree must be
        // emitted there and its original slot becomes the recall, keeping
        // every recall a backward reference.
        let mut frames = LegacyFrames::default();
        frames.push(frame_of(&[FrameEntryKind::Essential]));
        frames.push(frame_of(&[
            FrameEntryKind::Essential,
            FrameEntryKind::Essential,
            FrameEntryKind::Floating,
        ]));
        let mut proof = Proof {
            steps: vec![
                ProofStep::Essential(0),
                citation(0, 1),
                ProofStep::Essential(1),
                ProofStep::Recall(1),
                citation(1, 3),
            ],
            ..Proof::default()
        };
        check_well_formed(&proof.steps).unwrap();
        reorder(&mut proof, &frames).unwrap();
        assert_eq!(
            proof.steps,
            vec![
                ProofStep::Essential(0),
                citation(0, 1),
                ProofStep::Recall(1),
                ProofStep::Essential(1),
                citation(1, 3),
            ]
        );
        check_well_formed(&proof.steps).unwrap();
    }

    #[test]
    fn reorder_leaves_unknown_steps_in_place() {
        let mut frames = LegacyFrames::default();
        frames.push(frame_of(&[
            FrameEntryKind::Floating,
            FrameEntryKind::Essential,
        ]));
        let mut proof = Proof {
            steps: vec![ProofStep::Unknown, ProofStep::Unknown, citation(0, 2)],
            ..Proof::default()
        };
        check_well_formed(&proof.steps).unwrap();
        reorder(&mut proof, &frames).unwrap();
        assert_eq!(
            proof.steps,
            vec![ProofStep::Unknown, ProofStep::Unknown, citation(0, 2)]
        );
    }
}
