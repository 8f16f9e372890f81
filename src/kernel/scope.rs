use crate::error::{Error, Result};
use crate::kernel::assertion::{DisjointRestriction, EssentialHypothesis, FloatingHypothesis};
use crate::kernel::frame::{Frame, FrameEntry, FrameEntryKind};

/// The declarations visible at one point of the statement stream: floating
/// hypotheses, essential hypotheses, and disjoint variable restrictions,
/// plus the spurious frame logging their combined declaration order.
#[derive(Clone, Default)]
pub struct Scope {
    pub floating_hypotheses: Vec<FloatingHypothesis>,
    pub essential_hypotheses: Vec<EssentialHypothesis>,
    pub restrictions: Vec<DisjointRestriction>,
    spurious_frame: Frame,
}

impl Scope {
    pub fn add_floating_hypothesis(&mut self, hypothesis: FloatingHypothesis) {
        self.spurious_frame.push(FrameEntry {
            kind: FrameEntryKind::Floating,
            index: self.floating_hypotheses.len() as u32,
        });
        self.floating_hypotheses.push(hypothesis);
    }

    pub fn add_essential_hypothesis(&mut self, hypothesis: EssentialHypothesis) {
        self.spurious_frame.push(FrameEntry {
            kind: FrameEntryKind::Essential,
            index: self.essential_hypotheses.len() as u32,
        });
        self.essential_hypotheses.push(hypothesis);
    }

    pub fn add_restriction(&mut self, restriction: DisjointRestriction) {
        self.spurious_frame.push(FrameEntry {
            kind: FrameEntryKind::Disjoint,
            index: self.restrictions.len() as u32,
        });
        self.restrictions.push(restriction);
    }

    pub fn spurious_frame(&self) -> &[FrameEntry] {
        &self.spurious_frame
    }

    pub fn find_floating(&self, label: &str) -> Option<usize> {
        self.floating_hypotheses.iter().position(|h| h.label == label)
    }

    pub fn find_essential(&self, label: &str) -> Option<usize> {
        self.essential_hypotheses.iter().position(|h| h.label == label)
    }
}

/// The lexical nesting of scopes. `${` opens a child that starts as a copy
/// of its parent, so the top of the stack is always the complete view of
/// what is visible; `$}` discards everything declared inside.
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack {
            scopes: vec![Scope::default()],
        }
    }

    pub fn open(&mut self) {
        let snapshot = self.current().clone();
        self.scopes.push(snapshot);
    }

    pub fn close(&mut self) -> Result<()> {
        if self.scopes.len() == 1 {
            return Err(Error::BadScopeBoundary("$} without a matching ${".to_string()));
        }
        self.scopes.pop();
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> &Scope {
        self.scopes.last().unwrap()
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().unwrap()
    }
}

impl Default for ScopeStack {
    fn default() -> ScopeStack {
        ScopeStack::new()
    }
}
