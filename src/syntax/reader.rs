//! Reads a Metamath database: a recursive-descent driver over `$`-keyword
//! statements that maintains the scope stack, decodes proofs, reorders them
//! into canonical form, and canonicalises labels before insertion.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::kernel::assertion::{
    Assertion, AssertionKind, DisjointRestriction, EssentialHypothesis, FloatingHypothesis, Proof,
    ProofStep,
};
use crate::kernel::code::{self, CodeChar};
use crate::kernel::database::Database;
use crate::kernel::frame::{self, Frame, FrameEntryKind, LegacyFrames};
use crate::kernel::proof;
use crate::kernel::scope::ScopeStack;
use crate::kernel::symbol::{Expression, SymbolId};
use crate::syntax::token::Tokenizer;

/// Parses a complete database from Metamath source text.
pub fn read_database(text: &str) -> Result<Database> {
    Reader::new(text)?.run()
}

struct Reader<'a> {
    tokens: Tokenizer<'a>,
    db: Database,
    scopes: ScopeStack,
    frames: LegacyFrames,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Result<Reader<'a>> {
        Ok(Reader {
            tokens: Tokenizer::new(text)?,
            db: Database::new(),
            scopes: ScopeStack::new(),
            frames: LegacyFrames::default(),
        })
    }

    fn run(mut self) -> Result<Database> {
        while self.tokens.peek().is_some() {
            self.read_statement()?;
        }
        if self.scopes.depth() > 1 {
            return Err(Error::BadScopeBoundary(
                "${ still open at end of input".to_string(),
            ));
        }
        debug!("read {} assertions", self.db.assertions().len());
        Ok(self.db)
    }

    fn read_statement(&mut self) -> Result<()> {
        let mut label = None;
        if self.tokens.peek().is_some_and(|token| !token.starts_with('$')) {
            label = Some(self.tokens.next_token()?.to_string());
        }
        let keyword = match self.tokens.peek() {
            Some(token) => token,
            None => return Err(Error::syntax("expected a statement after a label")),
        };
        match keyword {
            "${" => {
                if label.is_some() {
                    return Err(Error::BadScopeBoundary("a scope cannot be labelled".to_string()));
                }
                self.tokens.next_token()?;
                self.scopes.open();
                Ok(())
            }
            "$}" => {
                forbid_label(label, keyword)?;
                self.tokens.next_token()?;
                self.scopes.close()
            }
            "$c" => {
                forbid_label(label, keyword)?;
                self.read_constants()
            }
            "$v" => {
                forbid_label(label, keyword)?;
                self.read_variables()
            }
            "$d" => {
                forbid_label(label, keyword)?;
                self.read_restriction()
            }
            "$f" => {
                let label = require_label(label, keyword)?;
                self.read_floating_hypothesis(label)
            }
            "$e" => {
                let label = require_label(label, keyword)?;
                self.read_essential_hypothesis(label)
            }
            "$a" | "$p" => {
                let label = require_label(label, keyword)?;
                self.read_assertion(label)
            }
            _ => Err(Error::syntax(format!(
                "expected a statement keyword, found \"{}\"",
                keyword
            ))),
        }
    }

    fn read_constants(&mut self) -> Result<()> {
        self.tokens.expect("$c")?;
        while self.tokens.peek() != Some("$.") {
            let name = self.tokens.next_token()?;
            if name.starts_with('$') {
                return Err(Error::syntax(format!(
                    "\"{}\" cannot be declared as a constant",
                    name
                )));
            }
            self.db.add_constant(name)?;
        }
        self.tokens.expect("$.")
    }

    fn read_variables(&mut self) -> Result<()> {
        self.tokens.expect("$v")?;
        while self.tokens.peek() != Some("$.") {
            let name = self.tokens.next_token()?;
            if name.starts_with('$') {
                return Err(Error::syntax(format!(
                    "\"{}\" cannot be declared as a variable",
                    name
                )));
            }
            self.db.add_variable(name)?;
        }
        self.tokens.expect("$.")
    }

    /// Reads the symbols of an expression up to (not consuming) the
    /// terminator token.
    fn read_expression(&mut self, terminator: &str) -> Result<Expression> {
        let mut expression = Expression::default();
        while self.tokens.peek() != Some(terminator) {
            let token = self.tokens.next_token()?;
            if token.starts_with('$') {
                return Err(Error::syntax(format!(
                    "unexpected \"{}\" inside an expression",
                    token
                )));
            }
            let id = self
                .db
                .find_symbol(token)
                .ok_or_else(|| Error::UnknownSymbol(token.to_string()))?;
            expression.push(id);
        }
        Ok(expression)
    }

    fn read_floating_hypothesis(&mut self, label: String) -> Result<()> {
        self.tokens.expect("$f")?;
        let expression = self.read_expression("$.")?;
        self.tokens.expect("$.")?;
        if expression.len() != 2 {
            return Err(Error::MalformedFloatingHypothesis(format!(
                "\"{}\" must consist of exactly a typecode and a variable",
                label
            )));
        }
        let typecode = expression.symbols[0];
        let variable = expression.symbols[1];
        if !typecode.is_constant() || !variable.is_variable() {
            return Err(Error::MalformedFloatingHypothesis(format!(
                "\"{}\" must pair a constant typecode with a variable",
                label
            )));
        }
        let scope = self.scopes.current();
        if scope.find_floating(&label).is_some() || scope.find_essential(&label).is_some() {
            return Err(Error::DuplicateLabel(label));
        }
        if scope.floating_hypotheses.iter().any(|h| h.variable == variable) {
            return Err(Error::MalformedFloatingHypothesis(format!(
                "variable \"{}\" already has a floating hypothesis in scope",
                self.db.label(variable)
            )));
        }
        self.scopes.current_mut().add_floating_hypothesis(FloatingHypothesis {
            label,
            typecode,
            variable,
        });
        Ok(())
    }

    fn read_essential_hypothesis(&mut self, label: String) -> Result<()> {
        self.tokens.expect("$e")?;
        let expression = self.read_expression("$.")?;
        self.tokens.expect("$.")?;
        match expression.symbols.first() {
            Some(id) if id.is_constant() => {}
            _ => {
                return Err(Error::syntax(format!(
                    "hypothesis \"{}\" must begin with a typecode constant",
                    label
                )))
            }
        }
        let scope = self.scopes.current();
        if scope.find_floating(&label).is_some() || scope.find_essential(&label).is_some() {
            return Err(Error::DuplicateLabel(label));
        }
        self.scopes
            .current_mut()
            .add_essential_hypothesis(EssentialHypothesis { label, expression });
        Ok(())
    }

    fn read_restriction(&mut self) -> Result<()> {
        self.tokens.expect("$d")?;
        let first = self.read_restriction_variable()?;
        let second = self.read_restriction_variable()?;
        if first == second {
            return Err(Error::MalformedDisjointRestriction(format!(
                "\"{}\" cannot be disjoint from itself",
                self.db.label(first)
            )));
        }
        self.tokens.expect("$.")?;
        self.scopes.current_mut().add_restriction(DisjointRestriction {
            variables: [first, second],
        });
        Ok(())
    }

    fn read_restriction_variable(&mut self) -> Result<SymbolId> {
        let token = self.tokens.next_token()?;
        let id = self
            .db
            .find_symbol(token)
            .ok_or_else(|| Error::UnknownSymbol(token.to_string()))?;
        if !id.is_variable() {
            return Err(Error::MalformedDisjointRestriction(format!(
                "\"{}\" is not a variable",
                token
            )));
        }
        Ok(id)
    }

    fn read_assertion(&mut self, label: String) -> Result<()> {
        let kind = match self.tokens.next_token()? {
            "$a" => AssertionKind::Axiom,
            _ => AssertionKind::Theorem,
        };
        let terminator = match kind {
            AssertionKind::Axiom => "$.",
            AssertionKind::Theorem => "$=",
        };
        let expression = self.read_expression(terminator)?;
        match expression.symbols.first() {
            Some(id) if id.is_constant() => {}
            _ => {
                return Err(Error::syntax(format!(
                    "assertion \"{}\" must begin with a typecode constant",
                    label
                )))
            }
        }

        let essentials = self.scopes.current().essential_hypotheses.clone();
        let variables = frame::collect_variables(&essentials, &expression);
        for &variable in &variables {
            let typed = self
                .scopes
                .current()
                .floating_hypotheses
                .iter()
                .any(|h| h.variable == variable);
            if !typed {
                return Err(Error::syntax(format!(
                    "variable \"{}\" in \"{}\" has no floating hypothesis in scope",
                    self.db.label(variable),
                    label
                )));
            }
        }
        let restrictions =
            frame::filter_restrictions(&self.scopes.current().restrictions, &variables);
        let (floats, legacy) = frame::mandatory_frame(
            self.scopes.current().spurious_frame(),
            &self.scopes.current().floating_hypotheses,
            &variables,
        );
        debug_assert_eq!(legacy.len(), floats.len() + essentials.len());

        let mut proof = Proof::default();
        match kind {
            AssertionKind::Axiom => self.tokens.expect("$.")?,
            AssertionKind::Theorem => {
                self.tokens.expect("$=")?;
                proof = if self.tokens.peek() == Some("(") {
                    self.read_compressed_proof(&floats, &legacy)?
                } else {
                    self.read_uncompressed_proof(&floats)?
                };
                proof::check_well_formed(&proof.steps)?;
                proof::reorder(&mut proof, &self.frames)?;
                self.tokens.expect("$.")?;
            }
        }

        let mut assertion = Assertion {
            label,
            kind,
            restrictions,
            floating_hypotheses: floats,
            essential_hypotheses: essentials,
            expression,
            proof,
        };
        fix_labels(&mut assertion, &self.db);
        debug!("storing assertion \"{}\"", assertion.label);
        self.db.add_assertion(assertion)?;
        self.frames.push(legacy);
        Ok(())
    }

    /// Decodes a plain label-sequence proof: tokens up to (not consuming)
    /// the closing `$.`, each resolved against the store, then the
    /// theorem's own hypotheses, then the scope's floating hypotheses.
    fn read_uncompressed_proof(
        &mut self,
        mandatory_floats: &[FloatingHypothesis],
    ) -> Result<Proof> {
        let mut steps = Vec::new();
        let mut extras: Vec<FloatingHypothesis> = Vec::new();
        while self.tokens.peek() != Some("$.") {
            let name = self.tokens.next_token()?;
            if name == "?" {
                steps.push(ProofStep::Unknown);
                continue;
            }
            if let Some(id) = self.db.find_assertion(name) {
                let arity = self.frames.get(id).len() as u32;
                steps.push(ProofStep::Assertion { id, arity });
                continue;
            }
            let scope = self.scopes.current();
            if let Some(i) = scope.find_essential(name) {
                steps.push(ProofStep::Essential(i as u32));
                continue;
            }
            if let Some(i) = mandatory_floats.iter().position(|h| h.label == name) {
                steps.push(ProofStep::Floating(i as u32));
                continue;
            }
            if let Some(i) = extras.iter().position(|h| h.label == name) {
                steps.push(ProofStep::Floating((mandatory_floats.len() + i) as u32));
                continue;
            }
            if let Some(i) = scope.find_floating(name) {
                let index = (mandatory_floats.len() + extras.len()) as u32;
                extras.push(scope.floating_hypotheses[i].clone());
                steps.push(ProofStep::Floating(index));
                continue;
            }
            return Err(Error::UnrecognisedStep(name.to_string()));
        }
        let restrictions = frame::extra_restrictions(
            &self.scopes.current().restrictions,
            mandatory_floats,
            &extras,
        );
        Ok(Proof {
            restrictions,
            floating_hypotheses: extras,
            steps,
        })
    }

    /// Decodes a `( label ... ) CODE` proof. The label list defines the
    /// reference array; the code is a stream of base-5/base-20 numbers
    /// mapped through the theorem's legacy frame, the reference array, and
    /// the tagged steps, in that order.
    fn read_compressed_proof(
        &mut self,
        mandatory_floats: &[FloatingHypothesis],
        legacy: &Frame,
    ) -> Result<Proof> {
        self.tokens.expect("(")?;
        let mut extras: Vec<FloatingHypothesis> = Vec::new();
        let mut templates: Vec<ProofStep> = Vec::new();
        loop {
            let name = self.tokens.next_token()?;
            if name == ")" {
                break;
            }
            if name == "?" {
                return Err(Error::CompressedProofSyntax(
                    "? is not permitted in the reference list".to_string(),
                ));
            }
            if let Some(id) = self.db.find_assertion(name) {
                let arity = self.frames.get(id).len() as u32;
                templates.push(ProofStep::Assertion { id, arity });
                continue;
            }
            if let Some(i) = self.scopes.current().find_floating(name) {
                let index = (mandatory_floats.len() + extras.len()) as u32;
                extras.push(self.scopes.current().floating_hypotheses[i].clone());
                templates.push(ProofStep::Floating(index));
                continue;
            }
            return Err(Error::UnrecognisedStep(name.to_string()));
        }

        let mut steps: Vec<ProofStep> = Vec::new();
        let mut tags: Vec<u32> = Vec::new();
        let mut accumulator = 0usize;
        let mut code = CodeReader::new(&mut self.tokens);
        while let Some(c) = code.next_char()? {
            let class = code::classify(c).ok_or_else(|| {
                Error::CompressedProofSyntax(format!("invalid character '{}'", c as char))
            })?;
            match class {
                CodeChar::Prefix(digit) => {
                    accumulator = accumulator
                        .checked_mul(5)
                        .and_then(|n| n.checked_add(digit))
                        .ok_or_else(|| {
                            Error::CompressedProofSyntax("number is too large".to_string())
                        })?;
                }
                CodeChar::Terminator(digit) => {
                    let number = accumulator
                        .checked_mul(20)
                        .and_then(|n| n.checked_add(digit))
                        .ok_or_else(|| {
                            Error::CompressedProofSyntax("number is too large".to_string())
                        })?;
                    accumulator = 0;
                    steps.push(map_number(number, legacy, &templates, &tags)?);
                }
                CodeChar::Hole => {
                    if accumulator != 0 {
                        return Err(Error::CompressedProofSyntax(
                            "? in the middle of a number".to_string(),
                        ));
                    }
                    steps.push(ProofStep::Unknown);
                }
                CodeChar::Tag => {
                    if accumulator != 0 {
                        return Err(Error::CompressedProofSyntax(
                            "Z in the middle of a number".to_string(),
                        ));
                    }
                    match steps.len().checked_sub(1) {
                        Some(last) => tags.push(last as u32),
                        None => {
                            return Err(Error::CompressedProofSyntax(
                                "Z before the first step".to_string(),
                            ))
                        }
                    }
                }
            }
        }
        if accumulator != 0 {
            return Err(Error::CompressedProofSyntax(
                "unfinished number at end of proof".to_string(),
            ));
        }

        let restrictions = frame::extra_restrictions(
            &self.scopes.current().restrictions,
            mandatory_floats,
            &extras,
        );
        Ok(Proof {
            restrictions,
            floating_hypotheses: extras,
            steps,
        })
    }
}

/// Maps a decoded number onto a proof step. Numbers address, in order: the
/// theorem's own legacy frame, the reference array, and the tagged steps.
fn map_number(
    number: usize,
    legacy: &Frame,
    templates: &[ProofStep],
    tags: &[u32],
) -> Result<ProofStep> {
    let m1 = legacy.len();
    let m2 = m1 + templates.len();
    let m3 = m2 + tags.len();
    let k = number - 1;
    if k < m1 {
        let entry = legacy[k];
        match entry.kind {
            FrameEntryKind::Essential => Ok(ProofStep::Essential(entry.index)),
            FrameEntryKind::Floating => Ok(ProofStep::Floating(entry.index)),
            FrameEntryKind::Disjoint => Err(Error::internal("restriction slot in a legacy frame")),
        }
    } else if k < m2 {
        Ok(templates[k - m1])
    } else if k < m3 {
        Ok(ProofStep::Recall(tags[k - m2]))
    } else {
        Err(Error::NumberOutOfRange { number, limit: m3 })
    }
}

/// Streams the characters of the code section, which the tokenizer may have
/// split into arbitrarily many tokens. Stops short of the closing `$.`.
struct CodeReader<'t, 'a> {
    tokens: &'t mut Tokenizer<'a>,
    chunk: &'a [u8],
    position: usize,
}

impl<'t, 'a> CodeReader<'t, 'a> {
    fn new(tokens: &'t mut Tokenizer<'a>) -> CodeReader<'t, 'a> {
        CodeReader {
            tokens,
            chunk: b"",
            position: 0,
        }
    }

    fn next_char(&mut self) -> Result<Option<u8>> {
        while self.position == self.chunk.len() {
            match self.tokens.peek() {
                Some("$.") | None => return Ok(None),
                Some(_) => {
                    self.chunk = self.tokens.next_token()?.as_bytes();
                    self.position = 0;
                }
            }
        }
        let c = self.chunk[self.position];
        self.position += 1;
        Ok(Some(c))
    }
}

/// Renames an assertion's label and the labels of all of its hypotheses to
/// be collision-free before insertion. Dots become underscores; hypothesis
/// labels are namespaced under the assertion's label; both are then probed
/// for a free name. The prefixing is what makes snapshot-by-value scope
/// hypotheses compatible with global label uniqueness: two theorems sharing
/// a scope hypothesis each store their own prefixed copy.
fn fix_labels(assertion: &mut Assertion, db: &Database) {
    let mut chosen = HashSet::new();
    assertion.label = free_name(assertion.label.replace('.', "_"), db, &chosen);
    chosen.insert(assertion.label.clone());
    let assertion_label = assertion.label.clone();
    for hypothesis in &mut assertion.floating_hypotheses {
        fix_hypothesis_label(&mut hypothesis.label, &assertion_label, db, &mut chosen);
    }
    for hypothesis in &mut assertion.essential_hypotheses {
        fix_hypothesis_label(&mut hypothesis.label, &assertion_label, db, &mut chosen);
    }
    for hypothesis in &mut assertion.proof.floating_hypotheses {
        fix_hypothesis_label(&mut hypothesis.label, &assertion_label, db, &mut chosen);
    }
}

fn fix_hypothesis_label(
    label: &mut String,
    assertion_label: &str,
    db: &Database,
    chosen: &mut HashSet<String>,
) {
    let has_prefix = label.len() >= assertion_label.len() + 2
        && label.starts_with(assertion_label)
        && label.as_bytes()[assertion_label.len()] == b'.';
    let prefixed = if has_prefix {
        label.clone()
    } else {
        format!("{}.{}", assertion_label, label)
    };
    // Keep the dot separating the namespace; flatten any others.
    let keep = assertion_label.len() + 1;
    let fixed = free_name(
        format!("{}{}", &prefixed[..keep], prefixed[keep..].replace('.', "_")),
        db,
        chosen,
    );
    chosen.insert(fixed.clone());
    *label = fixed;
}

fn free_name(base: String, db: &Database, taken: &HashSet<String>) -> String {
    if !db.is_reserved(&base) && !taken.contains(&base) {
        return base;
    }
    for i in 0.. {
        let candidate = format!("{}_{}", base, i);
        if !db.is_reserved(&candidate) && !taken.contains(&candidate) {
            return candidate;
        }
    }
    unreachable!()
}

fn require_label(label: Option<String>, keyword: &str) -> Result<String> {
    label.ok_or_else(|| Error::syntax(format!("\"{}\" requires a label", keyword)))
}

fn forbid_label(label: Option<String>, keyword: &str) -> Result<()> {
    match label {
        Some(label) => Err(Error::syntax(format!(
            "unexpected label \"{}\" before \"{}\"",
            label, keyword
        ))),
        None => Ok(()),
    }
}
