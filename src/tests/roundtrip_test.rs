use indoc::indoc;

use crate::tests::common::{assert_labels_unique, read, rewrite};

/// Writing, re-reading, and writing again must reproduce the first output
/// byte for byte. The first write is allowed to differ from the source:
/// label canonicalisation and proof reordering are lossy with respect to
/// the original text, but they are fixpoints of themselves.
fn assert_stable(text: &str) {
    let once = rewrite(text);
    let twice = rewrite(&once);
    assert_eq!(once, twice, "output is not a rewrite fixpoint");
    assert_labels_unique(&read(&once));
}

#[test]
fn minimal_axiom_is_stable() {
    assert_stable("$c ( ) -> wff $. $v p q $. wp $f wff p $. wq $f wff q $. ax-1 $a wff ( p -> q ) $.");
}

#[test]
fn hypothesis_proof_is_stable() {
    assert_stable("$c wff $. $v p $. wp $f wff p $. min $e wff p $. t1 $p wff p $= min $.");
}

#[test]
fn tagged_proof_is_stable() {
    assert_stable(indoc! {"
        $c wff ( ) $. $v p q $.
        wp $f wff p $. wq $f wff q $.
        pair $a wff ( p q ) $.
        th $p wff ( p q ) $= ( pair ) ABCZDC $.
    "});
}

#[test]
fn reordered_proof_is_stable() {
    assert_stable(indoc! {"
        $c wff |- $. $v p q $.
        ${
            wp $f wff p $. hyp $e |- p $. wq $f wff q $.
            axr $a |- q $.
        $}
        ${
            tp $f wff p $. te $e |- p $. tq $f wff q $.
            goal $p |- q $= tp te tq axr $.
        $}
    "});
}

#[test]
fn extras_and_restrictions_are_stable() {
    assert_stable(indoc! {"
        $c wff $. $v p q $.
        wp $f wff p $. wq $f wff q $.
        $d p q $.
        dup $a wff p $.
        t3 $p wff p $= wq dup $.
    "});
}

#[test]
fn unknown_proofs_are_stable() {
    assert_stable("$c wff $. $v p $. wp $f wff p $. t $p wff p $= ? $.");
}

#[test]
fn a_database_with_shared_scopes_is_stable() {
    // Two assertions read their hypotheses from the same scope; each gets
    // its own prefixed copies, and the result still round-trips.
    assert_stable(indoc! {"
        $c |- wff -> $. $v p q $.
        wp $f wff p $. wq $f wff q $.
        wi $a wff -> p q $.
        ${
            min $e |- p $. maj $e |- -> p q $.
            ax-mp $a |- q $.
            ax-mp2 $a |- -> q p $.
        $}
        ax-id $a |- -> p p $.
        thm $p |- q $= wp wq wp ax-id wp ax-id ax-mp $.
    "});
}
