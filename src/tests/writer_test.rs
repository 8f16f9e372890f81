use indoc::indoc;

use crate::tests::common::rewrite;

#[test]
fn writes_a_minimal_axiom() {
    let output = rewrite("$c wff $. $v p $. wp $f wff p $. ax $a wff p $.");
    assert_eq!(
        output,
        indoc! {"
            $c wff $.
            $v p $.
            ${
                ax.wp $f wff p $.
                ax $a wff p $.
            $}
        "}
    );
}

#[test]
fn writes_a_single_hypothesis_proof_compressed() {
    let output = rewrite("$c wff $. $v p $. wp $f wff p $. min $e wff p $. t1 $p wff p $= min $.");
    assert_eq!(
        output,
        indoc! {"
            $c wff $.
            $v p $.
            ${
                t1.wp $f wff p $.
                t1.min $e wff p $.
                t1 $p wff p
                $= ( ) B $.
            $}
        "}
    );
}

#[test]
fn preserves_tag_structure() {
    // The third step stays tagged with Z and the recall re-encodes against
    // the same tag.
    let output = rewrite(indoc! {"
        $c wff ( ) $. $v p q $.
        wp $f wff p $. wq $f wff q $.
        pair $a wff ( p q ) $.
        th $p wff ( p q ) $= ( pair ) ABCZDC $.
    "});
    assert_eq!(
        output,
        indoc! {"
            $c wff ( ) $.
            $v p q $.
            ${
                pair.wp $f wff p $.
                pair.wq $f wff q $.
                pair $a wff ( p q ) $.
            $}
            ${
                th.wp $f wff p $.
                th.wq $f wff q $.
                th $p wff ( p q )
                $= ( pair ) ABCZDC $.
            $}
        "}
    );
}

#[test]
fn encodes_extras_after_essentials() {
    let output = rewrite(indoc! {"
        $c wff $. $v p q $.
        wp $f wff p $. wq $f wff q $.
        $d p q $.
        dup $a wff p $.
        t3 $p wff p $= wq dup $.
    "});
    assert_eq!(
        output,
        indoc! {"
            $c wff $.
            $v p q $.
            ${
                dup.wp $f wff p $.
                dup $a wff p $.
            $}
            ${
                t3.wp $f wff p $.
                t3.wq $f wff q $.
                $d p q $.
                t3 $p wff p
                $= ( t3.wq dup ) BC $.
            $}
        "}
    );
}

#[test]
fn writes_unknown_steps_as_holes() {
    let output = rewrite("$c wff $. $v p $. wp $f wff p $. t $p wff p $= ? $.");
    assert!(output.contains("$= ( ) ? $."), "got:\n{}", output);
}
