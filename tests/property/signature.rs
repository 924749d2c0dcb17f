// Property tests for method signatures: the `name-T1-T2` text form and the
// wildcard-aware equivalence used to match call sites to declarations.

use j2ir::signature::{NULL_TOKEN, Signature, UNKNOWN_TOKEN};
use proptest::prelude::*;

fn type_token() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec!["int", "double", "boolean", "String", "int[]", "double[][]"]).prop_map(String::from),
        "[A-Z][a-zA-Z0-9]{0,8}",
    ]
}

fn wildcard() -> impl Strategy<Value = String> {
    prop::sample::select(vec![UNKNOWN_TOKEN, NULL_TOKEN]).prop_map(String::from)
}

fn signature() -> impl Strategy<Value = Signature> {
    ("[a-z][a-zA-Z0-9]{0,10}", prop::collection::vec(type_token(), 0..5))
        .prop_map(|(name, params)| Signature::new(name, params))
}

proptest! {
    #[test]
    fn prop_display_parses_back(sig in signature()) {
        prop_assert_eq!(Signature::parse(&sig.to_string()), sig);
    }

    #[test]
    fn prop_equivalence_is_reflexive(sig in signature()) {
        prop_assert!(sig.equivalent(&sig));
    }

    #[test]
    fn prop_equivalence_is_symmetric(a in signature(), b in signature()) {
        prop_assert_eq!(a.equivalent(&b), b.equivalent(&a));
    }

    #[test]
    fn prop_wildcards_match_any_type(
        sig in signature(),
        picks in prop::collection::vec((any::<bool>(), wildcard()), 5),
    ) {
        let params: Vec<String> = sig
            .params()
            .iter()
            .zip(&picks)
            .map(|(p, (replace, w))| if *replace { w.clone() } else { p.clone() })
            .collect();
        let provisional = Signature::new(sig.name(), params);
        prop_assert!(provisional.equivalent(&sig));
    }

    #[test]
    fn prop_arity_mismatch_never_matches(sig in signature(), extra in type_token()) {
        let mut params = sig.params().to_vec();
        params.push(extra);
        let longer = Signature::new(sig.name(), params);
        prop_assert!(!longer.equivalent(&sig));
        prop_assert_eq!(longer.arity(), sig.arity() + 1);
    }

    #[test]
    fn prop_names_must_agree(sig in signature(), other in "[a-z][a-zA-Z0-9]{0,10}") {
        prop_assume!(other != sig.name());
        let renamed = Signature::new(other, sig.params().to_vec());
        prop_assert!(!renamed.equivalent(&sig));
    }
}
