// Property tests for the Java lexer.
//
// Invariants checked over generated input:
// 1. lex() never panics and is deterministic
// 2. spans are ordered, non-overlapping and inside the source
// 3. generated identifiers, integers and whitespace lex to the expected kinds

use j2ir::lexer::{lex, token::Token};
use proptest::prelude::*;

const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "continue", "default",
    "do", "double", "else", "enum", "extends", "final", "finally", "float", "for", "if", "implements", "import",
    "instanceof", "int", "interface", "long", "native", "new", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while", "true", "false", "null",
];

fn identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z_$][a-zA-Z0-9_$]{0,12}".prop_filter("reserved words are not identifiers", |s| {
        !KEYWORDS.contains(&s.as_str())
    })
}

#[test]
fn prop_lexer_never_panics() {
    proptest!(|(source in "\\PC{0,500}")| {
        let _ = lex(&source);
    });
}

#[test]
fn prop_lexing_is_deterministic() {
    proptest!(|(source in "\\PC{0,300}")| {
        let first = lex(&source);
        let second = lex(&source);
        prop_assert_eq!(first.is_ok(), second.is_ok());
        if let (Ok(a), Ok(b)) = (first, second) {
            prop_assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(&b) {
                prop_assert_eq!(x.node, y.node);
                prop_assert_eq!(x.span, y.span);
            }
        }
    });
}

#[test]
fn prop_spans_are_ordered_and_in_bounds() {
    proptest!(|(source in "[a-z0-9 +*/;(){}\\[\\]=<>.\\n-]{0,200}")| {
        if let Ok(tokens) = lex(&source) {
            let mut last_end = 0;
            for tok in &tokens {
                prop_assert!(tok.span.start >= last_end);
                prop_assert!(tok.span.start < tok.span.end);
                prop_assert!(tok.span.end <= source.len());
                last_end = tok.span.end;
            }
        }
    });
}

proptest! {
    #[test]
    fn prop_identifiers_lex_to_one_token(name in identifier()) {
        let tokens = lex(&name).unwrap();
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].node, Token::Ident);
    }

    #[test]
    fn prop_decimal_integers(n in 0u64..1_000_000_000) {
        let source = n.to_string();
        let tokens = lex(&source).unwrap();
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].node, Token::IntLit);

        let long = format!("{n}L");
        prop_assert_eq!(lex(&long).unwrap()[0].node, Token::LongLit);
    }

    #[test]
    fn prop_whitespace_and_comments_are_skipped(
        names in prop::collection::vec(identifier(), 1..8),
        sep in prop::sample::select(vec![" ", "\t", "\n", " /* c */ ", " // c\n"]),
    ) {
        let source = names.join(sep);
        let tokens = lex(&source).unwrap();
        prop_assert_eq!(tokens.len(), names.len());
        for (tok, name) in tokens.iter().zip(&names) {
            prop_assert_eq!(&source[tok.span.start..tok.span.end], name.as_str());
        }
    }
}
