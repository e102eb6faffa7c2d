use proptest::prelude::*;

use paren_core::Position;
use paren_reader::{parse, tokenize, TokenKind};

proptest! {
    #[test]
    fn lexer_never_panics(input in "\\PC*") {
        let _ = tokenize(&input);
    }

    #[test]
    fn parser_never_panics(input in "\\PC*") {
        let tokens = tokenize(&input);
        let mut diagnostics = Vec::new();
        let _ = parse(&tokens, &mut diagnostics);
    }

    /// Concatenating token texts reconstructs the non-whitespace input.
    #[test]
    fn token_texts_reconstruct_input(input in "\\PC*") {
        let lexed: String = tokenize(&input).iter().map(|t| t.text.as_str()).collect();
        let expected: String = {
            // Comments swallow their whole line, so strip them the same way.
            let mut out = String::new();
            let mut in_comment = false;
            for ch in input.chars() {
                if ch == '\n' {
                    in_comment = false;
                }
                if ch == ';' {
                    in_comment = true;
                }
                if in_comment || !matches!(ch, ' ' | '\t' | '\r' | '\n') {
                    out.push(ch);
                }
            }
            out
        };
        prop_assert_eq!(lexed, expected);
    }

    /// Every token's end position equals the position reached by stepping
    /// through its text character by character from its start.
    #[test]
    fn end_positions_match_character_stepping(input in "\\PC*") {
        for token in tokenize(&input) {
            let mut pos = token.range.start;
            for ch in token.text.chars() {
                if ch == '\n' {
                    pos = Position::new(pos.line + 1, 0);
                } else {
                    pos.character += 1;
                }
            }
            prop_assert_eq!(pos, token.range.end);
        }
    }

    /// Tokens come out in document order with non-overlapping ranges.
    #[test]
    fn token_ranges_are_ordered(input in "\\PC*") {
        let tokens = tokenize(&input);
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].range.end <= pair[1].range.start);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Delimiter soup always parses into some tree, with a diagnostic for
    /// every unmatched close paren.
    #[test]
    fn delimiter_soup_recovers(
        input in prop::collection::vec(
            prop_oneof![
                Just("("),
                Just(")"),
                Just(" "),
                Just("1"),
                Just("foo"),
                Just("; c\n"),
            ],
            0..50
        ).prop_map(|v| v.join(""))
    ) {
        let tokens = tokenize(&input);
        let mut diagnostics = Vec::new();
        let nodes = parse(&tokens, &mut diagnostics);
        let atoms = tokens
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Comment))
            .count();
        if atoms > 0 {
            prop_assert!(!nodes.is_empty());
        }
    }
}
