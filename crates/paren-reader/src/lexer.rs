use paren_core::{Position, Range};

/// Lexical token kind. The resolver never rewrites these; semantic
/// highlighting upgrades live in [`Token::display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Comment,
    Number,
    Variable,
}

/// Display upgrade applied by the resolver: the head of a special form
/// highlights as a keyword, a callee or defined name as a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayKind {
    Keyword,
    Function,
}

/// Index of a token in an analysis' token vector. Definitions and their
/// uses reference binding sites through these indices.
pub type TokenId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub range: Range,
    pub display: Option<DisplayKind>,
}

impl Token {
    /// The semantic-token type name this token highlights as, if any.
    /// Parentheses have none.
    pub fn semantic_name(&self) -> Option<&'static str> {
        match self.display {
            Some(DisplayKind::Keyword) => Some("keyword"),
            Some(DisplayKind::Function) => Some("function"),
            None => match self.kind {
                TokenKind::Comment => Some("comment"),
                TokenKind::Number => Some("number"),
                TokenKind::Variable => Some("variable"),
                TokenKind::LParen | TokenKind::RParen => None,
            },
        }
    }
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n' | '(' | ')' | ';')
}

/// Tokenize a document. Total: any input produces a token sequence, and
/// every non-whitespace character lands in exactly one token.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 0u32;
    let mut character = 0u32;

    while i < chars.len() {
        if matches!(chars[i], ' ' | '\t' | '\r' | '\n') {
            if chars[i] == '\n' {
                line += 1;
                character = 0;
            } else {
                character += 1;
            }
            i += 1;
            continue;
        }

        let start = Position::new(line, character);
        let begin = i;
        let kind = match chars[i] {
            '(' => {
                i += 1;
                character += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                character += 1;
                TokenKind::RParen
            }
            ';' => {
                // Line comment: consume to end of line, leaving the
                // newline for the whitespace skipper.
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                    character += 1;
                }
                TokenKind::Comment
            }
            _ => {
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                    character += 1;
                }
                let text: String = chars[begin..i].iter().collect();
                if parse_number(&text).is_some() {
                    TokenKind::Number
                } else {
                    TokenKind::Variable
                }
            }
        };

        let end = Position::new(line, character);
        tokens.push(Token {
            kind,
            text: chars[begin..i].iter().collect(),
            range: Range::new(start, end),
            display: None,
        });
    }

    tokens
}

/// Numeric classification for atom tokens, mirroring the permissive
/// coercion the original editor tooling used: an optional sign followed
/// by a decimal literal or `Infinity`, or an unsigned `0x`/`0o`/`0b`
/// radix literal. `NaN` is not a number here.
pub fn parse_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let (sign, rest) = match bytes.first()? {
        b'+' => (1.0, &text[1..]),
        b'-' => (-1.0, &text[1..]),
        _ => (1.0, text),
    };

    if rest == "Infinity" {
        return Some(sign * f64::INFINITY);
    }

    // Radix literals never take a sign.
    if rest.len() == text.len() {
        for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
            if let Some(digits) = text
                .strip_prefix(prefix)
                .or_else(|| text.strip_prefix(&prefix.to_uppercase()))
            {
                return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
            }
        }
    }

    if is_decimal(rest) {
        rest.parse::<f64>().ok().map(|n| sign * n)
    } else {
        None
    }
}

/// `digits`, `digits.`, `digits.digits`, or `.digits`, with an optional
/// `e`/`E` exponent carrying an optional sign and at least one digit.
fn is_decimal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut mantissa = false;

    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa = true;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa = true;
        }
    }
    if !mantissa {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let mut exponent = false;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            exponent = true;
        }
        if !exponent {
            return false;
        }
    }
    i == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t\r\n").is_empty());
    }

    #[test]
    fn parens_and_atoms() {
        assert_eq!(
            kinds("(+ 1 x)"),
            vec![
                TokenKind::LParen,
                TokenKind::Variable,
                TokenKind::Number,
                TokenKind::Variable,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn adjacent_parens_split() {
        assert_eq!(
            kinds("(()"),
            vec![TokenKind::LParen, TokenKind::LParen, TokenKind::RParen]
        );
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let tokens = tokenize("; hey (1 2)\nx");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text, "; hey (1 2)");
        assert_eq!(tokens[1].kind, TokenKind::Variable);
        assert_eq!(tokens[1].range.start, Position::new(1, 0));
    }

    #[test]
    fn comment_at_end_of_input() {
        let tokens = tokenize("; trailing");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Comment);
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = tokenize("(a\n  bc)");
        assert_eq!(tokens[0].range, span(0, 0, 0, 1)); // (
        assert_eq!(tokens[1].range, span(0, 1, 0, 2)); // a
        assert_eq!(tokens[2].range, span(1, 2, 1, 4)); // bc
        assert_eq!(tokens[3].range, span(1, 4, 1, 5)); // )
    }

    #[test]
    fn end_position_is_exclusive_column() {
        let tokens = tokenize("abc");
        assert_eq!(tokens[0].range, span(0, 0, 0, 3));
    }

    #[test]
    fn delimiters_terminate_atoms() {
        let tokens = tokenize("a;b");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "a");
        assert_eq!(tokens[1].text, ";b");
    }

    #[test]
    fn number_classification() {
        for text in ["0", "42", "-1", "+5", "3.25", "1.", ".5", "1e3", "1E-2", "Infinity",
                     "-Infinity", "0x1f", "0b101", "0o17"] {
            assert_eq!(kinds(text), vec![TokenKind::Number], "{text}");
        }
        for text in ["x", "+", "-", "1x", "NaN", "0x", "1e", "1.2.3", "-0x1", "infinity", "."] {
            assert_eq!(kinds(text), vec![TokenKind::Variable], "{text}");
        }
    }

    #[test]
    fn parse_number_values() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-1.5"), Some(-1.5));
        assert_eq!(parse_number("0x10"), Some(16.0));
        assert_eq!(parse_number("1e2"), Some(100.0));
        assert_eq!(parse_number("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_number("foo"), None);
    }

    fn span(l1: u32, c1: u32, l2: u32, c2: u32) -> Range {
        Range::new(Position::new(l1, c1), Position::new(l2, c2))
    }
}
