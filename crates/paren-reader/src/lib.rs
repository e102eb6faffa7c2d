pub mod lexer;
pub mod parser;

pub use lexer::{parse_number, tokenize, DisplayKind, Token, TokenId, TokenKind};
pub use parser::{parse, ParseKind, ParseNode};
