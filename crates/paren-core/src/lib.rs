pub mod diagnostic;
pub mod span;

pub use diagnostic::Diagnostic;
pub use span::{Location, Position, Range};
