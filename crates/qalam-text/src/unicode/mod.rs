pub mod bidi;
pub mod breaks;
pub mod script;
pub mod whitespace;

pub use bidi::{BaseDirection, BidiParagraph, BidiRun};
pub use script::ScriptRun;
