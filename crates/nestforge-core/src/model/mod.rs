//! Model sources: parsed representation, parser and declaration extraction.
//!
//! ```text
//! script ──► ModelParser ──► ParsedModel ──► extract_declarations ──► [DeclarationRecord]
//! ```

mod ast;
mod extract;
mod parser;

pub use ast::{
    Block, BlockKind, Declaration, Expression, ModelKind, NumericLiteral, ParsedModel, Unit,
};
pub use extract::{DeclarationRecord, DeclarationValue, Specs, extract_declarations, extract_specs};
pub use parser::{DeclarationParser, ModelParser, parse_expression, parse_model};
