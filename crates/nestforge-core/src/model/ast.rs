//! Parsed model representation.

use std::fmt;

/// Kind of element a model declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Neuron,
    Synapse,
    Model,
}

impl ModelKind {
    /// Map a header keyword to a model kind.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "neuron" => Some(Self::Neuron),
            "synapse" => Some(Self::Synapse),
            "model" => Some(Self::Model),
            _ => None,
        }
    }
}

/// Declaration blocks recognized inside a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Parameters,
    State,
    Internals,
}

impl BlockKind {
    /// Map a block header (without the trailing colon) to a block kind.
    pub fn from_header(header: &str) -> Option<Self> {
        match header {
            "parameters" => Some(Self::Parameters),
            "state" => Some(Self::State),
            "internals" => Some(Self::Internals),
            _ => None,
        }
    }

    /// Keyword used for the block in model sources.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parameters => "parameters",
            Self::State => "state",
            Self::Internals => "internals",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A numeric literal as written in the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericLiteral {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for NumericLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A physical unit referenced by an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
}

/// Right-hand side of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal number with an optional unit expression, e.g. `250 pF`.
    Numeric {
        literal: NumericLiteral,
        text: String,
        unit: Option<String>,
    },

    /// `true` / `false`.
    Boolean(bool),

    /// Unary minus applied to an operand.
    Negated(Box<Expression>),

    /// Anything the parser does not reduce further (variables, calls, arithmetic).
    Symbolic(String),
}

impl Expression {
    /// The literal numeric value, if this expression is a bare number.
    pub fn numeric_literal(&self) -> Option<NumericLiteral> {
        match self {
            Self::Numeric { literal, .. } => Some(*literal),
            _ => None,
        }
    }

    /// Whether the expression carries a physical unit.
    pub fn has_unit(&self) -> bool {
        !self.units().is_empty()
    }

    /// Units referenced by the expression, in order of appearance.
    pub fn units(&self) -> Vec<Unit> {
        match self {
            Self::Numeric {
                unit: Some(unit), ..
            } => unit
                .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .filter(|token| token.starts_with(|c: char| c.is_ascii_alphabetic()))
                .map(|token| Unit {
                    name: token.to_string(),
                })
                .collect(),
            Self::Negated(inner) => inner.units(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric {
                text,
                unit: Some(unit),
                ..
            } => write!(f, "{} {}", text, unit),
            Self::Numeric { text, unit: None, .. } => f.write_str(text),
            Self::Boolean(value) => write!(f, "{}", value),
            Self::Negated(inner) => write!(f, "-{}", inner),
            Self::Symbolic(text) => f.write_str(text),
        }
    }
}

/// One variable binding inside a declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Bound variable names, in source order.
    pub variables: Vec<String>,

    /// Declared data type or unit type, e.g. `mV`, `real`, `boolean`.
    pub data_type: String,

    /// Initializing expression, when present.
    pub expression: Option<Expression>,

    /// Attached documentation comment, markers stripped.
    pub comment: Option<String>,

    /// Whether the declaration is marked `recordable`.
    pub recordable: bool,

    /// 1-based source line.
    pub line: usize,
}

/// A declaration block and its declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub declarations: Vec<Declaration>,
    pub line: usize,
}

/// A model as produced by a [`super::ModelParser`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModel {
    pub name: String,
    pub kind: ModelKind,
    pub blocks: Vec<Block>,
}

impl ParsedModel {
    /// All blocks of a kind, in source order.
    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |block| block.kind == kind)
    }

    /// First block of a kind.
    pub fn first_block(&self, kind: BlockKind) -> Option<&Block> {
        self.blocks_of(kind).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(text: &str, literal: NumericLiteral, unit: Option<&str>) -> Expression {
        Expression::Numeric {
            literal,
            text: text.to_string(),
            unit: unit.map(str::to_string),
        }
    }

    #[test]
    fn test_display_round_trips_text() {
        let expr = Expression::Negated(Box::new(numeric(
            "65",
            NumericLiteral::Integer(65),
            Some("mV"),
        )));
        assert_eq!(expr.to_string(), "-65 mV");
        assert_eq!(Expression::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_units() {
        let expr = numeric("1", NumericLiteral::Integer(1), Some("nS/mV"));
        let names: Vec<_> = expr.units().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["nS", "mV"]);

        let negated = Expression::Negated(Box::new(expr));
        assert!(negated.has_unit());
        assert_eq!(negated.numeric_literal(), None);

        assert!(!Expression::Symbolic("V_th".into()).has_unit());
    }
}
