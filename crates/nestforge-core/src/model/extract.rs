//! Reduce declarations to normalized `{id, label, value, unit}` records.

use serde::Serialize;

use crate::error::{Error, Result};

use super::ast::{BlockKind, Declaration, Expression, NumericLiteral, ParsedModel};
use super::parser::ModelParser;

/// Extracted value of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeclarationValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl DeclarationValue {
    fn signed(literal: NumericLiteral, negative: bool) -> Self {
        match (literal, negative) {
            (NumericLiteral::Integer(v), false) => Self::Integer(v),
            (NumericLiteral::Integer(v), true) => Self::Integer(v.wrapping_neg()),
            (NumericLiteral::Float(v), false) => Self::Float(v),
            (NumericLiteral::Float(v), true) => Self::Float(-v),
        }
    }
}

/// Normalized declaration.
///
/// Fields that could not be extracted are left out of the serialized record
/// entirely; they never appear as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeclarationRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<DeclarationValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Parameters and states of a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Specs {
    pub params: Vec<DeclarationRecord>,
    pub states: Vec<DeclarationRecord>,
}

/// Extract records from the first block of `kind`.
///
/// An absent model yields no records. A model without a block of the
/// requested kind is an [`Error::MissingBlock`]; callers decide whether that
/// means "nothing declared".
pub fn extract_declarations(
    model: Option<&ParsedModel>,
    kind: BlockKind,
) -> Result<Vec<DeclarationRecord>> {
    let Some(model) = model else {
        return Ok(Vec::new());
    };

    let block = model.first_block(kind).ok_or_else(|| Error::MissingBlock {
        model: model.name.clone(),
        block: kind.name(),
    })?;

    Ok(block
        .declarations
        .iter()
        .map(|declaration| extract_record(declaration, kind))
        .collect())
}

/// Parse `script` and extract its parameters and states.
///
/// A model without a state block has no states; a missing parameters block
/// is an error.
pub fn extract_specs(parser: &dyn ModelParser, script: &str) -> Result<Specs> {
    let model = parser.parse(script)?;
    let params = extract_declarations(Some(&model), BlockKind::Parameters)?;
    let states = match extract_declarations(Some(&model), BlockKind::State) {
        Ok(states) => states,
        Err(Error::MissingBlock { .. }) => Vec::new(),
        Err(e) => return Err(e),
    };
    Ok(Specs { params, states })
}

fn extract_record(declaration: &Declaration, kind: BlockKind) -> DeclarationRecord {
    let id = declaration.variables.first().cloned();
    let label = declaration
        .comment
        .as_deref()
        .map(|c| c.trim_start_matches('#').trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let Some(expression) = declaration.expression.as_ref() else {
        return DeclarationRecord {
            id,
            label,
            ..Default::default()
        };
    };

    if kind == BlockKind::State && declaration.data_type == "boolean" {
        return DeclarationRecord {
            id,
            label,
            value: Some(DeclarationValue::Boolean(truthiness(&expression.to_string()))),
            unit: None,
        };
    }

    let (negative, expression) = unwrap_negation(expression);
    let value = expression
        .numeric_literal()
        .map(|literal| DeclarationValue::signed(literal, negative));
    let unit = expression.units().into_iter().next().map(|unit| unit.name);

    DeclarationRecord {
        id,
        label,
        value,
        unit,
    }
}

/// Fold one leading negation into a sign.
fn unwrap_negation(expression: &Expression) -> (bool, &Expression) {
    if !expression.to_string().starts_with('-') {
        return (false, expression);
    }
    match expression {
        Expression::Negated(inner) => (true, inner),
        other => (true, other),
    }
}

/// Truthiness of a boolean expression's source text.
fn truthiness(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && !text.eq_ignore_ascii_case("false")
}
