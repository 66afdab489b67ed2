//! Line-oriented parser for model headers and declaration blocks.
//!
//! Only the structure the build pipeline and the declaration extractor need is
//! recognized:
//!
//! ```text
//! model iaf_psc_alpha:
//!     parameters:
//!         # Membrane capacitance
//!         C_m pF = 250 pF
//!         E_L mV = -70 mV      # Resting potential
//!     state:
//!         V_m mV = E_L
//!         refr boolean = false
//!     update:
//!         ...                  # skipped
//! ```
//!
//! Blocks other than `parameters`, `state` and `internals` are skipped, as is
//! everything after the first model. The older `end`-terminated block style is
//! accepted as long as block bodies are indented.

use crate::error::{Error, Result};

use super::ast::{Block, BlockKind, Declaration, Expression, ModelKind, NumericLiteral, ParsedModel};

/// Turns model source text into a [`ParsedModel`].
pub trait ModelParser: Send + Sync {
    fn parse(&self, script: &str) -> Result<ParsedModel>;
}

/// The built-in parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationParser;

impl DeclarationParser {
    pub fn new() -> Self {
        Self
    }
}

impl ModelParser for DeclarationParser {
    fn parse(&self, script: &str) -> Result<ParsedModel> {
        parse_model(script)
    }
}

/// A block whose body is still being read.
struct OpenBlock {
    kind: Option<BlockKind>,
    indent: usize,
    line: usize,
    declarations: Vec<Declaration>,
}

impl OpenBlock {
    fn close(self, blocks: &mut Vec<Block>) {
        if let Some(kind) = self.kind {
            blocks.push(Block {
                kind,
                declarations: self.declarations,
                line: self.line,
            });
        }
    }
}

/// Parse the first model in `script`.
pub fn parse_model(script: &str) -> Result<ParsedModel> {
    let mut header: Option<(ModelKind, String)> = None;
    let mut blocks = Vec::new();
    let mut current: Option<OpenBlock> = None;
    let mut pending_comments: Vec<String> = Vec::new();
    let mut in_docstring = false;

    for (idx, raw) in script.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();

        let quotes = trimmed.matches("\"\"\"").count();
        if in_docstring {
            if quotes % 2 == 1 {
                in_docstring = false;
            }
            continue;
        }
        if trimmed.starts_with("\"\"\"") {
            in_docstring = quotes % 2 == 1;
            continue;
        }

        if trimmed.is_empty() {
            pending_comments.clear();
            continue;
        }

        let (code, _) = split_comment(trimmed);

        if let Some((kind, name)) = parse_model_header(code) {
            if header.is_some() {
                break;
            }
            header = Some((kind, name));
            continue;
        }

        if header.is_none() {
            // License headers, imports and the like
            continue;
        }

        let indent = indentation(raw);

        if let Some(open) = current.as_mut() {
            if indent > open.indent && code != "end" {
                if open.kind.is_some() {
                    if code.is_empty() {
                        pending_comments.push(comment_text(trimmed).to_string());
                    } else {
                        let comments = std::mem::take(&mut pending_comments);
                        open.declarations
                            .push(parse_declaration(trimmed, line_no, comments)?);
                    }
                }
                continue;
            }

            if let Some(open) = current.take() {
                open.close(&mut blocks);
            }
        }

        pending_comments.clear();

        if code.is_empty() || code == "end" {
            continue;
        }

        if let Some(block_header) = code.strip_suffix(':') {
            current = Some(OpenBlock {
                kind: BlockKind::from_header(block_header.trim()),
                indent,
                line: line_no,
                declarations: Vec::new(),
            });
        }
    }

    if let Some(open) = current.take() {
        open.close(&mut blocks);
    }

    let Some((kind, name)) = header else {
        return Err(Error::parse(
            "no model declaration found (expected 'model <name>:')",
            None,
        ));
    };

    Ok(ParsedModel { name, kind, blocks })
}

/// Match `neuron <name>:`, `synapse <name>:` or `model <name>:`.
fn parse_model_header(code: &str) -> Option<(ModelKind, String)> {
    let body = code.strip_suffix(':')?;
    let (keyword, rest) = body.split_once(char::is_whitespace)?;
    let kind = ModelKind::from_keyword(keyword)?;
    let name = rest.trim();
    is_variable_name(name).then(|| (kind, name.to_string()))
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Split a line into code and an optional trailing comment.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find('#') {
        Some(pos) => (line[..pos].trim(), Some(comment_text(&line[pos..]))),
        None => (line.trim(), None),
    }
}

/// Strip leading comment markers and surrounding whitespace.
fn comment_text(comment: &str) -> &str {
    comment
        .trim_start_matches(|c: char| c == '#' || c.is_whitespace())
        .trim_end()
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\'')
}

/// Drop a vector size suffix such as `[n_receptors]`.
fn strip_vector_size(name: &str) -> &str {
    match (name.find('['), name.ends_with(']')) {
        (Some(pos), true) => name[..pos].trim_end(),
        _ => name,
    }
}

/// Parse `[recordable] name[, name...] type [= expr] [[[invariant]]] [# comment]`.
fn parse_declaration(line: &str, line_no: usize, pre_comments: Vec<String>) -> Result<Declaration> {
    let (code, inline_comment) = split_comment(line);

    // Invariants are written as a trailing `[[ ... ]]`
    let code = match code.find("[[") {
        Some(pos) => code[..pos].trim_end(),
        None => code,
    };

    // Annotations such as `@nest::delay` trail the expression
    let code = match code.find('@') {
        Some(pos) => code[..pos].trim_end(),
        None => code,
    };

    let (lhs, rhs) = match code.split_once('=') {
        Some((lhs, rhs)) => (lhs.trim(), Some(rhs.trim())),
        None => (code, None),
    };

    let (recordable, lhs) = match lhs.strip_prefix("recordable") {
        Some(rest) if rest.starts_with(char::is_whitespace) => (true, rest.trim_start()),
        _ => (false, lhs),
    };

    let mut names: Vec<&str> = lhs.split(',').map(str::trim).collect();
    let last = names.pop().unwrap_or_default();
    let Some((last_name, data_type)) = last.split_once(char::is_whitespace) else {
        return Err(Error::parse(
            format!("missing data type in declaration '{}'", code),
            line_no,
        ));
    };
    names.push(last_name);

    let mut variables = Vec::with_capacity(names.len());
    for name in names {
        let name = strip_vector_size(name);
        if !is_variable_name(name) {
            return Err(Error::parse(
                format!("invalid variable name '{}'", name),
                line_no,
            ));
        }
        variables.push(name.to_string());
    }

    let expression = match rhs {
        Some("") => {
            return Err(Error::parse(
                format!("missing expression after '=' for '{}'", variables[0]),
                line_no,
            ));
        }
        Some(text) => Some(parse_expression(text)),
        None => None,
    };

    let comment = inline_comment
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let joined = pre_comments
                .iter()
                .map(String::as_str)
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        });

    Ok(Declaration {
        variables,
        data_type: data_type.trim().to_string(),
        expression,
        comment,
        recordable,
        line: line_no,
    })
}

/// Parse an initializing expression.
///
/// A leading `-` becomes [`Expression::Negated`] only when what follows is a
/// single operand; `-a + b` stays symbolic.
pub fn parse_expression(text: &str) -> Expression {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('-') {
        if let Some(operand) = parse_operand(rest.trim_start()) {
            return Expression::Negated(Box::new(operand));
        }
    } else if let Some(rest) = text.strip_prefix('+') {
        if let Some(operand) = parse_operand(rest.trim_start()) {
            return operand;
        }
    }

    parse_operand(text).unwrap_or_else(|| Expression::Symbolic(text.to_string()))
}

fn parse_operand(text: &str) -> Option<Expression> {
    match text {
        "true" | "True" => return Some(Expression::Boolean(true)),
        "false" | "False" => return Some(Expression::Boolean(false)),
        _ => {}
    }

    if is_variable_name(text) {
        return Some(Expression::Symbolic(text.to_string()));
    }

    let (literal_text, rest) = split_numeric(text)?;
    let literal = parse_literal(literal_text)?;

    let unit = if rest.is_empty() {
        None
    } else if is_unit_expression(rest) {
        Some(rest.to_string())
    } else {
        return None;
    };

    Some(Expression::Numeric {
        literal,
        text: literal_text.to_string(),
        unit,
    })
}

/// Split a leading numeric literal from the rest of the text.
fn split_numeric(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let digits_start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > digits_start {
            end = exp;
        }
    }

    Some((&text[..end], text[end..].trim_start()))
}

fn parse_literal(text: &str) -> Option<NumericLiteral> {
    if text.contains(['.', 'e', 'E']) {
        return text.parse().ok().map(NumericLiteral::Float);
    }
    match text.parse::<i64>() {
        Ok(v) => Some(NumericLiteral::Integer(v)),
        Err(_) => text.parse().ok().map(NumericLiteral::Float),
    }
}

/// Unit expressions start with a unit name (or a `1/` reciprocal) and
/// contain only names, exponents, `*`, `/` and parentheses, e.g. `mV`,
/// `nS/mV`, `m**2`, `1/ms`.
fn is_unit_expression(text: &str) -> bool {
    let body = text.strip_prefix("1/").map_or(text, str::trim_start);
    body.starts_with(|c: char| c.is_ascii_alphabetic())
        && body.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '*' | '/' | '(' | ')' | ' ')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IAF: &str = r#"# iaf_psc_alpha - leaky integrate-and-fire neuron
"""
Docstring mentioning model fake_name:
"""
model iaf_psc_alpha:
    state:
        V_m mV = E_L    # Membrane potential
        refr_t ms = 0 ms
        is_refractory boolean = false

    equations:
        V_m' = -(V_m - E_L) / tau_m

    parameters:
        # Capacitance of the membrane
        C_m pF = 250 pF
        tau_m ms = 10 ms
        E_L mV = -70 mV     # Resting potential
        V_reset, V_th mV = -65 mV [[V_reset < V_th]]
        recordable I_e pA = 0 pA
        n_receptors integer = 2

    update:
        if is_refractory:
            refr_t -= resolution()
"#;

    #[test]
    fn test_parse_header_and_blocks() {
        let model = parse_model(IAF).unwrap();
        assert_eq!(model.name, "iaf_psc_alpha");
        assert_eq!(model.kind, ModelKind::Model);

        let kinds: Vec<_> = model.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BlockKind::State, BlockKind::Parameters]);
    }

    #[test]
    fn test_parse_declarations() {
        let model = parse_model(IAF).unwrap();
        let params = &model.first_block(BlockKind::Parameters).unwrap().declarations;
        assert_eq!(params.len(), 6);

        assert_eq!(params[0].variables, vec!["C_m"]);
        assert_eq!(params[0].data_type, "pF");
        assert_eq!(params[0].comment.as_deref(), Some("Capacitance of the membrane"));

        assert_eq!(params[2].comment.as_deref(), Some("Resting potential"));
        assert_eq!(params[2].expression.as_ref().unwrap().to_string(), "-70 mV");

        assert_eq!(params[3].variables, vec!["V_reset", "V_th"]);
        assert_eq!(params[3].expression.as_ref().unwrap().to_string(), "-65 mV");

        assert!(params[4].recordable);
        assert_eq!(params[4].variables, vec!["I_e"]);

        assert_eq!(params[1].comment, None);
        assert_eq!(params[5].line, 21);
    }

    #[test]
    fn test_old_end_style() {
        let script = "neuron old_style:\n  parameters:\n    tau ms = 5 ms\n  end\n  state:\n    x real = 1.5\n  end\nend\n";
        let model = parse_model(script).unwrap();
        assert_eq!(model.kind, ModelKind::Neuron);
        assert_eq!(model.blocks.len(), 2);
        assert_eq!(model.blocks[1].declarations[0].variables, vec!["x"]);
    }

    #[test]
    fn test_only_first_model_is_read() {
        let script = "synapse first:\n    parameters:\n        w real = 1\nsynapse second:\n    parameters:\n        d ms = 1 ms\n";
        let model = parse_model(script).unwrap();
        assert_eq!(model.name, "first");
        assert_eq!(model.kind, ModelKind::Synapse);
        assert_eq!(model.blocks.len(), 1);
    }

    #[test]
    fn test_missing_header() {
        let err = parse_model("parameters:\n    a real = 1\n").unwrap_err();
        assert_eq!(err.kind(), "ParseError");
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_missing_type_reports_line() {
        let script = "model broken:\n    parameters:\n        C_m = 250 pF\n";
        let err = parse_model(script).unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().contains("missing data type"));
    }

    #[test]
    fn test_parse_expression_forms() {
        assert_eq!(
            parse_expression("-65"),
            Expression::Negated(Box::new(Expression::Numeric {
                literal: NumericLiteral::Integer(65),
                text: "65".into(),
                unit: None,
            }))
        );
        assert_eq!(
            parse_expression("2.5e-3 nS"),
            Expression::Numeric {
                literal: NumericLiteral::Float(2.5e-3),
                text: "2.5e-3".into(),
                unit: Some("nS".into()),
            }
        );
        assert_eq!(parse_expression("true"), Expression::Boolean(true));
        assert_eq!(
            parse_expression("-V_th"),
            Expression::Negated(Box::new(Expression::Symbolic("V_th".into())))
        );
        assert_eq!(
            parse_expression("-5 mV + V_th"),
            Expression::Symbolic("-5 mV + V_th".into())
        );
        assert_eq!(
            parse_expression("exp(-1)"),
            Expression::Symbolic("exp(-1)".into())
        );
    }

    #[test]
    fn test_reciprocal_unit() {
        assert_eq!(
            parse_expression("10 1/s"),
            Expression::Numeric {
                literal: NumericLiteral::Integer(10),
                text: "10".into(),
                unit: Some("1/s".into()),
            }
        );
        assert_eq!(parse_expression("10 1/s").units()[0].name, "s");
    }

    #[test]
    fn test_annotations_are_dropped() {
        let script = "synapse stdp:\n    parameters:\n        d ms = 1 ms @nest::delay  # Synaptic transmission delay\n        w real = 1 @nest::weight\n";
        let model = parse_model(script).unwrap();
        let declarations = &model.blocks[0].declarations;

        let delay = &declarations[0];
        assert_eq!(delay.variables, vec!["d"]);
        assert_eq!(delay.comment.as_deref(), Some("Synaptic transmission delay"));
        assert_eq!(
            delay.expression,
            Some(Expression::Numeric {
                literal: NumericLiteral::Integer(1),
                text: "1".into(),
                unit: Some("ms".into()),
            })
        );
        assert_eq!(declarations[1].expression.as_ref().map(|e| e.to_string()), Some("1".into()));
    }
}
