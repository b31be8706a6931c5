//! A hand-written jq-style query subset: `.`, `.field`, `.[n]`, `.[]`, `|`
//! pipes, `select(.field == literal)` (`spec.md` §6.2 `jq`).
//!
//! No corpus repo embeds a jq engine, and `spec.md` §1 explicitly scopes the
//! full query language out as an external collaborator's concern — only this
//! documented subset is specified, so it's implemented directly rather than
//! taking on an unverified third-party AST/parser dependency for a feature
//! the spec itself delegates (`jaq` was considered and rejected, see
//! `DESIGN.md`).

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSeg {
    Field(String),
    Index(usize),
    Iterate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Identity,
    Path(Vec<PathSeg>),
    Select { path: Vec<PathSeg>, literal: Literal },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Str(String),
    Bool(bool),
    Null,
    Number(String),
}

impl Literal {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Literal::Str(s) => value.as_str() == Some(s.as_str()),
            Literal::Bool(b) => value.as_bool() == Some(*b),
            Literal::Null => value.is_null(),
            Literal::Number(n) => value
                .as_f64()
                .zip(n.parse::<f64>().ok())
                .is_some_and(|(a, b)| (a - b).abs() < f64::EPSILON),
        }
    }
}

/// Evaluate `query` against `data`, returning every surviving value.
///
/// # Errors
///
/// Returns an error if `query` does not match the documented subset's
/// grammar (an unbalanced `select(...)`, or a `[` without a matching `]`).
pub fn run(query: &str, data: &Value) -> Result<Vec<Value>, String> {
    let mut items = vec![data.clone()];
    for stage_src in split_pipes(query) {
        let stage = parse_stage(stage_src.trim())?;
        items = apply_stage(&stage, items);
    }
    Ok(items)
}

fn split_pipes(query: &str) -> Vec<&str> {
    let mut stages = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in query.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '|' if depth == 0 => {
                stages.push(&query[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    stages.push(&query[start..]);
    stages
}

fn parse_stage(src: &str) -> Result<Stage, String> {
    if src == "." || src.is_empty() {
        return Ok(Stage::Identity);
    }

    if let Some(inner) = src.strip_prefix("select(").and_then(|s| s.strip_suffix(')')) {
        let (lhs, rhs) = inner
            .split_once("==")
            .ok_or_else(|| format!("select(...) must contain '==': '{src}'"))?;
        let path = parse_path(lhs.trim())?;
        let literal = parse_literal(rhs.trim());
        return Ok(Stage::Select { path, literal });
    }

    Ok(Stage::Path(parse_path(src)?))
}

fn parse_path(src: &str) -> Result<Vec<PathSeg>, String> {
    let mut segs = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                let mut ident = String::new();
                while let Some(&c2) = chars.peek() {
                    if c2.is_alphanumeric() || c2 == '_' || c2 == '-' {
                        ident.push(c2);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !ident.is_empty() {
                    segs.push(PathSeg::Field(ident));
                }
            }
            '[' => {
                chars.next();
                if chars.peek() == Some(&']') {
                    chars.next();
                    segs.push(PathSeg::Iterate);
                } else {
                    let mut digits = String::new();
                    while let Some(&c2) = chars.peek() {
                        if c2.is_ascii_digit() {
                            digits.push(c2);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if chars.peek() != Some(&']') {
                        return Err(format!("unterminated '[' in path '{src}'"));
                    }
                    chars.next();
                    let n = digits
                        .parse::<usize>()
                        .map_err(|_| format!("invalid index in path '{src}'"))?;
                    segs.push(PathSeg::Index(n));
                }
            }
            _ => {
                chars.next();
            }
        }
    }
    Ok(segs)
}

fn parse_literal(src: &str) -> Literal {
    if let Some(inner) = src.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return Literal::Str(inner.to_string());
    }
    match src {
        "true" => Literal::Bool(true),
        "false" => Literal::Bool(false),
        "null" => Literal::Null,
        _ if src.parse::<f64>().is_ok() => Literal::Number(src.to_string()),
        _ => Literal::Str(src.to_string()),
    }
}

fn apply_path(value: &Value, segs: &[PathSeg]) -> Vec<Value> {
    let mut current = vec![value.clone()];
    for seg in segs {
        let mut next = Vec::new();
        for v in &current {
            match seg {
                PathSeg::Field(name) => {
                    if let Some(found) = v.get(name) {
                        next.push(found.clone());
                    }
                }
                PathSeg::Index(i) => {
                    if let Some(found) = v.as_array().and_then(|a| a.get(*i)) {
                        next.push(found.clone());
                    }
                }
                PathSeg::Iterate => match v {
                    Value::Array(arr) => next.extend(arr.iter().cloned()),
                    Value::Object(map) => next.extend(map.values().cloned()),
                    _ => {}
                },
            }
        }
        current = next;
    }
    current
}

fn apply_stage(stage: &Stage, items: Vec<Value>) -> Vec<Value> {
    match stage {
        Stage::Identity => items,
        Stage::Path(segs) => items.iter().flat_map(|v| apply_path(v, segs)).collect(),
        Stage::Select { path, literal } => items
            .into_iter()
            .filter(|v| apply_path(v, path).iter().any(|found| literal.matches(found)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_returns_whole_document() {
        let data = json!({"a": 1});
        assert_eq!(run(".", &data).unwrap(), vec![data]);
    }

    #[test]
    fn field_access() {
        let data = json!({"a": {"b": 2}});
        assert_eq!(run(".a.b", &data).unwrap(), vec![json!(2)]);
    }

    #[test]
    fn index_access() {
        let data = json!({"items": [10, 20, 30]});
        assert_eq!(run(".items[1]", &data).unwrap(), vec![json!(20)]);
    }

    #[test]
    fn iterate_array() {
        let data = json!({"items": [1, 2, 3]});
        assert_eq!(run(".items[]", &data).unwrap(), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn pipe_chains_stages() {
        let data = json!({"users": [{"name": "Alice"}, {"name": "Bob"}]});
        assert_eq!(
            run(".users[] | .name", &data).unwrap(),
            vec![json!("Alice"), json!("Bob")]
        );
    }

    #[test]
    fn select_filters_on_equality() {
        let data = json!({"users": [{"name": "Alice", "admin": true}, {"name": "Bob", "admin": false}]});
        let result = run(".users[] | select(.admin == true)", &data).unwrap();
        assert_eq!(result, vec![json!({"name": "Alice", "admin": true})]);
    }

    #[test]
    fn select_with_string_literal() {
        let data = json!({"users": [{"name": "Alice"}, {"name": "Bob"}]});
        let result = run(r#".users[] | select(.name == "Bob")"#, &data).unwrap();
        assert_eq!(result, vec![json!({"name": "Bob"})]);
    }

    #[test]
    fn missing_field_yields_no_output() {
        let data = json!({"a": 1});
        assert!(run(".missing", &data).unwrap().is_empty());
    }
}
