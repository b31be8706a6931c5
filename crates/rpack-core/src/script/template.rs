//! Text-template evaluation over in-memory data (`spec.md` §6.2 `template`).
//!
//! Grounded on `stencila-stencila/rust/kernel-jinja`'s use of `minijinja` as
//! the embedded templating engine: a one-shot `Environment` built per call,
//! with a custom `Syntax` driven by the caller's `left`/`right` delimiters.
//!
//! `spec.md`'s concrete scenario (§8.2) is phrased in Go `text/template`
//! notation — a single delimiter pair covering both expressions and control
//! flow (`{{range .users}}...{{end}}`, `.field` for the current scope). That
//! single-delimiter shape doesn't map onto `minijinja`'s two-tag grammar
//! (`{{ expr }}` vs `{% block %}`) directly, so a small preprocessing pass
//! rewrites the documented Go-style subset (`.field` paths, `{{range EXPR}}`
//! / `{{end}}`) into the equivalent `{% for %}` / `{{ }}` minijinja source
//! before handing it to the real renderer.

use serde_json::Value;

/// Render `tmpl` against `data`, using `left`/`right` as the delimiter pair.
///
/// # Errors
///
/// Returns an error if `tmpl` fails to parse under the translated syntax, or
/// if rendering fails (e.g. a referenced field is missing and strict
/// undefined behavior is triggered).
pub fn render(tmpl: &str, data: &Value, left: &str, right: &str) -> Result<String, String> {
    let translated = translate_go_style(tmpl, left, right);

    let mut env = minijinja::Environment::new();
    let syntax = minijinja::Syntax {
        block_start: "{%".into(),
        block_end: "%}".into(),
        variable_start: left.into(),
        variable_end: right.into(),
        comment_start: "{#".into(),
        comment_end: "#}".into(),
    };
    env.set_syntax(syntax).map_err(|e| e.to_string())?;
    env.add_template("__rpack_template__", &translated).map_err(|e| e.to_string())?;

    let tmpl = env.get_template("__rpack_template__").map_err(|e| e.to_string())?;
    tmpl.render(data).map_err(|e| e.to_string())
}

/// Translate the `{{range EXPR}} ... {{end}}`, `.field`, and bare `.`
/// subset of Go `text/template` syntax into `minijinja`'s `{% for %}` /
/// `{{ }}` grammar, scoped so that references inside a `range` body bind to
/// the loop variable rather than the outer document.
fn translate_go_style(tmpl: &str, left: &str, right: &str) -> String {
    let range_open = format!("{left}range ");
    let end_tag = format!("{left}end{right}");

    let mut out = String::with_capacity(tmpl.len());
    let mut depth: usize = 0;
    let mut rest = tmpl;

    loop {
        let next_range = rest.find(&range_open);
        let next_end = rest.find(&end_tag);

        match (next_range, next_end) {
            (Some(r), Some(e)) if r < e => {
                out.push_str(&rewrite_dots(&rest[..r], depth));
                let after_open = &rest[r + range_open.len()..];
                let close = after_open.find(right).unwrap_or(after_open.len());
                let expr = after_open[..close].trim();
                depth += 1;
                out.push_str(&format!("{{% for item{depth} in {} %}}", rewrite_expr(expr, depth - 1)));
                rest = &after_open[close + right.len()..];
            }
            (_, Some(e)) => {
                out.push_str(&rewrite_dots(&rest[..e], depth));
                out.push_str("{% endfor %}");
                depth = depth.saturating_sub(1);
                rest = &rest[e + end_tag.len()..];
            }
            _ => {
                out.push_str(&rewrite_dots(rest, depth));
                break;
            }
        }
    }
    out
}

/// Rewrite every `{left}.path{right}` or bare-dot reference found in a
/// non-tag span, binding `.` to the innermost loop variable at `depth` (or
/// the document root at depth 0).
fn rewrite_dots(segment: &str, depth: usize) -> String {
    let re = regex::Regex::new(r"\{\{\s*(\.[A-Za-z0-9_.]*)\s*\}\}").expect("static regex is valid");
    re.replace_all(segment, |caps: &regex::Captures| {
        format!("{{{{ {} }}}}", rewrite_expr(&caps[1], depth))
    })
    .into_owned()
}

/// Rewrite a single Go-style dot path (`.`, `.field`, `.a.b`) into a
/// minijinja expression bound to the loop variable at `depth`.
fn rewrite_expr(expr: &str, depth: usize) -> String {
    let var = if depth == 0 {
        String::new()
    } else {
        format!("item{depth}")
    };
    let trimmed = expr.trim_start_matches('.');
    match (var.as_str(), trimmed) {
        ("", "") => "self".to_string(),
        ("", path) => path.to_string(),
        (v, "") => v.to_string(),
        (v, path) => format!("{v}.{path}"),
    }
}
