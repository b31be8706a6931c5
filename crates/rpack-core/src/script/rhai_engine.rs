//! The embedded script host: wires the §6.2 FS surface into a sandboxed
//! `rhai::Engine` (`spec.md` §4.6 step 5, §9 "capability provider, not an
//! arbitrary runtime").
//!
//! Grounded on `stencila-stencila/rust/kernel-rhai`'s use of `rhai` as the
//! embedded interpreter for evaluating untrusted scripts against a
//! restricted host API: no filesystem or process registration of its own,
//! `eval` disabled, and every IO capability routed through closures that
//! close over this run's [`Fs`].

use crate::error::ScriptError;
use crate::fs::Fs;
use crate::script::{query, template};
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map};
use serde_json::Value;
use std::sync::Arc;

/// Binds one run's [`Fs`], resolved input names, and validated `values` tree
/// to a fresh `rhai::Engine` and evaluates the pack's script against it.
pub struct ScriptHost {
    fs: Arc<Fs>,
    input_names: Vec<String>,
    values: Value,
}

impl ScriptHost {
    pub fn new(fs: Arc<Fs>, input_names: Vec<String>, values: Value) -> Self {
        Self { fs, input_names, values }
    }

    /// Evaluate `source` (the contents of the pack's `script.lua` file, see
    /// `spec.md` §6.1 on the filename-vs-language distinction) to
    /// completion.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Runtime`] if the script fails to parse or
    /// raises during evaluation, including any FS call surfacing a
    /// `CoreError` as a runtime exception.
    pub fn run(&self, script_path: &str, source: &str) -> Result<(), ScriptError> {
        let mut engine = Engine::new();
        engine.disable_symbol("eval");
        engine.on_print(|msg| tracing::info!(target: "rpack::script", "{msg}"));
        engine.on_debug(|msg, src, pos| tracing::debug!(target: "rpack::script", source = ?src, position = ?pos, "{msg}"));

        self.register(&mut engine);

        engine
            .run(source)
            .map_err(|err| ScriptError::Runtime {
                path: script_path.to_string(),
                message: err.to_string(),
            })
    }

    fn register(&self, engine: &mut Engine) {
        let fs = Arc::clone(&self.fs);
        engine.register_fn("copy", move |input: ImmutableString, output: ImmutableString| {
            let bytes = fs.read(&input).map_err(fs_err)?;
            fs.write(&output, &bytes).map_err(fs_err)?;
            Ok::<(), Box<EvalAltResult>>(())
        });

        let fs = Arc::clone(&self.fs);
        engine.register_fn("read", move |path: ImmutableString| {
            let bytes = fs.read(&path).map_err(fs_err)?;
            String::from_utf8(bytes)
                .map(ImmutableString::from)
                .map_err(|e| rhai_err(format!("'{path}' is not valid UTF-8: {e}")))
        });

        let fs = Arc::clone(&self.fs);
        engine.register_fn("write", move |path: ImmutableString, content: ImmutableString| {
            fs.write(&path, content.as_bytes()).map_err(fs_err)
        });

        let fs = Arc::clone(&self.fs);
        engine.register_fn("read_lines", move |path: ImmutableString| {
            let bytes = fs.read(&path).map_err(fs_err)?;
            let content = String::from_utf8(bytes).map_err(|e| rhai_err(e.to_string()))?;
            Ok::<Dynamic, Box<EvalAltResult>>(read_lines_result(&content))
        });

        let fs = Arc::clone(&self.fs);
        engine.register_fn(
            "write_lines",
            move |path: ImmutableString, lines: Array, sep: ImmutableString, final_newline: bool| {
                let lines: Vec<String> = lines.into_iter().map(|d| d.to_string()).collect();
                let content = join_lines(&lines, &sep, final_newline);
                fs.write(&path, content.as_bytes()).map_err(fs_err)
            },
        );
        let fs = Arc::clone(&self.fs);
        engine.register_fn("write_lines", move |path: ImmutableString, lines: Array| {
            let lines: Vec<String> = lines.into_iter().map(|d| d.to_string()).collect();
            let content = join_lines(&lines, "\n", true);
            fs.write(&path, content.as_bytes()).map_err(fs_err)
        });

        let fs = Arc::clone(&self.fs);
        engine.register_fn("read_dir", move |path: ImmutableString| {
            read_dir_result(&fs, &path, false)
        });
        let fs = Arc::clone(&self.fs);
        engine.register_fn("read_dir", move |path: ImmutableString, recursive: bool| {
            read_dir_result(&fs, &path, recursive)
        });

        engine.register_fn("from_yaml", |src: ImmutableString| {
            let value = rpack_schema::value::from_yaml_str(&src).map_err(|e| rhai_err(e))?;
            to_dynamic(value).map_err(|e| rhai_err(e.to_string()))
        });
        engine.register_fn("to_yaml", |data: Dynamic| {
            let value: Value = from_dynamic(&data)?;
            rpack_schema::value::to_yaml_str(&value)
                .map(ImmutableString::from)
                .map_err(|e| rhai_err(e))
        });
        engine.register_fn("from_json", |src: ImmutableString| {
            let value = rpack_schema::value::from_json_str(&src).map_err(|e| rhai_err(e))?;
            to_dynamic(value).map_err(|e| rhai_err(e.to_string()))
        });
        engine.register_fn("to_json", |data: Dynamic| {
            let value: Value = from_dynamic(&data)?;
            rpack_schema::value::to_json_str(&value)
                .map(ImmutableString::from)
                .map_err(|e| rhai_err(e))
        });

        engine.register_fn(
            "template",
            |tmpl: ImmutableString, data: Dynamic, left: ImmutableString, right: ImmutableString| {
                let value: Value = from_dynamic(&data)?;
                template::render(&tmpl, &value, &left, &right)
                    .map(ImmutableString::from)
                    .map_err(|e| rhai_err(e))
            },
        );
        engine.register_fn("template", |tmpl: ImmutableString, data: Dynamic| {
            let value: Value = from_dynamic(&data)?;
            template::render(&tmpl, &value, "{{", "}}")
                .map(ImmutableString::from)
                .map_err(|e| rhai_err(e))
        });

        engine.register_fn("jq", |q: ImmutableString, data: Dynamic| {
            let value: Value = from_dynamic(&data)?;
            let matches = query::run(&q, &value).map_err(|e| rhai_err(e))?;
            let mut arr = Array::new();
            for m in matches {
                arr.push(to_dynamic(m).map_err(|e| rhai_err(e.to_string()))?);
            }
            Ok::<Array, Box<EvalAltResult>>(arr)
        });

        let input_names = self.input_names.clone();
        engine.register_fn("inputs", move || -> Array {
            input_names.iter().cloned().map(Dynamic::from).collect()
        });

        let values = self.values.clone();
        engine.register_fn("values", move || -> Result<Dynamic, Box<EvalAltResult>> {
            to_dynamic(values.clone()).map_err(|e| rhai_err(e.to_string()))
        });
    }
}

fn fs_err(err: crate::error::CoreError) -> Box<EvalAltResult> {
    rhai_err(err.to_string())
}

fn rhai_err(msg: impl std::fmt::Display) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(msg.to_string().into(), rhai::Position::NONE))
}

fn read_dir_result(fs: &Fs, path: &str, recursive: bool) -> Result<Dynamic, Box<EvalAltResult>> {
    let listing = if recursive {
        fs.read_dir_recursive(path).map_err(fs_err)?
    } else {
        fs.read_dir(path).map_err(fs_err)?
    };
    let mut map = Map::new();
    map.insert(
        "files".into(),
        Dynamic::from(listing.files.into_iter().map(Dynamic::from).collect::<Array>()),
    );
    map.insert(
        "dirs".into(),
        Dynamic::from(listing.dirs.into_iter().map(Dynamic::from).collect::<Array>()),
    );
    Ok(Dynamic::from(map))
}

/// Detect `\r\n` vs `\n`, split, and strip the trailing empty element iff
/// `content` ends with the detected separator (`spec.md` §6.2 `read_lines`).
fn split_lines(content: &str) -> (Vec<String>, &'static str, bool) {
    let sep: &'static str = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let final_newline = content.ends_with(sep);
    let mut parts: Vec<String> = content.split(sep).map(ToString::to_string).collect();
    if final_newline && parts.last().is_some_and(String::is_empty) {
        parts.pop();
    }
    (parts, sep, final_newline)
}

fn read_lines_result(content: &str) -> Dynamic {
    let (lines, sep, final_newline) = split_lines(content);
    let mut map = Map::new();
    map.insert("lines".into(), Dynamic::from(lines.into_iter().map(Dynamic::from).collect::<Array>()));
    map.insert("separator".into(), Dynamic::from(sep.to_string()));
    map.insert("final_newline".into(), Dynamic::from(final_newline));
    Dynamic::from(map)
}

fn join_lines(lines: &[String], sep: &str, final_newline: bool) -> String {
    let mut s = lines.join(sep);
    if final_newline && !lines.is_empty() {
        s.push_str(sep);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::hooks::{AccessControlHook, Hook, PurityHook};
    use crate::inputs::ResolvedInput;
    use crate::resolver::ResolverSet;
    use serde_json::json;

    fn build_fs(dir: &std::path::Path) -> Fs {
        std::fs::create_dir_all(dir.join("source/files")).unwrap();
        std::fs::create_dir_all(dir.join("temp")).unwrap();
        std::fs::create_dir_all(dir.join("run")).unwrap();
        let resolvers = ResolverSet::new(
            dir.join("source"),
            dir.join("temp"),
            dir.join("run"),
            Vec::<ResolvedInput>::new(),
        );
        let hooks: Vec<Box<dyn Hook>> = vec![Box::new(AccessControlHook), Box::new(PurityHook::new())];
        Fs::new(resolvers, hooks, CancelToken::new())
    }

    #[test]
    fn runs_copy_only_script() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("source/files/intro.md"), "hello").unwrap();
        let fs = Arc::new(build_fs(dir.path()));

        let host = ScriptHost::new(Arc::clone(&fs), vec![], Value::Null);
        host.run("script.lua", r#"copy("rpack:files/intro.md", "./rpack_intro.md");"#).unwrap();

        let staged = std::fs::read(dir.path().join("run/rpack_intro.md")).unwrap();
        assert_eq!(staged, b"hello");
    }

    #[test]
    fn template_and_yaml_helpers_compose() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("map_root")).unwrap();
        let fs = Arc::new(build_fs(dir.path()));

        let values = json!({"author": "blang"});
        let host = ScriptHost::new(Arc::clone(&fs), vec![], values);
        let script = r#"
            let data = from_yaml("users:\n  - {name: Alice}\n");
            let v = values();
            write("./out.txt", v.author);
        "#;
        host.run("script.lua", script).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("run/out.txt")).unwrap(), "blang");
    }

    #[test]
    fn inputs_lists_declared_names() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Arc::new(build_fs(dir.path()));
        let host = ScriptHost::new(Arc::clone(&fs), vec!["users".to_string()], Value::Null);
        host.run("script.lua", r#"let names = inputs(); write("./names.txt", names[0]);"#).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("run/names.txt")).unwrap(), "users");
    }

    #[test]
    fn jq_query_is_reachable_from_script() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Arc::new(build_fs(dir.path()));
        let host = ScriptHost::new(Arc::clone(&fs), vec![], Value::Null);
        let script = r#"
            let data = from_yaml("users:\n  - {name: Alice}\n  - {name: Bob}\n");
            let names = jq(".users[] | .name", data);
            write("./first.txt", names[0]);
        "#;
        host.run("script.lua", script).unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("run/first.txt")).unwrap(), "Alice");
    }

    #[test]
    fn script_error_surfaces_as_runtime_script_error() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Arc::new(build_fs(dir.path()));
        let host = ScriptHost::new(fs, vec![], Value::Null);
        let err = host.run("script.lua", "throw \"boom\";").unwrap_err();
        assert!(matches!(err, ScriptError::Runtime { .. }));
    }

    #[test]
    fn split_lines_detects_crlf() {
        let (lines, sep, final_newline) = split_lines("a\r\nb\r\n");
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(sep, "\r\n");
        assert!(final_newline);
    }

    #[test]
    fn join_lines_round_trips_with_split_lines() {
        let lines = vec!["a".to_string(), "b".to_string()];
        let content = join_lines(&lines, "\n", true);
        assert_eq!(content, "a\nb\n");
        let (round, sep, final_newline) = split_lines(&content);
        assert_eq!(round, lines);
        assert_eq!(sep, "\n");
        assert!(final_newline);
    }
}
