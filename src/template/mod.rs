//! A text template engine compatible with the commonly used subset of Go's
//! `text/template`, evaluated over [`serde_json::Value`] data.
//!
//! ```ignore
//! let funcs = FuncMap::new();
//! let tmpl = Template::parse("query.tmpl", "package {{.Settings.Package}}", &funcs)?;
//! let text = tmpl.execute(&serde_json::json!({"settings": {"package": "db"}}))?;
//! assert_eq!(text, "package db");
//! ```
//!
//! Field names are looked up as written and then in snake_case, so templates
//! may use the `.CamelCase` names of the protobuf messages.

mod builtins;
mod error;
mod exec;
mod func;
mod lex;
mod parse;
mod printf;
mod value;

use serde_json::Value;

pub use error::{ExecError, FuncError, TemplateError};
pub use func::{expect_args, int_arg, str_arg, FuncMap, TemplateFn};
pub use printf::sprintf;
pub use value::{is_true, to_text};

use self::exec::Exec;
use self::parse::Tree;

/// A parsed template bound to the functions it may call.
#[derive(Debug)]
pub struct Template<'f> {
    name: String,
    tree: Tree,
    funcs: &'f FuncMap,
}

impl<'f> Template<'f> {
    /// Parse `source`. Every function the template names must be a builtin
    /// or registered in `funcs`.
    pub fn parse(name: impl Into<String>, source: &str, funcs: &'f FuncMap) -> Result<Self, TemplateError> {
        let name = name.into();
        let is_function = |ident: &str| funcs.contains(ident) || builtins::is_builtin(ident);
        match parse::parse(source, &is_function) {
            Ok(tree) => Ok(Self { name, tree, funcs }),
            Err(err) => Err(TemplateError::Parse {
                name,
                line: err.line,
                message: err.message,
            }),
        }
    }

    /// Render the template with `data` as the initial dot and `$`.
    pub fn execute(&self, data: &Value) -> Result<String, TemplateError> {
        Exec::new(&self.tree, self.funcs)
            .run(data)
            .map_err(|failure| TemplateError::Exec {
                name: self.name.clone(),
                line: failure.line,
                source: failure.error,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, data: Value) -> Result<String, TemplateError> {
        let mut funcs = FuncMap::new();
        funcs.insert("upper", |args: &[Value]| {
            expect_args(args, 1)?;
            Ok(Value::String(str_arg(&args[0])?.to_uppercase()))
        });
        funcs.insert("fail", |_: &[Value]| Err(FuncError::Invalid("boom".to_string())));
        Template::parse("test", source, &funcs)?.execute(&data)
    }

    fn ok(source: &str, data: Value) -> String {
        render(source, data).unwrap()
    }

    #[test]
    fn test_fields_and_snake_case_lookup() {
        let data = json!({"settings": {"codegen": {"out": "db"}}});
        assert_eq!(ok("out={{.Settings.Codegen.Out}}", data), "out=db");
    }

    #[test]
    fn test_missing_field_is_exec_error() {
        let err = render("{{.Settings.Package}}", json!({"settings": {}})).unwrap_err();
        assert!(matches!(
            err.exec_error(),
            Some(ExecError::FieldNotFound { field }) if field == "Package"
        ));
        assert_eq!(
            err.to_string(),
            "template: test:1: executing: field Package not found"
        );
    }

    #[test]
    fn test_unknown_function_is_parse_error() {
        let err = render("a\n{{nope .}}", json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_pipeline_appends_previous_result() {
        assert_eq!(ok(r#"{{"x" | printf "%s-%s" "a"}}"#, json!({})), "a-x");
        assert_eq!(ok("{{.name | upper}}", json!({"name": "abc"})), "ABC");
    }

    #[test]
    fn test_if_else_chain() {
        let source = "{{if eq .n 1}}one{{else if eq .n 2}}two{{else}}many{{end}}";
        assert_eq!(ok(source, json!({"n": 1})), "one");
        assert_eq!(ok(source, json!({"n": 2})), "two");
        assert_eq!(ok(source, json!({"n": 5})), "many");
    }

    #[test]
    fn test_range_with_variables_and_else() {
        let source = "{{range $i, $q := .queries}}{{if $i}},{{end}}{{$q.name}}{{else}}none{{end}}";
        assert_eq!(
            ok(source, json!({"queries": [{"name": "A"}, {"name": "B"}]})),
            "A,B"
        );
        assert_eq!(ok(source, json!({"queries": []})), "none");
        assert_eq!(ok(source, json!({"queries": null})), "none");
    }

    #[test]
    fn test_range_map_in_key_order_and_integer() {
        assert_eq!(
            ok("{{range $k, $v := .}}{{$k}}={{$v}};{{end}}", json!({"b": 2, "a": 1})),
            "a=1;b=2;"
        );
        assert_eq!(ok("{{range 3}}{{.}}{{end}}", json!({})), "012");
    }

    #[test]
    fn test_range_over_large_integer_stops_at_break() {
        let source = "{{range $i := 9223372036854775807}}{{if eq $i 3}}{{break}}{{end}}{{$i}}{{end}}";
        assert_eq!(ok(source, json!({})), "012");
        assert_eq!(ok("{{range -2}}x{{else}}empty{{end}}", json!({})), "empty");
        assert!(matches!(
            render("{{range 1.5}}{{end}}", json!({})).unwrap_err().exec_error(),
            Some(ExecError::RangeOver(kind)) if kind == "float64"
        ));
    }

    #[test]
    fn test_escaping_builtins() {
        assert_eq!(ok(r#"{{html "<a>"}}"#, json!({})), "&lt;a&gt;");
        assert_eq!(ok(r#"{{"it's" | js}}"#, json!({})), r"it\'s");
        assert_eq!(ok("{{urlquery .q}}", json!({"q": "a b&c"})), "a+b%26c");
        let err = render("{{call .f 1}}", json!({"f": "upper"})).unwrap_err();
        assert!(err.to_string().contains("non-function"), "{err}");
    }

    #[test]
    fn test_break_and_continue() {
        let source = "{{range .}}{{if eq . 2}}{{continue}}{{end}}{{if eq . 4}}{{break}}{{end}}{{.}}{{end}}";
        assert_eq!(ok(source, json!([1, 2, 3, 4, 5])), "13");
    }

    #[test]
    fn test_with_rebinds_dot() {
        let source = "{{with .codegen}}{{.out}}{{else}}no codegen{{end}}";
        assert_eq!(ok(source, json!({"codegen": {"out": "x"}})), "x");
        assert_eq!(ok(source, json!({"codegen": null})), "no codegen");
    }

    #[test]
    fn test_variables_and_root() {
        let source = "{{$pkg := .package}}{{range .items}}{{$pkg}}.{{.}} {{$.package}}|{{end}}";
        assert_eq!(
            ok(source, json!({"package": "db", "items": ["a", "b"]})),
            "db.a db|db.b db|"
        );
        assert_eq!(ok("{{$x := 1}}{{$x = 2}}{{$x}}", json!({})), "2");
    }

    #[test]
    fn test_define_template_and_block() {
        let source = r#"{{define "row"}}<{{.}}>{{end}}{{range .}}{{template "row" .}}{{end}}{{block "tail" .}}!{{end}}"#;
        assert_eq!(ok(source, json!(["a", "b"])), "<a><b>!");
    }

    #[test]
    fn test_recursive_template_depth_is_bounded() {
        let err = render(r#"{{define "loop"}}{{template "loop" .}}{{end}}{{template "loop" .}}"#, json!({}))
            .unwrap_err();
        assert!(matches!(err.exec_error(), Some(ExecError::DepthExceeded(_))));
    }

    #[test]
    fn test_and_or_short_circuit() {
        assert_eq!(ok("{{or .a .b}}", json!({"a": "", "b": "fallback"})), "fallback");
        assert_eq!(ok("{{and .a .b}}", json!({"a": 0, "b": "x"})), "0");
        // The missing field is never evaluated.
        assert_eq!(ok("{{or .a .missing}}", json!({"a": "set"})), "set");
    }

    #[test]
    fn test_trim_markers_and_comments() {
        assert_eq!(ok("a  {{- /* note */ -}}  b", json!({})), "ab");
        assert_eq!(ok("{{- .x }}\n", json!({"x": 1})), "1\n");
    }

    #[test]
    fn test_function_error_aborts() {
        let err = render("line1\n{{fail}}", json!({})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "template: test:2: executing: error calling fail: boom"
        );
    }

    #[test]
    fn test_value_printing() {
        assert_eq!(ok("{{.}}", json!(null)), "<nil>");
        assert_eq!(ok("{{.}}", json!(["a", "b"])), "[a b]");
        assert_eq!(ok("{{.}}", json!({"k": 1})), "map[k:1]");
        assert_eq!(ok("{{len .}}", json!("abc")), "3");
    }
}
