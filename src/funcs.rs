//! Functions available to every template.

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::schema;
use crate::template::{expect_args, int_arg, str_arg, FuncError, FuncMap};

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"--.*").expect("valid comment pattern"));

/// Build the function map for one invocation.
///
/// `schema_paths` are the request's `settings.schema` entries; `schema` reads
/// them again on every call.
pub fn function_env(schema_paths: Vec<String>) -> FuncMap {
    let mut funcs = FuncMap::new();

    funcs.insert("add", |args: &[Value]| {
        expect_args(args, 2)?;
        let (a, b) = (int_arg(&args[0])?, int_arg(&args[1])?);
        a.checked_add(b)
            .map(Value::from)
            .ok_or_else(|| FuncError::Invalid(format!("integer overflow adding {a} and {b}")))
    });
    funcs.insert("upper", |args: &[Value]| string_fn(args, upper));
    funcs.insert("lower", |args: &[Value]| string_fn(args, str::to_lowercase));
    funcs.insert("oneLineSQL", |args: &[Value]| string_fn(args, one_line_sql));
    funcs.insert("snakeCase", |args: &[Value]| string_fn(args, |s| s.to_snake_case()));
    funcs.insert("camelCase", |args: &[Value]| string_fn(args, |s| s.to_lower_camel_case()));
    funcs.insert("pascalCase", |args: &[Value]| string_fn(args, |s| s.to_upper_camel_case()));
    funcs.insert("regexMatch", |args: &[Value]| {
        expect_args(args, 2)?;
        regex_match(str_arg(&args[0])?, str_arg(&args[1])?).map(Value::Bool)
    });
    funcs.insert("schema", move |args: &[Value]| {
        expect_args(args, 0)?;
        schema::aggregate(&schema_paths)
            .map(Value::String)
            .map_err(FuncError::other)
    });

    funcs
}

fn string_fn(args: &[Value], f: impl Fn(&str) -> String) -> Result<Value, FuncError> {
    expect_args(args, 1)?;
    Ok(Value::String(f(str_arg(&args[0])?)))
}

/// Upper-case each character on its own. Characters whose upper case is more
/// than one character (`ß`) are kept as they are.
pub fn upper(s: &str) -> String {
    s.chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        })
        .collect()
}

/// Collapse a SQL statement onto one line: `--` comments are dropped up to
/// the end of the line and whitespace runs become a single space.
///
/// Comment markers inside string literals are stripped too.
pub fn one_line_sql(sql: &str) -> String {
    let without_comments = LINE_COMMENT.replace_all(sql, "");
    without_comments.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn regex_match(pattern: &str, text: &str) -> Result<bool, FuncError> {
    let re = Regex::new(pattern).map_err(FuncError::other)?;
    Ok(re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn render(source: &str, data: Value, schema_paths: Vec<String>) -> String {
        let funcs = function_env(schema_paths);
        Template::parse("funcs", source, &funcs)
            .unwrap()
            .execute(&data)
            .unwrap()
    }

    #[test]
    fn test_one_line_sql() {
        assert_eq!(one_line_sql("SELECT 1 -- comment\n  FROM t"), "SELECT 1 FROM t");
        assert_eq!(
            one_line_sql("SELECT *\n\tFROM authors\n\nWHERE id = $1;\n"),
            "SELECT * FROM authors WHERE id = $1;"
        );
        assert_eq!(one_line_sql("SELECT '--x' AS a"), "SELECT '");
    }

    #[test]
    fn test_one_line_sql_idempotent() {
        let once = one_line_sql("-- name: GetAuthor :one\nSELECT *  FROM authors\nWHERE id = $1 LIMIT 1;");
        assert_eq!(once, "SELECT * FROM authors WHERE id = $1 LIMIT 1;");
        assert_eq!(one_line_sql(&once), once);
    }

    #[test]
    fn test_upper() {
        assert_eq!(upper("get_author"), "GET_AUTHOR");
        assert_eq!(upper("straße"), "STRAßE");
        assert_eq!(upper("ñandú"), "ÑANDÚ");
    }

    #[test]
    fn test_regex_match() {
        assert!(regex_match(":one$", "GetAuthor :one").unwrap());
        assert!(regex_match("Author", "GetAuthor").unwrap());
        assert!(!regex_match("^List", "GetAuthor").unwrap());
        assert!(regex_match("(", "x").is_err());
    }

    #[test]
    fn test_registered_functions() {
        let data = json!({"name": "get_author", "n": 2, "sql": "SELECT 1 -- c\nFROM t"});
        assert_eq!(render("{{add .n 3}}", data.clone(), vec![]), "5");
        assert_eq!(render("{{upper .name}}", data.clone(), vec![]), "GET_AUTHOR");
        assert_eq!(render("{{.name | pascalCase}}", data.clone(), vec![]), "GetAuthor");
        assert_eq!(render("{{camelCase .name}}", data.clone(), vec![]), "getAuthor");
        assert_eq!(render("{{snakeCase \"GetAuthor\"}}", data.clone(), vec![]), "get_author");
        assert_eq!(render("{{oneLineSQL .sql}}", data.clone(), vec![]), "SELECT 1 FROM t");
        assert_eq!(render(r#"{{if regexMatch "^get" .name}}y{{end}}"#, data, vec![]), "y");
    }

    #[test]
    fn test_add_rejects_overflow_and_strings() {
        let funcs = function_env(vec![]);
        let add = funcs.get("add").unwrap();
        assert!(add(&[json!(i64::MAX), json!(1)]).is_err());
        assert!(matches!(
            add(&[json!("1"), json!(2)]),
            Err(FuncError::ArgType { .. })
        ));
    }

    #[test]
    fn test_schema_reads_at_call_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.sql");
        fs::write(&path, "CREATE TABLE a ();").unwrap();
        let paths = vec![path.to_string_lossy().into_owned()];

        let funcs = function_env(paths);
        let schema = funcs.get("schema").unwrap();
        assert_eq!(schema(&[]).unwrap(), json!("CREATE TABLE a ();\n"));

        fs::write(&path, "CREATE TABLE b ();").unwrap();
        assert_eq!(schema(&[]).unwrap(), json!("CREATE TABLE b ();\n"));
    }

    #[test]
    fn test_schema_missing_path_is_error() {
        let funcs = function_env(vec!["/definitely/not/here.sql".to_string()]);
        let err = funcs.get("schema").unwrap()(&[]).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.sql"));
    }
}
