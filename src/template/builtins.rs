use std::cmp::Ordering;
use std::fmt::Write as _;

use serde_json::Value;

use super::error::FuncError;
use super::func::{expect_args, int_arg, str_arg};
use super::printf::sprintf;
use super::value::{is_true, type_name, write_value};

pub(crate) type Builtin = fn(&[Value]) -> Result<Value, FuncError>;

/// `and` and `or` evaluate their operands lazily, so the executor handles them
/// itself. Returns `Some(true)` for `and`.
pub(crate) fn logical(name: &str) -> Option<bool> {
    match name {
        "and" => Some(true),
        "or" => Some(false),
        _ => None,
    }
}

pub(crate) fn lookup(name: &str) -> Option<Builtin> {
    let builtin: Builtin = match name {
        "not" => not,
        "len" => len,
        "index" => index,
        "slice" => slice,
        "eq" => eq,
        "ne" => ne,
        "lt" => lt,
        "le" => le,
        "gt" => gt,
        "ge" => ge,
        "print" => print,
        "println" => println,
        "printf" => printf,
        "html" => html,
        "js" => js,
        "urlquery" => urlquery,
        "call" => call,
        _ => return None,
    };
    Some(builtin)
}

pub(crate) fn is_builtin(name: &str) -> bool {
    logical(name).is_some() || lookup(name).is_some()
}

fn not(args: &[Value]) -> Result<Value, FuncError> {
    expect_args(args, 1)?;
    Ok(Value::Bool(!is_true(&args[0])))
}

fn len(args: &[Value]) -> Result<Value, FuncError> {
    expect_args(args, 1)?;
    let n = match &args[0] {
        Value::String(s) => s.len(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(FuncError::Invalid(format!(
                "len of type {}",
                type_name(other)
            )))
        }
    };
    Ok(Value::from(n))
}

fn index(args: &[Value]) -> Result<Value, FuncError> {
    let (item, indices) = args.split_first().ok_or(FuncError::TooFewArgs { min: 1, got: 0 })?;
    let mut current = item;
    for idx in indices {
        current = match current {
            Value::Array(items) => {
                let i = int_arg(idx)?;
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .ok_or_else(|| FuncError::Invalid(format!("index out of range: {i}")))?
            }
            Value::Object(map) => match map.get(str_arg(idx)?) {
                Some(value) => value,
                None => return Ok(Value::Null),
            },
            Value::Null => return Err(FuncError::Invalid("index of untyped nil".to_string())),
            other => {
                return Err(FuncError::Invalid(format!(
                    "can't index item of type {}",
                    type_name(other)
                )))
            }
        };
    }
    Ok(current.clone())
}

fn slice(args: &[Value]) -> Result<Value, FuncError> {
    let (item, bounds) = args.split_first().ok_or(FuncError::TooFewArgs { min: 1, got: 0 })?;
    if bounds.len() > 2 {
        return Err(FuncError::Invalid(format!(
            "too many slice indexes: {}",
            bounds.len()
        )));
    }
    let len = match item {
        Value::String(s) => s.len(),
        Value::Array(items) => items.len(),
        other => {
            return Err(FuncError::Invalid(format!(
                "can't slice item of type {}",
                type_name(other)
            )))
        }
    };
    let bound = |i: usize, default: usize| -> Result<usize, FuncError> {
        match bounds.get(i) {
            None => Ok(default),
            Some(value) => {
                let n = int_arg(value)?;
                usize::try_from(n)
                    .ok()
                    .filter(|n| *n <= len)
                    .ok_or_else(|| FuncError::Invalid(format!("index out of range: {n}")))
            }
        }
    };
    let start = bound(0, 0)?;
    let end = bound(1, len)?;
    if start > end {
        return Err(FuncError::Invalid(format!(
            "invalid slice index: {start} > {end}"
        )));
    }
    match item {
        Value::String(s) => s
            .get(start..end)
            .map(|sub| Value::String(sub.to_string()))
            .ok_or_else(|| FuncError::Invalid("slice splits a character".to_string())),
        Value::Array(items) => Ok(Value::Array(items[start..end].to_vec())),
        _ => Ok(Value::Null),
    }
}

fn eq(args: &[Value]) -> Result<Value, FuncError> {
    let (first, rest) = match args.split_first() {
        Some((first, rest)) if !rest.is_empty() => (first, rest),
        _ => {
            return Err(FuncError::TooFewArgs {
                min: 2,
                got: args.len(),
            })
        }
    };
    for other in rest {
        if equal(first, other)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn ne(args: &[Value]) -> Result<Value, FuncError> {
    expect_args(args, 2)?;
    Ok(Value::Bool(!equal(&args[0], &args[1])?))
}

fn equal(a: &Value, b: &Value) -> Result<bool, FuncError> {
    match (a, b) {
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            Err(FuncError::Invalid("non-comparable type".to_string()))
        }
        (Value::Null, other) | (other, Value::Null) => Ok(other.is_null()),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::String(x), Value::String(y)) => Ok(x == y),
        (Value::Number(_), Value::Number(_)) => Ok(order(a, b)? == Ordering::Equal),
        _ => Err(FuncError::Invalid(
            "incompatible types for comparison".to_string(),
        )),
    }
}

fn lt(args: &[Value]) -> Result<Value, FuncError> {
    compare(args, Ordering::is_lt)
}

fn le(args: &[Value]) -> Result<Value, FuncError> {
    compare(args, Ordering::is_le)
}

fn gt(args: &[Value]) -> Result<Value, FuncError> {
    compare(args, Ordering::is_gt)
}

fn ge(args: &[Value]) -> Result<Value, FuncError> {
    compare(args, Ordering::is_ge)
}

fn compare(args: &[Value], accept: fn(Ordering) -> bool) -> Result<Value, FuncError> {
    expect_args(args, 2)?;
    Ok(Value::Bool(accept(order(&args[0], &args[1])?)))
}

/// Ordering of two numbers or two strings. Integers and floats compare by
/// numeric value.
fn order(a: &Value, b: &Value) -> Result<Ordering, FuncError> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Ok(x.cmp(&y)),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y)
                    .ok_or_else(|| FuncError::Invalid("incomparable numbers".to_string()))
            }
        },
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => Err(FuncError::Invalid(
            "incompatible types for comparison".to_string(),
        )),
        (other, _) => Err(FuncError::Invalid(format!(
            "invalid type for comparison: {}",
            type_name(other)
        ))),
    }
}

fn print(args: &[Value]) -> Result<Value, FuncError> {
    Ok(Value::String(sprint(args)))
}

/// Go's `fmt.Sprint`: a space goes between operands when neither is a string.
fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !arg.is_string() && !args[i - 1].is_string() {
            out.push(' ');
        }
        write_value(&mut out, arg);
    }
    out
}

fn println(args: &[Value]) -> Result<Value, FuncError> {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_value(&mut out, arg);
    }
    out.push('\n');
    Ok(Value::String(out))
}

fn printf(args: &[Value]) -> Result<Value, FuncError> {
    let (format, rest) = args.split_first().ok_or(FuncError::TooFewArgs { min: 1, got: 0 })?;
    Ok(Value::String(sprintf(str_arg(format)?, rest)))
}

fn html(args: &[Value]) -> Result<Value, FuncError> {
    let text = sprint(args);
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    Ok(Value::String(out))
}

/// Escape for embedding in a JavaScript string literal.
fn js(args: &[Value]) -> Result<Value, FuncError> {
    let text = sprint(args);
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' | '>' | '&' | '=' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c if (c as u32) < 0x20 || (!c.is_ascii() && c.is_control()) => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    Ok(Value::String(out))
}

/// Query-string escaping: unreserved bytes stay, space becomes `+`.
fn urlquery(args: &[Value]) -> Result<Value, FuncError> {
    let text = sprint(args);
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            b' ' => out.push('+'),
            b => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    Ok(Value::String(out))
}

/// Template values are plain data, so there is never a function to call.
fn call(args: &[Value]) -> Result<Value, FuncError> {
    let target = args.first().ok_or(FuncError::TooFewArgs { min: 1, got: 0 })?;
    Err(FuncError::Invalid(format!(
        "can't call non-function value of type {}",
        type_name(target)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(name: &str, args: &[Value]) -> Result<Value, FuncError> {
        lookup(name).expect("builtin")(args)
    }

    #[test]
    fn test_len_and_not() {
        assert_eq!(run("len", &[json!("héllo")]).unwrap(), json!(6));
        assert_eq!(run("len", &[json!([1, 2, 3])]).unwrap(), json!(3));
        assert_eq!(run("not", &[json!("")]).unwrap(), json!(true));
        assert!(run("len", &[json!(3)]).is_err());
    }

    #[test]
    fn test_index() {
        let data = json!({"tables": [{"name": "authors"}]});
        assert_eq!(
            run("index", &[data.clone(), json!("tables"), json!(0), json!("name")]).unwrap(),
            json!("authors")
        );
        assert_eq!(run("index", &[data.clone(), json!("missing")]).unwrap(), json!(null));
        assert!(run("index", &[json!([1]), json!(4)]).is_err());
    }

    #[test]
    fn test_slice() {
        assert_eq!(run("slice", &[json!("abcdef"), json!(1), json!(3)]).unwrap(), json!("bc"));
        assert_eq!(run("slice", &[json!([1, 2, 3]), json!(1)]).unwrap(), json!([2, 3]));
        assert!(run("slice", &[json!("abc"), json!(2), json!(1)]).is_err());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run("eq", &[json!(1), json!(2), json!(1)]).unwrap(), json!(true));
        assert_eq!(run("eq", &[json!(1), json!(1.0)]).unwrap(), json!(true));
        assert_eq!(run("ne", &[json!("a"), json!("b")]).unwrap(), json!(true));
        assert_eq!(run("lt", &[json!(1), json!(2)]).unwrap(), json!(true));
        assert_eq!(run("ge", &[json!("b"), json!("a")]).unwrap(), json!(true));
        assert_eq!(run("eq", &[json!(null), json!(null)]).unwrap(), json!(true));
        assert!(run("eq", &[json!("1"), json!(1)]).is_err());
        assert!(run("lt", &[json!(true), json!(false)]).is_err());
        assert!(run("eq", &[json!(1)]).is_err());
    }

    #[test]
    fn test_print_family() {
        assert_eq!(run("print", &[json!(1), json!(2)]).unwrap(), json!("1 2"));
        assert_eq!(run("print", &[json!("a"), json!(1), json!("b")]).unwrap(), json!("a1b"));
        assert_eq!(run("println", &[json!("a"), json!(1)]).unwrap(), json!("a 1\n"));
        assert_eq!(run("printf", &[json!("%s=%d"), json!("n"), json!(2)]).unwrap(), json!("n=2"));
    }

    #[test]
    fn test_html_escaping() {
        assert_eq!(run("html", &[json!("<a href=\"x\">'&'</a>")]).unwrap(),
            json!("&lt;a href=&#34;x&#34;&gt;&#39;&amp;&#39;&lt;/a&gt;"));
        assert_eq!(run("html", &[json!("a\u{0}b")]).unwrap(), json!("a\u{FFFD}b"));
        assert_eq!(run("html", &[json!(1), json!(2)]).unwrap(), json!("1 2"));
    }

    #[test]
    fn test_js_escaping() {
        assert_eq!(run("js", &[json!("a'b")]).unwrap(), json!("a\\'b"));
        assert_eq!(run("js", &[json!(r#"say "hi"\"#)]).unwrap(), json!(r#"say \"hi\"\\"#));
        assert_eq!(run("js", &[json!("<x>&y=1")]).unwrap(), json!(r"\u003Cx\u003E\u0026y\u003D1"));
        assert_eq!(run("js", &[json!("a\nb")]).unwrap(), json!(r"a\u000Ab"));
        assert_eq!(run("js", &[json!("café")]).unwrap(), json!("café"));
    }

    #[test]
    fn test_urlquery_escaping() {
        assert_eq!(run("urlquery", &[json!("a b")]).unwrap(), json!("a+b"));
        assert_eq!(run("urlquery", &[json!("x=1&y=é~")]).unwrap(), json!("x%3D1%26y%3D%C3%A9~"));
    }

    #[test]
    fn test_call_is_an_error() {
        let err = run("call", &[json!("upper"), json!("x")]).unwrap_err();
        assert_eq!(err.to_string(), "can't call non-function value of type string");
        assert!(matches!(run("call", &[]), Err(FuncError::TooFewArgs { .. })));
    }

    #[test]
    fn test_logical_names() {
        assert_eq!(logical("and"), Some(true));
        assert_eq!(logical("or"), Some(false));
        assert!(is_builtin("and"));
        assert!(is_builtin("printf"));
        assert!(is_builtin("html") && is_builtin("js") && is_builtin("urlquery") && is_builtin("call"));
        assert!(!is_builtin("upper"));
    }
}
