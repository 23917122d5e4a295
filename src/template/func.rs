use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use super::error::FuncError;
use super::value::type_name;

/// Signature of a function callable from a template.
pub type TemplateFn = dyn Fn(&[Value]) -> Result<Value, FuncError>;

/// Named functions available to a template, on top of the builtins.
///
/// A function registered under a builtin's name shadows the builtin.
#[derive(Default)]
pub struct FuncMap {
    funcs: HashMap<String, Box<TemplateFn>>,
}

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, FuncError> + 'static,
    {
        self.funcs.insert(name.into(), Box::new(func));
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFn> {
        self.funcs.get(name).map(|func| func.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.funcs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncMap")
            .field("funcs", &self.names())
            .finish()
    }
}

pub fn expect_args(args: &[Value], want: usize) -> Result<(), FuncError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(FuncError::Arity {
            want,
            got: args.len(),
        })
    }
}

pub fn str_arg(value: &Value) -> Result<&str, FuncError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(FuncError::ArgType {
            expected: "string",
            got: type_name(other),
        }),
    }
}

pub fn int_arg(value: &Value) -> Result<i64, FuncError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or(FuncError::ArgType {
            expected: "int",
            got: type_name(value),
        }),
        other => Err(FuncError::ArgType {
            expected: "int",
            got: type_name(other),
        }),
    }
}
