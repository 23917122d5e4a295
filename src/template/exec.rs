//! Tree-walking evaluator.

use heck::ToSnakeCase;
use serde_json::Value;

use super::builtins;
use super::error::{ExecError, ExecFailure, FuncError};
use super::func::FuncMap;
use super::parse::{Arg, Branch, Command, Node, Pipeline, Tree};
use super::value::{is_true, type_name, write_value};

/// Nesting limit for `{{template}}` calls.
pub(crate) const MAX_TEMPLATE_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
}

pub(crate) struct Exec<'t> {
    tree: &'t Tree,
    funcs: &'t FuncMap,
    out: String,
    vars: Vec<(String, Value)>,
    depth: usize,
}

impl<'t> Exec<'t> {
    pub fn new(tree: &'t Tree, funcs: &'t FuncMap) -> Self {
        Self {
            tree,
            funcs,
            out: String::new(),
            vars: Vec::new(),
            depth: 0,
        }
    }

    pub fn run(mut self, data: &Value) -> Result<String, ExecFailure> {
        let tree = self.tree;
        self.vars.push(("$".to_string(), data.clone()));
        self.walk_list(&tree.root, data)?;
        Ok(self.out)
    }

    fn walk_list(&mut self, list: &'t [Node], dot: &Value) -> Result<Flow, ExecFailure> {
        for node in list {
            let flow = self.walk(node, dot)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn walk(&mut self, node: &'t Node, dot: &Value) -> Result<Flow, ExecFailure> {
        match node {
            Node::Text(text) => self.out.push_str(text),
            Node::Action(pipe) => {
                let value = self.eval_pipeline(dot, pipe).map_err(at(pipe.line))?;
                if pipe.decl.is_empty() {
                    write_value(&mut self.out, &value);
                }
            }
            Node::If(branch) => return self.walk_if_or_with(branch, dot, false),
            Node::With(branch) => return self.walk_if_or_with(branch, dot, true),
            Node::Range(branch) => return self.walk_range(branch, dot),
            Node::Template { line, name, pipe } => self.walk_template(*line, name, pipe.as_ref(), dot)?,
            Node::Break => return Ok(Flow::Break),
            Node::Continue => return Ok(Flow::Continue),
        }
        Ok(Flow::Normal)
    }

    fn walk_if_or_with(&mut self, branch: &'t Branch, dot: &Value, with: bool) -> Result<Flow, ExecFailure> {
        let mark = self.vars.len();
        let value = self
            .eval_pipeline(dot, &branch.pipe)
            .map_err(at(branch.pipe.line))?;
        let flow = if is_true(&value) {
            let dot = if with { &value } else { dot };
            self.walk_list(&branch.list, dot)?
        } else if let Some(else_list) = &branch.else_list {
            self.walk_list(else_list, dot)?
        } else {
            Flow::Normal
        };
        self.vars.truncate(mark);
        Ok(flow)
    }

    fn walk_range(&mut self, branch: &'t Branch, dot: &Value) -> Result<Flow, ExecFailure> {
        let pipe = &branch.pipe;
        let value = self.eval_commands(dot, &pipe.cmds).map_err(at(pipe.line))?;
        let count = match &value {
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        let items: Box<dyn Iterator<Item = (Value, Value)>> = match (value, count) {
            (_, Some(count)) => Box::new((0..count.max(0)).map(|i| (Value::from(i), Value::from(i)))),
            (Value::Null, _) => Box::new(std::iter::empty()),
            (Value::Array(items), _) => Box::new(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (Value::from(i), item)),
            ),
            (Value::Object(map), _) => Box::new(map.into_iter().map(|(key, item)| (Value::String(key), item))),
            (other, None) => {
                return Err(ExecFailure {
                    line: pipe.line,
                    error: ExecError::RangeOver(type_name(&other).to_string()),
                })
            }
        };

        let mark = self.vars.len();
        let mut ran = false;
        for (key, item) in items {
            ran = true;
            match pipe.decl.as_slice() {
                [] => {}
                [elem] => self.bind(elem, item.clone(), pipe.is_assign).map_err(at(pipe.line))?,
                [index, elem, ..] => {
                    self.bind(index, key, pipe.is_assign).map_err(at(pipe.line))?;
                    self.bind(elem, item.clone(), pipe.is_assign).map_err(at(pipe.line))?;
                }
            }
            let flow = self.walk_list(&branch.list, &item)?;
            self.vars.truncate(mark);
            if flow == Flow::Break {
                break;
            }
        }
        if ran {
            return Ok(Flow::Normal);
        }
        match &branch.else_list {
            Some(else_list) => self.walk_list(else_list, dot),
            None => Ok(Flow::Normal),
        }
    }

    fn walk_template(
        &mut self,
        line: usize,
        name: &str,
        pipe: Option<&'t Pipeline>,
        dot: &Value,
    ) -> Result<(), ExecFailure> {
        let tree = self.tree;
        let body = tree.defines.get(name).ok_or_else(|| ExecFailure {
            line,
            error: ExecError::UnknownTemplate(name.to_string()),
        })?;
        let new_dot = match pipe {
            Some(pipe) => self.eval_commands(dot, &pipe.cmds).map_err(at(line))?,
            None => Value::Null,
        };
        if self.depth >= MAX_TEMPLATE_DEPTH {
            return Err(ExecFailure {
                line,
                error: ExecError::DepthExceeded(MAX_TEMPLATE_DEPTH),
            });
        }

        self.depth += 1;
        let saved = std::mem::replace(&mut self.vars, vec![("$".to_string(), new_dot.clone())]);
        let result = self.walk_list(body, &new_dot);
        self.vars = saved;
        self.depth -= 1;
        result.map(|_| ())
    }

    /// Evaluate a pipeline and apply its `$x :=` / `$x =` declarations.
    fn eval_pipeline(&mut self, dot: &Value, pipe: &Pipeline) -> Result<Value, ExecError> {
        let value = self.eval_commands(dot, &pipe.cmds)?;
        for name in &pipe.decl {
            self.bind(name, value.clone(), pipe.is_assign)?;
        }
        Ok(value)
    }

    fn eval_commands(&mut self, dot: &Value, cmds: &[Command]) -> Result<Value, ExecError> {
        let mut last = None;
        for cmd in cmds {
            last = Some(self.eval_command(dot, cmd, last)?);
        }
        Ok(last.unwrap_or(Value::Null))
    }

    fn eval_command(&mut self, dot: &Value, cmd: &Command, piped: Option<Value>) -> Result<Value, ExecError> {
        let Some((first, rest)) = cmd.args.split_first() else {
            return Ok(piped.unwrap_or(Value::Null));
        };
        match first {
            Arg::Function(name) => self.eval_function(dot, name, rest, piped),
            Arg::Nil => Err(ExecError::NilCommand),
            other => {
                if !rest.is_empty() || piped.is_some() {
                    return Err(ExecError::NotAFunction(other.describe()));
                }
                self.eval_arg(dot, other)
            }
        }
    }

    fn eval_arg(&mut self, dot: &Value, arg: &Arg) -> Result<Value, ExecError> {
        match arg {
            Arg::Dot => Ok(dot.clone()),
            Arg::Nil => Ok(Value::Null),
            Arg::Literal(value) => Ok(value.clone()),
            Arg::Field(chain) => lookup_chain(dot, chain).cloned(),
            Arg::Variable(name, chain) => {
                let value = self.var(name)?;
                lookup_chain(value, chain).cloned()
            }
            Arg::Function(name) => self.eval_function(dot, name, &[], None),
            Arg::Pipeline(pipe) => self.eval_commands(dot, &pipe.cmds),
            Arg::Chain(inner, chain) => {
                let value = self.eval_arg(dot, inner)?;
                lookup_chain(&value, chain).cloned()
            }
        }
    }

    fn eval_function(
        &mut self,
        dot: &Value,
        name: &str,
        args: &[Arg],
        piped: Option<Value>,
    ) -> Result<Value, ExecError> {
        let call_error = |source: FuncError| ExecError::Function {
            name: name.to_string(),
            source,
        };

        if let Some(func) = self.funcs.get(name) {
            let values = self.eval_args(dot, args, piped)?;
            return func(&values).map_err(call_error);
        }
        if let Some(and) = builtins::logical(name) {
            return self.eval_logical(dot, name, and, args, piped);
        }
        let builtin = builtins::lookup(name).ok_or_else(|| ExecError::UnknownFunction(name.to_string()))?;
        let values = self.eval_args(dot, args, piped)?;
        builtin(&values).map_err(call_error)
    }

    fn eval_args(&mut self, dot: &Value, args: &[Arg], piped: Option<Value>) -> Result<Vec<Value>, ExecError> {
        let mut values = Vec::with_capacity(args.len() + 1);
        for arg in args {
            values.push(self.eval_arg(dot, arg)?);
        }
        values.extend(piped);
        Ok(values)
    }

    /// `and` / `or`: stop at the first operand that decides the result and
    /// return that operand.
    fn eval_logical(
        &mut self,
        dot: &Value,
        name: &str,
        and: bool,
        args: &[Arg],
        piped: Option<Value>,
    ) -> Result<Value, ExecError> {
        let got = args.len() + usize::from(piped.is_some());
        if got == 0 {
            return Err(ExecError::Function {
                name: name.to_string(),
                source: FuncError::TooFewArgs { min: 1, got },
            });
        }
        let mut last = Value::Null;
        for arg in args {
            let value = self.eval_arg(dot, arg)?;
            if is_true(&value) != and {
                return Ok(value);
            }
            last = value;
        }
        Ok(piped.unwrap_or(last))
    }

    fn var(&self, name: &str) -> Result<&Value, ExecError> {
        self.vars
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value)
            .ok_or_else(|| ExecError::UndefinedVariable(name.to_string()))
    }

    fn bind(&mut self, name: &str, value: Value, assign: bool) -> Result<(), ExecError> {
        if !assign {
            self.vars.push((name.to_string(), value));
            return Ok(());
        }
        let slot = self
            .vars
            .iter_mut()
            .rev()
            .find(|(var, _)| var == name)
            .ok_or_else(|| ExecError::UndefinedVariable(name.to_string()))?;
        slot.1 = value;
        Ok(())
    }
}

fn at(line: usize) -> impl Fn(ExecError) -> ExecFailure {
    move |error| ExecFailure { line, error }
}

fn lookup_chain<'v>(start: &'v Value, chain: &[String]) -> Result<&'v Value, ExecError> {
    chain.iter().try_fold(start, |value, field| lookup_field(value, field))
}

/// Resolve `.Name` on a value: the key itself, else its snake_case form.
fn lookup_field<'v>(value: &'v Value, field: &str) -> Result<&'v Value, ExecError> {
    match value {
        Value::Object(map) => map
            .get(field)
            .or_else(|| map.get(&field.to_snake_case()))
            .ok_or_else(|| ExecError::FieldNotFound {
                field: field.to_string(),
            }),
        Value::Null => Err(ExecError::NilPointer {
            field: format!(".{field}"),
        }),
        other => Err(ExecError::NotAnObject {
            field: field.to_string(),
            kind: type_name(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_field_snake_case_fallback() {
        let data = json!({"settings": {"sqlc_version": "1.27.0"}});
        let chain = vec!["Settings".to_string(), "SqlcVersion".to_string()];
        assert_eq!(lookup_chain(&data, &chain).unwrap(), &json!("1.27.0"));
    }

    #[test]
    fn test_lookup_field_exact_match_wins() {
        let data = json!({"Name": "exact", "name": "snake"});
        assert_eq!(lookup_field(&data, "Name").unwrap(), &json!("exact"));
    }

    #[test]
    fn test_lookup_missing_field() {
        let data = json!({"settings": {}});
        let chain = vec!["Settings".to_string(), "Package".to_string()];
        match lookup_chain(&data, &chain) {
            Err(ExecError::FieldNotFound { field }) => assert_eq!(field, "Package"),
            other => panic!("expected missing field, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_through_null_and_scalar() {
        assert!(matches!(
            lookup_field(&json!(null), "Out"),
            Err(ExecError::NilPointer { .. })
        ));
        assert!(matches!(
            lookup_field(&json!("text"), "Len"),
            Err(ExecError::NotAnObject { kind: "string", .. })
        ));
    }
}
