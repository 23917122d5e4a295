use std::error::Error;

/// Error returned by a template function.
#[derive(Debug, thiserror::Error)]
pub enum FuncError {
    #[error("wrong number of args: want {want}, got {got}")]
    Arity { want: usize, got: usize },

    #[error("wrong number of args: want at least {min}, got {got}")]
    TooFewArgs { min: usize, got: usize },

    #[error("wrong type for value; expected {expected}; got {got}")]
    ArgType {
        expected: &'static str,
        got: &'static str,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Other(Box<dyn Error + Send + Sync>),
}

impl FuncError {
    pub fn other<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        FuncError::Other(Box::new(err))
    }
}

/// Error raised while executing a parsed template.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("field {field} not found")]
    FieldNotFound { field: String },

    #[error("nil pointer evaluating {field}")]
    NilPointer { field: String },

    #[error("can't evaluate field {field} in type {kind}")]
    NotAnObject { field: String, kind: &'static str },

    #[error("can't give argument to non-function {0}")]
    NotAFunction(String),

    #[error("nil is not a command")]
    NilCommand,

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("function {0:?} not defined")]
    UnknownFunction(String),

    #[error("error calling {name}: {source}")]
    Function { name: String, source: FuncError },

    #[error("range can't iterate over {0}")]
    RangeOver(String),

    #[error("no such template {0:?}")]
    UnknownTemplate(String),

    #[error("exceeded maximum template depth ({0})")]
    DepthExceeded(usize),
}

/// Error from parsing or executing a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template: {name}:{line}: {message}")]
    Parse {
        name: String,
        line: usize,
        message: String,
    },

    #[error("template: {name}:{line}: executing: {source}")]
    Exec {
        name: String,
        line: usize,
        source: ExecError,
    },
}

impl TemplateError {
    /// The execution error, if this failure happened while rendering.
    pub fn exec_error(&self) -> Option<&ExecError> {
        match self {
            TemplateError::Exec { source, .. } => Some(source),
            TemplateError::Parse { .. } => None,
        }
    }
}

/// Lexer and parser failure, located by line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Execution failure together with the line of the action that raised it.
#[derive(Debug)]
pub(crate) struct ExecFailure {
    pub line: usize,
    pub error: ExecError,
}
