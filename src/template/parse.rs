//! Parse tree for templates and the recursive-descent parser building it.

use std::collections::HashMap;

use serde_json::Value;

use super::error::SyntaxError;
use super::lex::{lex, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
    If(Branch),
    Range(Branch),
    With(Branch),
    Template {
        line: usize,
        name: String,
        pipe: Option<Pipeline>,
    },
    Break,
    Continue,
}

/// Shared shape of `if`, `range` and `with`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch {
    pub pipe: Pipeline,
    pub list: Vec<Node>,
    pub else_list: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub line: usize,
    pub decl: Vec<String>,
    pub is_assign: bool,
    pub cmds: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Command {
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Arg {
    Dot,
    Nil,
    Literal(Value),
    /// `.A.B`, resolved against dot.
    Field(Vec<String>),
    /// `$x.A.B`
    Variable(String, Vec<String>),
    Function(String),
    Pipeline(Box<Pipeline>),
    /// `(pipeline).A.B`
    Chain(Box<Arg>, Vec<String>),
}

impl Arg {
    pub fn describe(&self) -> String {
        match self {
            Arg::Dot => ".".to_string(),
            Arg::Nil => "nil".to_string(),
            Arg::Literal(value) => value.to_string(),
            Arg::Field(chain) => format!(".{}", chain.join(".")),
            Arg::Variable(name, chain) if chain.is_empty() => name.clone(),
            Arg::Variable(name, chain) => format!("{name}.{}", chain.join(".")),
            Arg::Function(name) => name.clone(),
            Arg::Pipeline(_) => "(pipeline)".to_string(),
            Arg::Chain(_, chain) => format!("(pipeline).{}", chain.join(".")),
        }
    }
}

/// A parsed template: the main list plus every `define`d body.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Tree {
    pub root: Vec<Node>,
    pub defines: HashMap<String, Vec<Node>>,
}

const KEYWORDS: &[&str] = &[
    "block", "break", "continue", "define", "else", "end", "if", "range", "template", "with",
];

pub(crate) fn parse(src: &str, is_function: &dyn Fn(&str) -> bool) -> Result<Tree, SyntaxError> {
    let tokens = lex(src)?;
    let parser = Parser {
        tokens,
        pos: 0,
        is_function,
        vars: vec!["$".to_string()],
        range_depth: 0,
        nesting: 0,
        defines: HashMap::new(),
    };
    parser.parse_root()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListEnd {
    Eof,
    End,
    Else,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    If,
    Range,
    With,
}

impl Control {
    fn keyword(self) -> &'static str {
        match self {
            Control::If => "if",
            Control::Range => "range",
            Control::With => "with",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decl {
    None,
    Single,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closing {
    Delim,
    Paren,
}

struct Parser<'f> {
    tokens: Vec<Token>,
    pos: usize,
    is_function: &'f dyn Fn(&str) -> bool,
    /// Variables in scope, innermost last.
    vars: Vec<String>,
    range_depth: usize,
    nesting: usize,
    defines: HashMap<String, Vec<Node>>,
}

impl<'f> Parser<'f> {
    fn parse_root(mut self) -> Result<Tree, SyntaxError> {
        let (root, end) = self.parse_list()?;
        match end {
            ListEnd::Eof => Ok(Tree {
                root,
                defines: self.defines,
            }),
            ListEnd::End => Err(self.error("unexpected {{end}}")),
            ListEnd::Else => Err(self.error("unexpected {{else}}")),
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line(), message)
    }

    fn skip_space(&mut self) {
        while matches!(self.peek(), Some(TokenKind::Space)) {
            self.pos += 1;
        }
    }

    fn peek_keyword(&self) -> Option<&str> {
        match self.peek() {
            Some(TokenKind::Identifier(name)) if KEYWORDS.contains(&name.as_str()) => Some(name.as_str()),
            _ => None,
        }
    }

    fn expect_right_delim(&mut self, context: &str) -> Result<(), SyntaxError> {
        self.skip_space();
        match self.next() {
            Some(Token {
                kind: TokenKind::RightDelim,
                ..
            }) => Ok(()),
            Some(token) => Err(SyntaxError::new(
                token.line,
                format!("unexpected {} in {context}", token.kind.describe()),
            )),
            None => Err(self.error(format!("unexpected EOF in {context}"))),
        }
    }

    fn expect_string(&mut self, context: &str) -> Result<String, SyntaxError> {
        self.skip_space();
        match self.next() {
            Some(Token {
                kind: TokenKind::Str(name),
                ..
            }) => Ok(name),
            _ => Err(self.error(format!("{context} name must be a string"))),
        }
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, ListEnd), SyntaxError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Text(text) => nodes.push(Node::Text(text)),
                TokenKind::LeftDelim => {
                    self.skip_space();
                    let line = self.line();
                    let keyword = self.peek_keyword().map(str::to_string);
                    if keyword.is_some() {
                        self.pos += 1;
                    }
                    match keyword.as_deref() {
                        Some("end") => {
                            self.expect_right_delim("end")?;
                            return Ok((nodes, ListEnd::End));
                        }
                        Some("else") => return Ok((nodes, ListEnd::Else)),
                        Some("if") => nodes.push(self.parse_control(Control::If, line)?),
                        Some("range") => nodes.push(self.parse_control(Control::Range, line)?),
                        Some("with") => nodes.push(self.parse_control(Control::With, line)?),
                        Some("define") => self.parse_define()?,
                        Some("block") => nodes.push(self.parse_block(line)?),
                        Some("template") => nodes.push(self.parse_template(line)?),
                        Some(word @ ("break" | "continue")) => {
                            if self.range_depth == 0 {
                                return Err(self.error(format!("{{{{{word}}}}} outside {{{{range}}}}")));
                            }
                            self.expect_right_delim(word)?;
                            nodes.push(if word == "break" {
                                Node::Break
                            } else {
                                Node::Continue
                            });
                        }
                        _ => {
                            let pipe = self.parse_pipeline(line, Decl::Single, Closing::Delim)?;
                            nodes.push(Node::Action(pipe));
                        }
                    }
                }
                other => {
                    return Err(SyntaxError::new(
                        token.line,
                        format!("unexpected {}", other.describe()),
                    ))
                }
            }
        }
        Ok((nodes, ListEnd::Eof))
    }

    fn parse_control(&mut self, control: Control, line: usize) -> Result<Node, SyntaxError> {
        let mark = self.vars.len();
        let decl = if control == Control::Range {
            Decl::Range
        } else {
            Decl::Single
        };
        let pipe = self.parse_pipeline(line, decl, Closing::Delim)?;

        self.nesting += 1;
        if control == Control::Range {
            self.range_depth += 1;
        }
        let body = self.parse_list();
        if control == Control::Range {
            self.range_depth -= 1;
        }
        let (list, end) = body?;

        let else_list = match end {
            ListEnd::Eof => {
                return Err(self.error(format!("unexpected EOF in {{{{{}}}}}", control.keyword())))
            }
            ListEnd::End => None,
            ListEnd::Else => Some(self.parse_else(control)?),
        };
        self.nesting -= 1;
        self.vars.truncate(mark);

        let branch = Branch {
            pipe,
            list,
            else_list,
        };
        Ok(match control {
            Control::If => Node::If(branch),
            Control::Range => Node::Range(branch),
            Control::With => Node::With(branch),
        })
    }

    /// Parse what follows `{{else`, through the closing `{{end}}`.
    fn parse_else(&mut self, control: Control) -> Result<Vec<Node>, SyntaxError> {
        self.skip_space();
        let chained = control != Control::Range
            && matches!(self.peek(), Some(TokenKind::Identifier(word)) if word == control.keyword());
        if chained {
            let line = self.line();
            self.pos += 1;
            return Ok(vec![self.parse_control(control, line)?]);
        }

        self.expect_right_delim("else")?;
        let (list, end) = self.parse_list()?;
        match end {
            ListEnd::End => Ok(list),
            ListEnd::Else => Err(self.error("expected end; found {{else}}")),
            ListEnd::Eof => Err(self.error(format!("unexpected EOF in {{{{{}}}}}", control.keyword()))),
        }
    }

    /// Parse a `define`d body up to its `{{end}}`, in a fresh variable scope.
    fn parse_body(&mut self, context: &str) -> Result<Vec<Node>, SyntaxError> {
        let saved_vars = std::mem::replace(&mut self.vars, vec!["$".to_string()]);
        let saved_range = std::mem::replace(&mut self.range_depth, 0);
        self.nesting += 1;
        let body = self.parse_list();
        self.nesting -= 1;
        self.vars = saved_vars;
        self.range_depth = saved_range;

        match body? {
            (list, ListEnd::End) => Ok(list),
            (_, ListEnd::Else) => Err(self.error(format!("unexpected {{{{else}}}} in {context}"))),
            (_, ListEnd::Eof) => Err(self.error(format!("unexpected EOF in {context}"))),
        }
    }

    fn parse_define(&mut self) -> Result<(), SyntaxError> {
        if self.nesting > 0 {
            return Err(self.error("unexpected {{define}}"));
        }
        let name = self.expect_string("define")?;
        self.expect_right_delim("define")?;
        let body = self.parse_body("define")?;
        self.add_define(name, body)
    }

    fn parse_block(&mut self, line: usize) -> Result<Node, SyntaxError> {
        let name = self.expect_string("block")?;
        let pipe = self.parse_pipeline(line, Decl::None, Closing::Delim)?;
        let body = self.parse_body("block")?;
        self.add_define(name.clone(), body)?;
        Ok(Node::Template {
            line,
            name,
            pipe: Some(pipe),
        })
    }

    fn parse_template(&mut self, line: usize) -> Result<Node, SyntaxError> {
        let name = self.expect_string("template")?;
        self.skip_space();
        let pipe = if matches!(self.peek(), Some(TokenKind::RightDelim)) {
            self.pos += 1;
            None
        } else {
            Some(self.parse_pipeline(line, Decl::None, Closing::Delim)?)
        };
        Ok(Node::Template { line, name, pipe })
    }

    fn add_define(&mut self, name: String, body: Vec<Node>) -> Result<(), SyntaxError> {
        match self.defines.get(&name).map(|existing| is_blank(existing)) {
            Some(false) if !is_blank(&body) => {
                Err(self.error(format!("multiple definition of template {name:?}")))
            }
            // An empty redefinition keeps the existing body.
            Some(false) => Ok(()),
            _ => {
                self.defines.insert(name, body);
                Ok(())
            }
        }
    }

    fn parse_pipeline(
        &mut self,
        line: usize,
        decl_mode: Decl,
        closing: Closing,
    ) -> Result<Pipeline, SyntaxError> {
        self.skip_space();
        let (decl, is_assign) = self.parse_declaration(decl_mode)?;

        let mut cmds = Vec::new();
        loop {
            cmds.push(self.parse_command()?);
            self.skip_space();
            if matches!(self.peek(), Some(TokenKind::Pipe)) {
                self.pos += 1;
                continue;
            }
            break;
        }

        match (closing, self.next()) {
            (
                Closing::Delim,
                Some(Token {
                    kind: TokenKind::RightDelim,
                    ..
                }),
            )
            | (
                Closing::Paren,
                Some(Token {
                    kind: TokenKind::RightParen,
                    ..
                }),
            ) => {}
            (_, Some(token)) => {
                return Err(SyntaxError::new(
                    token.line,
                    format!("unexpected {} in command", token.kind.describe()),
                ))
            }
            (_, None) => return Err(self.error("unclosed action")),
        }

        for name in &decl {
            if is_assign {
                if !self.vars.contains(name) {
                    return Err(self.error(format!("undefined variable {name:?}")));
                }
            } else {
                self.vars.push(name.clone());
            }
        }

        Ok(Pipeline {
            line,
            decl,
            is_assign,
            cmds,
        })
    }

    /// `$x :=`, `$x =` or, in a range, `$i, $e :=`.
    fn parse_declaration(&mut self, decl_mode: Decl) -> Result<(Vec<String>, bool), SyntaxError> {
        if decl_mode == Decl::None {
            return Ok((Vec::new(), false));
        }
        let Some(TokenKind::Variable(first)) = self.peek().cloned() else {
            return Ok((Vec::new(), false));
        };
        let start = self.pos;
        self.pos += 1;
        self.skip_space();
        match self.peek() {
            Some(TokenKind::Declare) => {
                self.pos += 1;
                Ok((vec![first], false))
            }
            Some(TokenKind::Assign) => {
                self.pos += 1;
                Ok((vec![first], true))
            }
            Some(TokenKind::Comma) if decl_mode == Decl::Range => {
                self.pos += 1;
                self.skip_space();
                let Some(TokenKind::Variable(second)) = self.next().map(|t| t.kind) else {
                    return Err(self.error("range can only initialize variables"));
                };
                self.skip_space();
                match self.next().map(|t| t.kind) {
                    Some(TokenKind::Declare) => Ok((vec![first, second], false)),
                    Some(TokenKind::Assign) => Ok((vec![first, second], true)),
                    _ => Err(self.error("expected := or = in range declaration")),
                }
            }
            _ => {
                self.pos = start;
                Ok((Vec::new(), false))
            }
        }
    }

    fn parse_command(&mut self) -> Result<Command, SyntaxError> {
        let mut args = Vec::new();
        loop {
            self.skip_space();
            match self.peek() {
                None => return Err(self.error("unclosed action")),
                Some(TokenKind::RightDelim | TokenKind::RightParen | TokenKind::Pipe) => break,
                Some(_) => args.push(self.parse_operand()?),
            }
            match self.peek() {
                Some(
                    TokenKind::Space | TokenKind::RightDelim | TokenKind::RightParen | TokenKind::Pipe,
                ) => {}
                None => return Err(self.error("unclosed action")),
                Some(other) => {
                    return Err(self.error(format!("unexpected {} in operand", other.describe())))
                }
            }
        }
        if args.is_empty() {
            return Err(self.error("missing value for command"));
        }
        Ok(Command { args })
    }

    fn collect_fields(&mut self) -> Vec<String> {
        let mut chain = Vec::new();
        while let Some(TokenKind::Field(name)) = self.peek() {
            chain.push(name.clone());
            self.pos += 1;
        }
        chain
    }

    fn parse_operand(&mut self) -> Result<Arg, SyntaxError> {
        let Some(token) = self.next() else {
            return Err(self.error("unclosed action"));
        };
        let arg = match token.kind {
            TokenKind::Dot => Arg::Dot,
            TokenKind::Nil => Arg::Nil,
            TokenKind::Bool(b) => Arg::Literal(Value::Bool(b)),
            TokenKind::Number(n) => Arg::Literal(n),
            TokenKind::Str(s) => Arg::Literal(Value::String(s)),
            TokenKind::Field(name) => {
                let mut chain = vec![name];
                chain.extend(self.collect_fields());
                Arg::Field(chain)
            }
            TokenKind::Variable(name) => {
                if !self.vars.contains(&name) {
                    return Err(SyntaxError::new(
                        token.line,
                        format!("undefined variable {name:?}"),
                    ));
                }
                Arg::Variable(name, self.collect_fields())
            }
            TokenKind::Identifier(name) => {
                if KEYWORDS.contains(&name.as_str()) {
                    return Err(SyntaxError::new(token.line, format!("unexpected <{name}> in command")));
                }
                if !(self.is_function)(&name) {
                    return Err(SyntaxError::new(
                        token.line,
                        format!("function {name:?} not defined"),
                    ));
                }
                Arg::Function(name)
            }
            TokenKind::LeftParen => {
                let pipe = self.parse_pipeline(token.line, Decl::None, Closing::Paren)?;
                let chain = self.collect_fields();
                let inner = Arg::Pipeline(Box::new(pipe));
                if chain.is_empty() {
                    inner
                } else {
                    Arg::Chain(Box::new(inner), chain)
                }
            }
            other => {
                return Err(SyntaxError::new(
                    token.line,
                    format!("unexpected {} in operand", other.describe()),
                ))
            }
        };
        Ok(arg)
    }
}

fn is_blank(list: &[Node]) -> bool {
    list.iter()
        .all(|node| matches!(node, Node::Text(text) if text.trim().is_empty()))
}
