//! Tokenizer for `{{ }}` template actions.

use serde_json::Value;

use super::error::SyntaxError;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Text(String),
    LeftDelim,
    RightDelim,
    Space,
    Dot,
    Field(String),
    Variable(String),
    Identifier(String),
    Str(String),
    Number(Value),
    Bool(bool),
    Nil,
    Pipe,
    LeftParen,
    RightParen,
    Comma,
    Declare,
    Assign,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Text(_) => "text".to_string(),
            TokenKind::LeftDelim => "{{".to_string(),
            TokenKind::RightDelim => "}}".to_string(),
            TokenKind::Space => "space".to_string(),
            TokenKind::Dot => "\".\"".to_string(),
            TokenKind::Field(name) => format!("field .{name}"),
            TokenKind::Variable(name) => format!("variable {name}"),
            TokenKind::Identifier(name) => format!("identifier {name:?}"),
            TokenKind::Str(s) => format!("string {s:?}"),
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Bool(b) => format!("{b}"),
            TokenKind::Nil => "nil".to_string(),
            TokenKind::Pipe => "\"|\"".to_string(),
            TokenKind::LeftParen => "\"(\"".to_string(),
            TokenKind::RightParen => "\")\"".to_string(),
            TokenKind::Comma => "\",\"".to_string(),
            TokenKind::Declare => "\":=\"".to_string(),
            TokenKind::Assign => "\"=\"".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

pub(crate) fn lex(src: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer {
        src,
        pos: 0,
        line: 1,
        paren_depth: 0,
        tokens: Vec::new(),
    }
    .run()
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// `-` followed by a space right after `{{`.
fn has_left_trim(after_delim: &str) -> bool {
    let mut chars = after_delim.chars();
    chars.next() == Some('-') && chars.next().is_some_and(is_space)
}

/// Length of the closing delimiter at the start of `s`, and whether it trims.
fn right_delim_at(s: &str) -> Option<(usize, bool)> {
    if s.starts_with(RIGHT_DELIM) {
        return Some((RIGHT_DELIM.len(), false));
    }
    let mut chars = s.chars();
    let space = chars.next().filter(|c| is_space(*c))?;
    let rest = &s[space.len_utf8()..];
    if rest.starts_with('-') && rest[1..].starts_with(RIGHT_DELIM) {
        return Some((space.len_utf8() + 1 + RIGHT_DELIM.len(), true));
    }
    None
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    paren_depth: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut trim_leading = false;
        loop {
            let rest = &self.src[self.pos..];
            let found = rest.find(LEFT_DELIM);
            let raw_len = found.unwrap_or(rest.len());

            let mut text = &rest[..raw_len];
            if trim_leading {
                text = text.trim_start_matches(is_space);
            }
            let trim_trailing = found.is_some() && has_left_trim(&rest[raw_len + LEFT_DELIM.len()..]);
            if trim_trailing {
                text = text.trim_end_matches(is_space);
            }
            if !text.is_empty() {
                self.push(TokenKind::Text(text.to_string()));
            }
            self.line += rest[..raw_len].matches('\n').count();

            if found.is_none() {
                return Ok(self.tokens);
            }
            self.pos += raw_len + LEFT_DELIM.len();
            if trim_trailing {
                self.pos += 1;
            }
            trim_leading = self.lex_action(trim_trailing)?;
        }
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line, message)
    }

    /// Lex one action or comment; returns whether the following text is trimmed.
    fn lex_action(&mut self, trimmed: bool) -> Result<bool, SyntaxError> {
        let comment_start = if trimmed { self.pos + 1 } else { self.pos };
        if self.src[comment_start..].starts_with(LEFT_COMMENT) {
            return self.lex_comment(comment_start);
        }

        self.push(TokenKind::LeftDelim);
        loop {
            let rest = &self.src[self.pos..];
            if let Some((len, trim)) = right_delim_at(rest) {
                if self.paren_depth > 0 {
                    return Err(self.error("unclosed left paren"));
                }
                self.push(TokenKind::RightDelim);
                self.pos += len;
                return Ok(trim);
            }
            let Some(c) = self.peek() else {
                return Err(self.error("unclosed action"));
            };
            self.lex_item(c)?;
        }
    }

    fn lex_comment(&mut self, start: usize) -> Result<bool, SyntaxError> {
        let body = start + LEFT_COMMENT.len();
        let Some(end) = self.src[body..].find(RIGHT_COMMENT) else {
            return Err(self.error("unclosed comment"));
        };
        let comment_end = body + end + RIGHT_COMMENT.len();
        self.line += self.src[self.pos..comment_end].matches('\n').count();
        self.pos = comment_end;

        match right_delim_at(&self.src[self.pos..]) {
            Some((len, trim)) => {
                self.pos += len;
                Ok(trim)
            }
            None => Err(self.error("comment ends before closing delimiter")),
        }
    }

    fn lex_item(&mut self, c: char) -> Result<(), SyntaxError> {
        match c {
            c if is_space(c) => self.lex_space(),
            '"' => self.lex_quote(),
            '`' => self.lex_raw_quote(),
            '\'' => self.lex_char(),
            '.' => {
                let next = self.src[self.pos + 1..].chars().next();
                match next {
                    Some(d) if d.is_ascii_digit() => self.lex_number(),
                    Some(n) if is_ident_char(n) => {
                        self.pos += 1;
                        let name = self.take_while(is_ident_char);
                        self.push(TokenKind::Field(name));
                        Ok(())
                    }
                    _ => {
                        self.pos += 1;
                        self.push(TokenKind::Dot);
                        Ok(())
                    }
                }
            }
            '$' => {
                self.pos += 1;
                let name = self.take_while(is_ident_char);
                self.push(TokenKind::Variable(format!("${name}")));
                Ok(())
            }
            '|' => self.single(TokenKind::Pipe),
            ',' => self.single(TokenKind::Comma),
            '=' => self.single(TokenKind::Assign),
            '(' => {
                self.paren_depth += 1;
                self.single(TokenKind::LeftParen)
            }
            ')' => {
                if self.paren_depth == 0 {
                    return Err(self.error("unexpected right paren"));
                }
                self.paren_depth -= 1;
                self.single(TokenKind::RightParen)
            }
            ':' => {
                if self.src[self.pos..].starts_with(":=") {
                    self.pos += 2;
                    self.push(TokenKind::Declare);
                    Ok(())
                } else {
                    Err(self.error("expected :="))
                }
            }
            '+' | '-' => {
                let next = self.src[self.pos + 1..].chars().next();
                if next.is_some_and(|n| n.is_ascii_digit() || n == '.') {
                    self.lex_number()
                } else {
                    Err(self.error(format!("bad character {c:?}")))
                }
            }
            c if c.is_ascii_digit() => self.lex_number(),
            c if is_ident_char(c) => {
                let word = self.take_while(is_ident_char);
                let kind = match word.as_str() {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    "nil" => TokenKind::Nil,
                    _ => TokenKind::Identifier(word),
                };
                self.push(kind);
                Ok(())
            }
            other => Err(self.error(format!("unrecognized character in action: {other:?}"))),
        }
    }

    fn single(&mut self, kind: TokenKind) -> Result<(), SyntaxError> {
        self.pos += 1;
        self.push(kind);
        Ok(())
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let rest = &self.src[self.pos..];
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_string()
    }

    fn lex_space(&mut self) -> Result<(), SyntaxError> {
        let rest = &self.src[self.pos..];
        let mut len = rest.find(|c: char| !is_space(c)).unwrap_or(rest.len());
        // The last space before `-}}` belongs to the trim marker.
        if rest[len..].starts_with('-') && rest[len + 1..].starts_with(RIGHT_DELIM) {
            len -= 1;
        }
        self.line += rest[..len].matches('\n').count();
        self.pos += len;
        if len > 0 {
            self.push(TokenKind::Space);
        }
        Ok(())
    }

    fn lex_quote(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos + 1;
        let mut escaped = false;
        for (offset, c) in self.src[start..].char_indices() {
            match c {
                '\n' => return Err(self.error("unterminated quoted string")),
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    let raw = &self.src[start..start + offset];
                    let value = unescape(raw).map_err(|message| self.error(message))?;
                    self.pos = start + offset + 1;
                    self.push(TokenKind::Str(value));
                    return Ok(());
                }
                _ => escaped = false,
            }
        }
        Err(self.error("unterminated quoted string"))
    }

    fn lex_raw_quote(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos + 1;
        let Some(end) = self.src[start..].find('`') else {
            return Err(self.error("unterminated raw quoted string"));
        };
        let value = self.src[start..start + end].to_string();
        self.push(TokenKind::Str(value));
        self.line += self.src[start..start + end].matches('\n').count();
        self.pos = start + end + 1;
        Ok(())
    }

    fn lex_char(&mut self) -> Result<(), SyntaxError> {
        let start = self.pos + 1;
        let mut escaped = false;
        for (offset, c) in self.src[start..].char_indices() {
            match c {
                '\n' => break,
                '\\' if !escaped => escaped = true,
                '\'' if !escaped => {
                    let raw = &self.src[start..start + offset];
                    let value = unescape(raw).map_err(|message| self.error(message))?;
                    let mut chars = value.chars();
                    let (Some(ch), None) = (chars.next(), chars.next()) else {
                        return Err(self.error(format!("malformed character constant: '{raw}'")));
                    };
                    self.pos = start + offset + 1;
                    self.push(TokenKind::Number(Value::from(ch as u32)));
                    return Ok(());
                }
                _ => escaped = false,
            }
        }
        Err(self.error("unterminated character constant"))
    }

    fn lex_number(&mut self) -> Result<(), SyntaxError> {
        let rest = &self.src[self.pos..];
        let mut len = 0;
        let mut prev = None;
        for (offset, c) in rest.char_indices() {
            let sign_ok = offset == 0 || matches!(prev, Some('e' | 'E' | 'p' | 'P'));
            let accept = c.is_ascii_alphanumeric() || c == '_' || c == '.' || ((c == '+' || c == '-') && sign_ok);
            if !accept {
                break;
            }
            len = offset + c.len_utf8();
            prev = Some(c);
        }
        let text = &rest[..len];
        let value = parse_number(text).ok_or_else(|| self.error(format!("bad number syntax: {text:?}")))?;
        self.pos += len;
        self.push(TokenKind::Number(value));
        Ok(())
    }
}

/// Parse an integer (decimal, hex, octal or binary) or float literal.
pub(crate) fn parse_number(text: &str) -> Option<Value> {
    let cleaned = text.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    if digits.is_empty() {
        return None;
    }

    let radix_int = |radix: u32, body: &str| {
        let magnitude = i64::from_str_radix(body, radix).ok()?;
        Some(Value::from(if negative { -magnitude } else { magnitude }))
    };
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return radix_int(16, hex);
    }
    if let Some(oct) = lower.strip_prefix("0o") {
        return radix_int(8, oct);
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return radix_int(2, bin);
    }
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        if digits.len() > 1 && digits.starts_with('0') {
            return radix_int(8, &digits[1..]);
        }
        return match digits.parse::<i64>() {
            Ok(i) => Some(Value::from(if negative { -i } else { i })),
            Err(_) if !negative => digits.parse::<u64>().ok().map(Value::from),
            Err(_) => None,
        };
    }

    let float: f64 = digits.parse().ok()?;
    let float = if negative { -float } else { float };
    serde_json::Number::from_f64(float).map(Value::Number)
}

/// Resolve backslash escapes of an interpreted string literal.
fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            return Err("unterminated escape sequence".to_string());
        };
        let decoded = match escape {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'v' => '\u{0B}',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => hex_escape(&mut chars, 2)?,
            'u' => hex_escape(&mut chars, 4)?,
            'U' => hex_escape(&mut chars, 8)?,
            '0'..='7' => {
                let rest: String = chars.by_ref().take(2).collect();
                let code = u32::from_str_radix(&format!("{escape}{rest}"), 8)
                    .map_err(|_| format!("invalid octal escape \\{escape}{rest}"))?;
                char::from_u32(code).ok_or_else(|| format!("invalid octal escape \\{escape}{rest}"))?
            }
            other => return Err(format!("unknown escape sequence \\{other}")),
        };
        out.push(decoded);
    }
    Ok(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return Err(format!("short hex escape \\{hex}"));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid hex escape {hex}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_text_only() {
        assert_eq!(kinds("hello"), vec![TokenKind::Text("hello".into())]);
        assert!(kinds("").is_empty());
    }

    #[test]
    fn test_field_chain() {
        assert_eq!(
            kinds("package {{.Settings.Package}}"),
            vec![
                TokenKind::Text("package ".into()),
                TokenKind::LeftDelim,
                TokenKind::Field("Settings".into()),
                TokenKind::Field("Package".into()),
                TokenKind::RightDelim,
            ]
        );
    }

    #[test]
    fn test_pipeline_tokens() {
        assert_eq!(
            kinds(r#"{{$x := "a\tb" | upper}}"#),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Variable("$x".into()),
                TokenKind::Space,
                TokenKind::Declare,
                TokenKind::Space,
                TokenKind::Str("a\tb".into()),
                TokenKind::Space,
                TokenKind::Pipe,
                TokenKind::Space,
                TokenKind::Identifier("upper".into()),
                TokenKind::RightDelim,
            ]
        );
    }

    #[test]
    fn test_trim_markers() {
        assert_eq!(
            kinds("a  \n{{- 1 -}}\n  b"),
            vec![
                TokenKind::Text("a".into()),
                TokenKind::LeftDelim,
                TokenKind::Space,
                TokenKind::Number(json!(1)),
                TokenKind::RightDelim,
                TokenKind::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_comment_is_dropped() {
        assert_eq!(
            kinds("a {{- /* note\nmore */ -}} b"),
            vec![TokenKind::Text("a".into()), TokenKind::Text("b".into())]
        );
        assert_eq!(kinds("{{/* x */}}"), vec![]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds("{{true nil -3 0x1F 1.5 'a' `raw\\n`}}"),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Bool(true),
                TokenKind::Space,
                TokenKind::Nil,
                TokenKind::Space,
                TokenKind::Number(json!(-3)),
                TokenKind::Space,
                TokenKind::Number(json!(31)),
                TokenKind::Space,
                TokenKind::Number(json!(1.5)),
                TokenKind::Space,
                TokenKind::Number(json!(97)),
                TokenKind::Space,
                TokenKind::Str("raw\\n".into()),
                TokenKind::RightDelim,
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let tokens = lex("one\ntwo\n{{.X}}").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unclosed_action() {
        let err = lex("{{.X").unwrap_err();
        assert_eq!(err.message, "unclosed action");
    }

    #[test]
    fn test_unterminated_string() {
        assert!(lex("{{\"abc}}").is_err());
    }

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("42"), Some(json!(42)));
        assert_eq!(parse_number("-0b101"), Some(json!(-5)));
        assert_eq!(parse_number("0o17"), Some(json!(15)));
        assert_eq!(parse_number("1_000"), Some(json!(1000)));
        assert_eq!(parse_number("2.5e3"), Some(json!(2500.0)));
        assert_eq!(parse_number("1x"), None);
    }
}
