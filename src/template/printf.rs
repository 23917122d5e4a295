//! `printf` formatting over template values, following Go's `fmt` verbs.

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

use serde_json::{Number, Value};

use super::value::{format_float_shortest, go_exponent, type_name, write_value};

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    minus: bool,
    plus: bool,
    sharp: bool,
    zero: bool,
    space: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

enum Piece {
    Text(String),
    Number {
        negative: bool,
        prefix: &'static str,
        digits: String,
        /// Integers ignore the `0` flag once a precision is given.
        integer: bool,
    },
}

/// Format `args` according to `format`.
///
/// Missing, surplus and mistyped operands are reported inline the way Go
/// does (`%!d(MISSING)`, `%!(EXTRA int=1)`, `%!d(string=x)`), never as an
/// error. Widths and precisions may come from operands (`%*d`) and operands
/// may be picked explicitly (`%[2]d`).
pub fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::new();
    let mut cursor = Cursor::new(args.len());
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        cursor.good = true;
        let mut flags = Flags::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => flags.minus = true,
                '+' => flags.plus = true,
                '#' => flags.sharp = true,
                '0' => flags.zero = true,
                ' ' => flags.space = true,
                _ => break,
            }
            chars.next();
        }

        let mut after_index = cursor.index(&mut chars);
        if chars.peek() == Some(&'*') {
            chars.next();
            match cursor.int_operand(args) {
                Some(w) => {
                    if w < 0 {
                        flags.minus = true;
                    }
                    flags.width = Some(w.unsigned_abs() as usize);
                }
                None => out.push_str("%!(BADWIDTH)"),
            }
            after_index = false;
        } else {
            flags.width = digits(&mut chars);
            if after_index && flags.width.is_some() {
                cursor.good = false;
            }
        }

        if chars.peek() == Some(&'.') {
            chars.next();
            if after_index {
                cursor.good = false;
            }
            after_index = cursor.index(&mut chars);
            if chars.peek() == Some(&'*') {
                chars.next();
                match cursor.int_operand(args).filter(|p| *p >= 0) {
                    Some(p) => flags.precision = Some(p as usize),
                    None => out.push_str("%!(BADPREC)"),
                }
                after_index = false;
            } else {
                flags.precision = Some(digits(&mut chars).unwrap_or(0));
            }
        }
        if !after_index {
            cursor.index(&mut chars);
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        if !cursor.good {
            let _ = write!(out, "%!{verb}(BADINDEX)");
            continue;
        }
        match args.get(cursor.next) {
            Some(arg) => {
                format_arg(&mut out, verb, &flags, arg);
                cursor.next += 1;
            }
            None => {
                let _ = write!(out, "%!{verb}(MISSING)");
            }
        }
    }

    if !cursor.reordered && cursor.next < args.len() {
        out.push_str("%!(EXTRA ");
        for (i, arg) in args[cursor.next..].iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if !arg.is_null() {
                out.push_str(type_name(arg));
                out.push('=');
            }
            write_value(&mut out, arg);
        }
        out.push(')');
    }
    out
}

/// Which operand the next verb consumes.
struct Cursor {
    next: usize,
    len: usize,
    /// Set once any `[n]` index appears; disables the EXTRA report.
    reordered: bool,
    /// Cleared by a malformed or out of range index for the current verb.
    good: bool,
}

impl Cursor {
    fn new(len: usize) -> Self {
        Cursor {
            next: 0,
            len,
            reordered: false,
            good: true,
        }
    }

    /// Consume an `[n]` index if one is next. Returns whether a valid index
    /// was read.
    fn index(&mut self, chars: &mut Peekable<Chars<'_>>) -> bool {
        if chars.peek() != Some(&'[') {
            return false;
        }
        self.reordered = true;
        chars.next();
        let mut ahead = chars.clone();
        let mut body = String::new();
        loop {
            match ahead.next() {
                Some(']') => break,
                Some(c) => body.push(c),
                None => {
                    self.good = false;
                    return false;
                }
            }
        }
        *chars = ahead;
        match body.parse::<usize>() {
            Ok(n) if body.bytes().all(|b| b.is_ascii_digit()) && (1..=self.len).contains(&n) => {
                self.next = n - 1;
                true
            }
            _ => {
                self.good = false;
                false
            }
        }
    }

    /// Take the next operand as a `*` width or precision.
    fn int_operand(&mut self, args: &[Value]) -> Option<i64> {
        let arg = args.get(self.next)?;
        self.next += 1;
        arg.as_i64()
    }
}

fn format_arg(out: &mut String, verb: char, flags: &Flags, arg: &Value) {
    match arg {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                format_arg(out, verb, flags, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push_str("map[");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                format_arg(out, verb, flags, &Value::String(key.clone()));
                out.push(':');
                format_arg(out, verb, flags, item);
            }
            out.push(']');
        }
        scalar => match render(verb, flags, scalar) {
            Some(piece) => pad(out, flags, piece),
            None => bad_verb(out, verb, scalar),
        },
    }
}

fn bad_verb(out: &mut String, verb: char, arg: &Value) {
    if arg.is_null() {
        let _ = write!(out, "%!{verb}(<nil>)");
    } else {
        let _ = write!(out, "%!{verb}({}=", type_name(arg));
        write_value(out, arg);
        out.push(')');
    }
}

fn render(verb: char, flags: &Flags, arg: &Value) -> Option<Piece> {
    match arg {
        Value::Null => (verb == 'v').then(|| Piece::Text("<nil>".to_string())),
        Value::Bool(b) => matches!(verb, 't' | 'v').then(|| Piece::Text(b.to_string())),
        Value::String(s) => render_str(verb, flags, s),
        Value::Number(n) if n.is_f64() => render_float(verb, flags, n.as_f64()?),
        Value::Number(n) => render_int(verb, flags, integer(n)?),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn render_str(verb: char, flags: &Flags, s: &str) -> Option<Piece> {
    let text = match verb {
        's' | 'v' => match flags.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.to_string(),
        },
        'q' => format!("{s:?}"),
        'x' => s.bytes().map(|b| format!("{b:02x}")).collect(),
        'X' => s.bytes().map(|b| format!("{b:02X}")).collect(),
        _ => return None,
    };
    Some(Piece::Text(text))
}

fn render_int(verb: char, flags: &Flags, i: i128) -> Option<Piece> {
    let negative = i < 0;
    let abs = i.unsigned_abs();
    let (prefix, mut digits) = match verb {
        'd' | 'v' => ("", abs.to_string()),
        'x' => (if flags.sharp { "0x" } else { "" }, format!("{abs:x}")),
        'X' => (if flags.sharp { "0X" } else { "" }, format!("{abs:X}")),
        'o' => (if flags.sharp { "0" } else { "" }, format!("{abs:o}")),
        'O' => ("0o", format!("{abs:o}")),
        'b' => (if flags.sharp { "0b" } else { "" }, format!("{abs:b}")),
        'c' => {
            let c = u32::try_from(i).ok().and_then(char::from_u32).unwrap_or('\u{FFFD}');
            return Some(Piece::Text(c.to_string()));
        }
        'q' => {
            let c = u32::try_from(i).ok().and_then(char::from_u32).unwrap_or('\u{FFFD}');
            return Some(Piece::Text(format!("{c:?}")));
        }
        'U' => return Some(Piece::Text(format!("U+{abs:04X}"))),
        _ => return None,
    };
    if let Some(p) = flags.precision {
        if digits.len() < p {
            digits = format!("{}{digits}", "0".repeat(p - digits.len()));
        }
    }
    Some(Piece::Number {
        negative,
        prefix,
        digits,
        integer: true,
    })
}

fn render_float(verb: char, flags: &Flags, f: f64) -> Option<Piece> {
    let negative = f.is_sign_negative() && f != 0.0;
    let abs = f.abs();
    let digits = match verb {
        'f' | 'F' => format!("{:.*}", flags.precision.unwrap_or(6), abs),
        'e' => go_exponent(&format!("{:.*e}", flags.precision.unwrap_or(6), abs)),
        'E' => go_exponent(&format!("{:.*e}", flags.precision.unwrap_or(6), abs)).replace('e', "E"),
        'g' | 'v' => format_g(abs, flags.precision, flags.sharp),
        'G' => format_g(abs, flags.precision, flags.sharp).replace('e', "E"),
        _ => return None,
    };
    Some(Piece::Number {
        negative,
        prefix: "",
        digits,
        integer: false,
    })
}

/// `%g`: exponent form for large or small exponents, otherwise plain, with
/// trailing zeros removed unless `#` is set.
fn format_g(f: f64, precision: Option<usize>, sharp: bool) -> String {
    let Some(p) = precision else {
        return format_float_shortest(f);
    };
    let p = p.max(1);
    let sci = format!("{:.*e}", p - 1, f);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= p as i32 {
        let mantissa = if sharp { mantissa.to_string() } else { trim_zeros(mantissa) };
        go_exponent(&format!("{mantissa}e{exp}"))
    } else {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        let fixed = format!("{f:.decimals$}");
        if sharp {
            fixed
        } else {
            trim_zeros(&fixed)
        }
    }
}

fn trim_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

fn pad(out: &mut String, flags: &Flags, piece: Piece) {
    let width = flags.width.unwrap_or(0);
    match piece {
        Piece::Text(text) => {
            let fill = width.saturating_sub(text.chars().count());
            if flags.minus {
                out.push_str(&text);
                out.extend(std::iter::repeat(' ').take(fill));
            } else {
                let c = if flags.zero { '0' } else { ' ' };
                out.extend(std::iter::repeat(c).take(fill));
                out.push_str(&text);
            }
        }
        Piece::Number {
            negative,
            prefix,
            digits,
            integer,
        } => {
            let sign = if negative {
                "-"
            } else if flags.plus {
                "+"
            } else if flags.space {
                " "
            } else {
                ""
            };
            let len = sign.len() + prefix.len() + digits.chars().count();
            let fill = width.saturating_sub(len);
            if flags.minus {
                out.push_str(sign);
                out.push_str(prefix);
                out.push_str(&digits);
                out.extend(std::iter::repeat(' ').take(fill));
            } else if flags.zero && !(integer && flags.precision.is_some()) {
                out.push_str(sign);
                out.push_str(prefix);
                out.extend(std::iter::repeat('0').take(fill));
                out.push_str(&digits);
            } else {
                out.extend(std::iter::repeat(' ').take(fill));
                out.push_str(sign);
                out.push_str(prefix);
                out.push_str(&digits);
            }
        }
    }
}

/// Read a run of ASCII digits as a number, or `None` if there are none.
fn digits(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
    }
    value
}
