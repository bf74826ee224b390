//! Name transform expressions.
//!
//! A transform is a `|` separated chain of string operations applied left
//! to right to the customer name:
//!
//! ```text
//! trim | lower | replace("-", " ") | title | slice(0, 20)
//! ```
//!
//! Only the operations listed in [`Op`] exist; nothing outside this module
//! is ever evaluated.

use crate::utils::error::{DiscountError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Trim,
    Lower,
    Upper,
    Title,
    Collapse,
    FirstWord,
    LastWord,
    Replace(String, String),
    Remove(String),
    Prefix(String),
    Suffix(String),
    Slice(i64, Option<i64>),
}

/// A compiled transform, ready to be applied to many names.
#[derive(Debug, Clone, PartialEq)]
pub struct NameTransform {
    ops: Vec<Op>,
}

impl NameTransform {
    pub fn compile(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let ops = Parser::new(tokens).parse()?;
        Ok(Self { ops })
    }

    pub fn apply(&self, name: &str) -> Result<String> {
        let mut value = name.to_string();
        for op in &self.ops {
            value = op.apply(&value);
        }

        if value.trim().is_empty() {
            return Err(DiscountError::transform(format!(
                "transform produced an empty name from '{}'",
                name
            )));
        }
        Ok(value)
    }
}

/// 單次轉換：編譯並套用於一個名稱
pub fn transform(name: &str, source: &str) -> Result<String> {
    NameTransform::compile(source)?.apply(name)
}

impl Op {
    fn build(name: &str, args: Vec<Arg>) -> Result<Self> {
        let op = match (name, args.as_slice()) {
            ("trim", []) => Op::Trim,
            ("lower", []) => Op::Lower,
            ("upper", []) => Op::Upper,
            ("title", []) => Op::Title,
            ("collapse", []) => Op::Collapse,
            ("first_word", []) => Op::FirstWord,
            ("last_word", []) => Op::LastWord,
            ("replace", [Arg::Text(from), Arg::Text(to)]) => {
                if from.is_empty() {
                    return Err(DiscountError::transform(
                        "replace() needs a non-empty search string",
                    ));
                }
                Op::Replace(from.clone(), to.clone())
            }
            ("remove", [Arg::Text(text)]) => {
                if text.is_empty() {
                    return Err(DiscountError::transform(
                        "remove() needs a non-empty string",
                    ));
                }
                Op::Remove(text.clone())
            }
            ("prefix", [Arg::Text(text)]) => Op::Prefix(text.clone()),
            ("suffix", [Arg::Text(text)]) => Op::Suffix(text.clone()),
            ("slice", [Arg::Int(start)]) => Op::Slice(*start, None),
            ("slice", [Arg::Int(start), Arg::Int(end)]) => Op::Slice(*start, Some(*end)),
            (
                "trim" | "lower" | "upper" | "title" | "collapse" | "first_word" | "last_word"
                | "replace" | "remove" | "prefix" | "suffix" | "slice",
                _,
            ) => {
                return Err(DiscountError::transform(format!(
                    "wrong arguments for {}(): {}",
                    name,
                    usage(name)
                )))
            }
            _ => {
                return Err(DiscountError::transform(format!(
                    "unknown operation '{}'",
                    name
                )))
            }
        };
        Ok(op)
    }

    fn apply(&self, value: &str) -> String {
        match self {
            Op::Trim => value.trim().to_string(),
            Op::Lower => value.to_lowercase(),
            Op::Upper => value.to_uppercase(),
            Op::Title => value
                .split(' ')
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" "),
            Op::Collapse => value.split_whitespace().collect::<Vec<_>>().join(" "),
            Op::FirstWord => value.split_whitespace().next().unwrap_or("").to_string(),
            Op::LastWord => value.split_whitespace().last().unwrap_or("").to_string(),
            Op::Replace(from, to) => value.replace(from.as_str(), to),
            Op::Remove(text) => value.replace(text.as_str(), ""),
            Op::Prefix(text) => format!("{}{}", text, value),
            Op::Suffix(text) => format!("{}{}", value, text),
            Op::Slice(start, end) => slice_chars(value, *start, *end),
        }
    }
}

fn usage(name: &str) -> &'static str {
    match name {
        "replace" => "replace(\"from\", \"to\")",
        "remove" => "remove(\"text\")",
        "prefix" => "prefix(\"text\")",
        "suffix" => "suffix(\"text\")",
        "slice" => "slice(start) or slice(start, end)",
        _ => "takes no arguments",
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// 負數索引由尾端起算，超出範圍時夾在邊界
fn slice_chars(value: &str, start: i64, end: Option<i64>) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len() as i64;
    let resolve = |idx: i64| -> usize {
        let idx = if idx < 0 { len + idx } else { idx };
        idx.clamp(0, len) as usize
    };

    let from = resolve(start);
    let to = end.map(resolve).unwrap_or(chars.len());
    if from >= to {
        return String::new();
    }
    chars[from..to].iter().collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Pipe,
    LParen,
    RParen,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '"' | '\'' => {
                chars.next();
                let quote = ch;
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, 't')) => text.push('\t'),
                            Some((_, escaped)) => text.push(escaped),
                            None => break,
                        },
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        c => text.push(c),
                    }
                }
                if !closed {
                    return Err(DiscountError::transform(format!(
                        "unterminated string starting at position {}",
                        pos
                    )));
                }
                tokens.push(Token::Str(text));
            }
            c if c == '-' || c.is_ascii_digit() => {
                chars.next();
                let mut digits = String::from(c);
                while let Some(&(_, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                let value = digits.parse::<i64>().map_err(|_| {
                    DiscountError::transform(format!(
                        "invalid number '{}' at position {}",
                        digits, pos
                    ))
                })?;
                tokens.push(Token::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(DiscountError::transform(format!(
                    "unexpected character '{}' at position {}",
                    other, pos
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    fn parse(mut self) -> Result<Vec<Op>> {
        let mut ops = vec![self.stage()?];
        while let Some(token) = self.tokens.next() {
            match token {
                Token::Pipe => ops.push(self.stage()?),
                other => {
                    return Err(DiscountError::transform(format!(
                        "expected '|' between operations, found {:?}",
                        other
                    )))
                }
            }
        }
        Ok(ops)
    }

    fn stage(&mut self) -> Result<Op> {
        let name = match self.tokens.next() {
            Some(Token::Ident(name)) => name,
            Some(other) => {
                return Err(DiscountError::transform(format!(
                    "expected an operation name, found {:?}",
                    other
                )))
            }
            None => return Err(DiscountError::transform("expected an operation name")),
        };

        let mut args = Vec::new();
        if self.tokens.peek() == Some(&Token::LParen) {
            self.tokens.next();
            if self.tokens.peek() == Some(&Token::RParen) {
                self.tokens.next();
            } else {
                loop {
                    match self.tokens.next() {
                        Some(Token::Str(text)) => args.push(Arg::Text(text)),
                        Some(Token::Int(value)) => args.push(Arg::Int(value)),
                        other => {
                            return Err(DiscountError::transform(format!(
                                "expected an argument in {}(), found {:?}",
                                name, other
                            )))
                        }
                    }
                    match self.tokens.next() {
                        Some(Token::Comma) => continue,
                        Some(Token::RParen) => break,
                        other => {
                            return Err(DiscountError::transform(format!(
                                "expected ',' or ')' in {}(), found {:?}",
                                name, other
                            )))
                        }
                    }
                }
            }
        }

        Op::build(&name, args)
    }
}
