use super::ast::Span;
use crate::error::CompileError;
use serde_json::Number;

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Ident(String),
    Str(String),
    Num(Number),

    // Keywords
    Violation,
    Func,
    Package,
    Some,
    In,
    Not,
    True,
    False,
    Null,

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Dot,
    Colon,
    Semi,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    Newline,
    Eof,
}

impl Tok {
    pub fn describe(&self) -> String {
        match self {
            Tok::Ident(name) => format!("identifier '{name}'"),
            Tok::Str(_) => "string".to_string(),
            Tok::Num(n) => format!("number {n}"),
            Tok::Newline => "end of line".to_string(),
            Tok::Eof => "end of input".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Tok::Violation => "violation",
            Tok::Func => "func",
            Tok::Package => "package",
            Tok::Some => "some",
            Tok::In => "in",
            Tok::Not => "not",
            Tok::True => "true",
            Tok::False => "false",
            Tok::Null => "null",
            Tok::LBrace => "{",
            Tok::RBrace => "}",
            Tok::LBracket => "[",
            Tok::RBracket => "]",
            Tok::LParen => "(",
            Tok::RParen => ")",
            Tok::Comma => ",",
            Tok::Dot => ".",
            Tok::Colon => ":",
            Tok::Semi => ";",
            Tok::Assign => ":=",
            Tok::Eq => "==",
            Tok::Ne => "!=",
            Tok::Lt => "<",
            Tok::Le => "<=",
            Tok::Gt => ">",
            Tok::Ge => ">=",
            Tok::Plus => "+",
            Tok::Minus => "-",
            Tok::Star => "*",
            Tok::Slash => "/",
            Tok::Percent => "%",
            Tok::Ident(_) | Tok::Str(_) | Tok::Num(_) | Tok::Newline | Tok::Eof => "",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub span: Span,
}

/// Split policy source into tokens.
///
/// Newlines are significant (they end statements) except inside `(...)` and
/// `[...]`. Consecutive newlines collapse into one token. `#` starts a comment.
pub fn tokenize(src: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(src).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
    depth: u32,
    out: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            col: 1,
            depth: 0,
            out: Vec::new(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn error(span: Span, message: impl Into<String>) -> CompileError {
        CompileError::Policy {
            line: span.line,
            col: span.col,
            message: message.into(),
        }
    }

    fn push(&mut self, tok: Tok, span: Span) {
        self.out.push(Token { tok, span });
    }

    fn run(mut self) -> Result<Vec<Token>, CompileError> {
        while let Some(c) = self.peek() {
            let span = Span {
                line: self.line,
                col: self.col,
            };
            match c {
                '\n' => {
                    self.bump();
                    let last_is_newline =
                        matches!(self.out.last(), Some(Token { tok: Tok::Newline, .. }) | None);
                    if self.depth == 0 && !last_is_newline {
                        self.push(Tok::Newline, span);
                    }
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '"' => {
                    let s = self.string(span)?;
                    self.push(Tok::Str(s), span);
                }
                '`' => {
                    let s = self.raw_string(span)?;
                    self.push(Tok::Str(s), span);
                }
                c if c.is_ascii_digit() => {
                    let n = self.number(span)?;
                    self.push(Tok::Num(n), span);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let word = self.word();
                    let tok = match word.as_str() {
                        "violation" => Tok::Violation,
                        "func" => Tok::Func,
                        "package" => Tok::Package,
                        "some" => Tok::Some,
                        "in" => Tok::In,
                        "not" => Tok::Not,
                        "true" => Tok::True,
                        "false" => Tok::False,
                        "null" => Tok::Null,
                        _ => Tok::Ident(word),
                    };
                    self.push(tok, span);
                }
                _ => {
                    self.bump();
                    let tok = self.punct(c, span)?;
                    match tok {
                        Tok::LParen | Tok::LBracket => self.depth += 1,
                        Tok::RParen | Tok::RBracket => self.depth = self.depth.saturating_sub(1),
                        _ => {}
                    }
                    self.push(tok, span);
                }
            }
        }
        let span = Span {
            line: self.line,
            col: self.col,
        };
        self.push(Tok::Eof, span);
        Ok(self.out)
    }

    fn punct(&mut self, c: char, span: Span) -> Result<Tok, CompileError> {
        let followed_by_eq = |lexer: &mut Self| {
            if lexer.peek() == Some('=') {
                lexer.bump();
                true
            } else {
                false
            }
        };
        let tok = match c {
            '{' => Tok::LBrace,
            '}' => Tok::RBrace,
            '[' => Tok::LBracket,
            ']' => Tok::RBracket,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            ',' => Tok::Comma,
            '.' => Tok::Dot,
            ';' => Tok::Semi,
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' => Tok::Star,
            '/' => Tok::Slash,
            '%' => Tok::Percent,
            ':' if followed_by_eq(self) => Tok::Assign,
            ':' => Tok::Colon,
            '=' if followed_by_eq(self) => Tok::Eq,
            '!' if followed_by_eq(self) => Tok::Ne,
            '<' if followed_by_eq(self) => Tok::Le,
            '<' => Tok::Lt,
            '>' if followed_by_eq(self) => Tok::Ge,
            '>' => Tok::Gt,
            '=' => {
                return Err(Self::error(
                    span,
                    "unexpected '=' (use ':=' to bind or '==' to compare)",
                ));
            }
            other => return Err(Self::error(span, format!("unexpected character '{other}'"))),
        };
        Ok(tok)
    }

    fn word(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn number(&mut self, span: Span) -> Result<Number, CompileError> {
        let mut s = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
            } else if c == '.' && !is_float {
                is_float = true;
                s.push(c);
            } else if (c == 'e' || c == 'E') && !s.contains(['e', 'E']) {
                is_float = true;
                s.push(c);
                self.bump();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    s.push(sign);
                    self.bump();
                }
                continue;
            } else {
                break;
            }
            self.bump();
        }

        if !is_float && let Ok(i) = s.parse::<i64>() {
            return Ok(Number::from(i));
        }
        s.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| Self::error(span, format!("invalid number '{s}'")))
    }

    fn string(&mut self, span: Span) -> Result<String, CompileError> {
        self.bump();
        let mut s = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(Self::error(span, "unterminated string"));
            };
            match c {
                '"' => return Ok(s),
                '\n' => return Err(Self::error(span, "unterminated string")),
                '\\' => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('u') => self.unicode_escape(span)?,
                        Some(other) => {
                            return Err(Self::error(span, format!("unknown escape '\\{other}'")));
                        }
                        None => return Err(Self::error(span, "unterminated string")),
                    };
                    s.push(escaped);
                }
                other => s.push(other),
            }
        }
    }

    fn unicode_escape(&mut self, span: Span) -> Result<char, CompileError> {
        let mut hex = String::new();
        for _ in 0..4 {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(Self::error(span, "invalid \\u escape")),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| Self::error(span, "invalid \\u escape"))
    }

    fn raw_string(&mut self, span: Span) -> Result<String, CompileError> {
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('`') => return Ok(s),
                Some(c) => s.push(c),
                None => return Err(Self::error(span, "unterminated raw string")),
            }
        }
    }
}
