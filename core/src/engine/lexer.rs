use std::fmt;

use super::SyntaxError;
use crate::text::{is_ident_continue, is_ident_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePart {
    /// `` `text` `` without substitutions.
    Full,
    /// `` `text${ ``
    Head,
    /// `}text${`
    Middle,
    /// `` }text` ``
    Tail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,      // (
    RParen,      // )
    LBrace,      // {
    RBrace,      // }
    LBracket,    // [
    RBracket,    // ]
    Dot,         // .
    OptionalDot, // ?.
    Ellipsis,    // ...
    Semicolon,   // ;
    Comma,       // ,
    Colon,       // :
    Question,    // ?
    Arrow,       // =>
    Assign,      // =
    Increment,   // ++
    Decrement,   // --
    /// `+=`, `??=`, `>>>=` and friends.
    CompoundAssign(&'static str),
    /// Unary and binary operators.
    Op(&'static str),
    Number,
    Str,
    Regex,
    Template(TemplatePart),
    /// Identifiers and keywords; the parser tells them apart.
    Id(String),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Dot => ".",
            Token::OptionalDot => "?.",
            Token::Ellipsis => "...",
            Token::Semicolon => ";",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Question => "?",
            Token::Arrow => "=>",
            Token::Assign => "=",
            Token::Increment => "++",
            Token::Decrement => "--",
            Token::CompoundAssign(op) | Token::Op(op) => *op,
            Token::Number => "number",
            Token::Str => "string",
            Token::Regex => "regular expression",
            Token::Template(_) => "template literal",
            Token::Id(name) => name.as_str(),
            Token::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// A token with its 1-based start position.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
    /// A line terminator separates this token from the previous one.
    pub newline_before: bool,
}

/// Longest operators first so greedy matching picks `>>>=` over `>>`.
const OPERATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==", "!=", "<=", ">=", "&&",
    "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**", "<<", ">>", "{", "}", "(",
    ")", "[", "]", ";", ",", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".",
];

/// Keywords after which a `/` starts a regular expression rather than a division.
const REGEX_AFTER_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
];

fn operator_token(op: &'static str) -> Token {
    match op {
        "(" => Token::LParen,
        ")" => Token::RParen,
        "{" => Token::LBrace,
        "}" => Token::RBrace,
        "[" => Token::LBracket,
        "]" => Token::RBracket,
        "." => Token::Dot,
        "?." => Token::OptionalDot,
        "..." => Token::Ellipsis,
        ";" => Token::Semicolon,
        "," => Token::Comma,
        ":" => Token::Colon,
        "?" => Token::Question,
        "=>" => Token::Arrow,
        "=" => Token::Assign,
        "++" => Token::Increment,
        "--" => Token::Decrement,
        "+=" | "-=" | "*=" | "/=" | "%=" | "**=" | "<<=" | ">>=" | ">>>=" | "&=" | "|=" | "^=" | "&&=" | "||="
        | "??=" => Token::CompoundAssign(op),
        _ => Token::Op(op),
    }
}

/// [chars] and [idx] locate errors; line and column track the cursor.
pub struct Tokenizer {
    chars: Vec<char>,
    idx: usize,
    line: u32,
    column: u32,
    tokens: Vec<Spanned>,
    /// One entry per open `{`; `true` when it opened a template substitution.
    braces: Vec<bool>,
    newline_before: bool,
}

impl Tokenizer {
    pub fn tokenize(source: &str) -> Result<Vec<Spanned>, SyntaxError> {
        let mut t = Tokenizer {
            chars: source.chars().collect(),
            idx: 0,
            line: 1,
            column: 1,
            tokens: Vec::with_capacity(source.len() / 4),
            braces: Vec::new(),
            newline_before: false,
        };
        t.run()?;
        Ok(t.tokens)
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.idx + ahead).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.idx).copied()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error_at(&self, line: u32, column: u32, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, line, column)
    }

    fn push(&mut self, token: Token, line: u32, column: u32) {
        self.tokens.push(Spanned {
            token,
            line,
            column,
            newline_before: self.newline_before,
        });
        self.newline_before = false;
    }

    fn run(&mut self) -> Result<(), SyntaxError> {
        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let Some(c) = self.peek(0) else {
                self.push(Token::Eof, line, column);
                return Ok(());
            };

            if c == '"' || c == '\'' {
                self.string(c)?;
                self.push(Token::Str, line, column);
            } else if c == '`' {
                self.advance();
                let part = self.template_chars(line, column, true)?;
                self.push(Token::Template(part), line, column);
            } else if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) {
                self.number(line, column)?;
                self.push(Token::Number, line, column);
            } else if is_ident_start(c) || c == '\\' {
                let name = self.identifier(line, column)?;
                self.push(Token::Id(name), line, column);
            } else if c == '/' && self.regex_allowed() {
                self.regex(line, column)?;
                self.push(Token::Regex, line, column);
            } else if c == '}' && self.braces.last() == Some(&true) {
                self.braces.pop();
                self.advance();
                let part = self.template_chars(line, column, false)?;
                self.push(Token::Template(part), line, column);
            } else {
                let token = self.operator(line, column)?;
                match token {
                    Token::LBrace => self.braces.push(false),
                    Token::RBrace => {
                        self.braces.pop();
                    }
                    _ => {}
                }
                self.push(token, line, column);
            }
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        while let Some(c) = self.peek(0) {
            if c == '\n' || c == '\u{2028}' || c == '\u{2029}' {
                self.newline_before = true;
                self.advance();
            } else if c.is_whitespace() || c == '\u{feff}' {
                self.advance();
            } else if c == '/' && self.peek(1) == Some('/') {
                while self.peek(0).is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else if c == '/' && self.peek(1) == Some('*') {
                let (line, column) = (self.line, self.column);
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek(0) == Some('/') => {
                            self.advance();
                            break;
                        }
                        Some('\n') => self.newline_before = true,
                        Some(_) => {}
                        None => return Err(self.error_at(line, column, "Unterminated comment")),
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn regex_allowed(&self) -> bool {
        match self.tokens.last().map(|t| &t.token) {
            None => true,
            Some(Token::Id(word)) => REGEX_AFTER_KEYWORDS.contains(&word.as_str()),
            Some(
                Token::Number
                | Token::Str
                | Token::Regex
                | Token::RParen
                | Token::RBracket
                | Token::Increment
                | Token::Decrement
                | Token::Template(TemplatePart::Full | TemplatePart::Tail),
            ) => false,
            Some(_) => true,
        }
    }

    fn string(&mut self, quote: char) -> Result<(), SyntaxError> {
        let (line, column) = (self.line, self.column);
        self.advance();
        loop {
            match self.peek(0) {
                None | Some('\n') => return Err(self.error_at(line, column, "Unterminated string literal")),
                Some('\\') => {
                    self.advance();
                    if self.advance().is_none() {
                        return Err(self.error_at(line, column, "Unterminated string literal"));
                    }
                }
                Some(c) => {
                    self.advance();
                    if c == quote {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Template characters up to the closing backtick or the next `${`.
    fn template_chars(&mut self, line: u32, column: u32, opening: bool) -> Result<TemplatePart, SyntaxError> {
        loop {
            match self.advance() {
                None => return Err(self.error_at(line, column, "Unterminated template literal")),
                Some('\\') => {
                    self.advance();
                }
                Some('`') => {
                    return Ok(if opening { TemplatePart::Full } else { TemplatePart::Tail });
                }
                Some('$') if self.peek(0) == Some('{') => {
                    self.advance();
                    self.braces.push(true);
                    return Ok(if opening { TemplatePart::Head } else { TemplatePart::Middle });
                }
                Some(_) => {}
            }
        }
    }

    fn number(&mut self, line: u32, column: u32) -> Result<(), SyntaxError> {
        let radix_prefix = self.peek(0) == Some('0') && matches!(self.peek(1), Some('x' | 'X' | 'b' | 'B' | 'o' | 'O'));
        if radix_prefix {
            self.advance();
            self.advance();
            let start = self.idx;
            while self.peek(0).is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.advance();
            }
            if self.idx == start {
                return Err(self.error_at(line, column, "Invalid or unexpected token"));
            }
        } else {
            while self.peek(0).is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.advance();
            }
            if self.peek(0) == Some('.') {
                self.advance();
                while self.peek(0).is_some_and(|c| c.is_ascii_digit() || c == '_') {
                    self.advance();
                }
            }
            if matches!(self.peek(0), Some('e' | 'E')) {
                self.advance();
                if matches!(self.peek(0), Some('+' | '-')) {
                    self.advance();
                }
                if !self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    return Err(self.error_at(line, column, "Invalid or unexpected token"));
                }
                while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        if self.peek(0) == Some('n') {
            self.advance();
        }
        if self.peek(0).is_some_and(is_ident_start) {
            return Err(self.error_at(self.line, self.column, "Invalid or unexpected token"));
        }
        Ok(())
    }

    fn identifier(&mut self, line: u32, column: u32) -> Result<String, SyntaxError> {
        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            if c == '\\' {
                if self.peek(1) != Some('u') {
                    return Err(self.error_at(line, column, "Invalid or unexpected token"));
                }
                self.advance();
                self.advance();
                name.push('\\');
                name.push('u');
                continue;
            }
            if !is_ident_continue(c) {
                break;
            }
            name.push(c);
            self.advance();
        }
        Ok(name)
    }

    fn regex(&mut self, line: u32, column: u32) -> Result<(), SyntaxError> {
        self.advance();
        let mut in_class = false;
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(self.error_at(line, column, "Invalid regular expression: missing /"));
                }
                Some('\\') => {
                    self.advance();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        while self.peek(0).is_some_and(is_ident_continue) {
            self.advance();
        }
        Ok(())
    }

    fn operator(&mut self, line: u32, column: u32) -> Result<Token, SyntaxError> {
        for &op in OPERATORS {
            let matches = op.chars().enumerate().all(|(i, c)| self.peek(i) == Some(c));
            if !matches {
                continue;
            }
            // `a?.5:b` is a conditional, not optional chaining.
            if op == "?." && self.peek(2).is_some_and(|c| c.is_ascii_digit()) {
                continue;
            }
            for _ in 0..op.chars().count() {
                self.advance();
            }
            return Ok(operator_token(op));
        }
        Err(self.error_at(line, column, "Invalid or unexpected token"))
    }
}
