//! Recursive-descent recogniser for DoseScript. It builds no tree: a successful parse means
//! the text compiles, the first failure is reported with its position.

use super::SyntaxError;
use super::lexer::{Spanned, TemplatePart, Token};

/// Words that can never name a binding.
const RESERVED: &[&str] = &[
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "new",
    "null",
    "return",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
];

/// What an expression can be the target of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Identifier or member access.
    Simple,
    /// Object or array literal, assignable through destructuring.
    Pattern,
    Other,
}

type PResult<T> = Result<T, SyntaxError>;

/// Deepest statement or expression nesting accepted before giving up.
const MAX_NESTING: usize = 256;

pub struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    /// Inside a `for (…)` head, where `in` ends the initializer.
    no_in: bool,
    depth: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Spanned]) -> Self {
        Self {
            tokens,
            pos: 0,
            no_in: false,
            depth: 0,
        }
    }

    pub fn parse_program(&mut self) -> PResult<()> {
        while !self.at_eof() {
            self.statement()?;
        }
        Ok(())
    }

    // ----- cursor helpers -----

    fn current(&self) -> &'t Spanned {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self) -> &'t Token {
        &self.current().token
    }

    fn peek_at(&self, ahead: usize) -> Option<&'t Spanned> {
        self.tokens.get(self.pos + ahead)
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> PResult<()> {
        if self.eat(token) { Ok(()) } else { Err(self.unexpected()) }
    }

    fn is_id(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Id(name) if name == word)
    }

    fn eat_id(&mut self, word: &str) -> bool {
        if self.is_id(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn is_binding_name(&self) -> bool {
        matches!(self.peek(), Token::Id(name) if !RESERVED.contains(&name.as_str()))
    }

    fn unexpected(&self) -> SyntaxError {
        let current = self.current();
        let message = match &current.token {
            Token::Eof => "Unexpected end of input".to_string(),
            Token::Str => "Unexpected string".to_string(),
            Token::Number => "Unexpected number".to_string(),
            Token::Template(_) => "Unexpected template string".to_string(),
            token => format!("Unexpected token '{token}'"),
        };
        SyntaxError::new(message, current.line, current.column)
    }

    fn error_here(&self, message: &str) -> SyntaxError {
        let current = self.current();
        SyntaxError::new(message, current.line, current.column)
    }

    /// Runs `parse` one level deeper, failing instead of exhausting the stack.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here("Nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Automatic semicolon insertion: a `;`, a `}`, the end of input or a line break ends a statement.
    fn semicolon(&mut self) -> PResult<()> {
        if self.eat(&Token::Semicolon) {
            return Ok(());
        }
        if matches!(self.peek(), Token::RBrace | Token::Eof) || self.current().newline_before {
            return Ok(());
        }
        Err(self.unexpected())
    }

    // ----- statements -----

    fn statement(&mut self) -> PResult<()> {
        self.nested(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> PResult<()> {
        let word = match self.peek() {
            Token::LBrace => return self.block(),
            Token::Semicolon => {
                self.bump();
                return Ok(());
            }
            Token::Id(word) => word.as_str(),
            _ => return self.expression_statement(),
        };

        match word {
            "var" | "const" => {
                self.bump();
                self.declarations(word == "const")?;
                self.semicolon()
            }
            "let" if self.peek_at(1).is_some_and(|t| matches!(t.token, Token::Id(_) | Token::LBrace | Token::LBracket)) => {
                self.bump();
                self.declarations(false)?;
                self.semicolon()
            }
            "function" => self.function(true),
            "async" if self.async_function_ahead() => {
                self.bump();
                self.function(true)
            }
            "if" => {
                self.bump();
                self.parenthesized()?;
                self.statement()?;
                if self.eat_id("else") {
                    self.statement()?;
                }
                Ok(())
            }
            "for" => self.for_statement(),
            "while" => {
                self.bump();
                self.parenthesized()?;
                self.statement()
            }
            "do" => {
                self.bump();
                self.statement()?;
                if !self.eat_id("while") {
                    return Err(self.unexpected());
                }
                self.parenthesized()?;
                self.eat(&Token::Semicolon);
                Ok(())
            }
            "return" => {
                self.bump();
                if !self.statement_ends_here() {
                    self.expression()?;
                }
                self.semicolon()
            }
            "break" | "continue" => {
                self.bump();
                if self.is_binding_name() && !self.current().newline_before {
                    self.bump();
                }
                self.semicolon()
            }
            "throw" => {
                self.bump();
                if self.current().newline_before {
                    return Err(self.error_here("Illegal newline after throw"));
                }
                self.expression()?;
                self.semicolon()
            }
            "try" => self.try_statement(),
            "switch" => self.switch_statement(),
            "debugger" => {
                self.bump();
                self.semicolon()
            }
            _ if self.is_binding_name() && self.peek_at(1).is_some_and(|t| t.token == Token::Colon) => {
                self.bump();
                self.bump();
                self.statement()
            }
            _ => self.expression_statement(),
        }
    }

    fn statement_ends_here(&self) -> bool {
        matches!(self.peek(), Token::Semicolon | Token::RBrace | Token::Eof) || self.current().newline_before
    }

    fn async_function_ahead(&self) -> bool {
        self.peek_at(1)
            .is_some_and(|t| matches!(&t.token, Token::Id(w) if w == "function") && !t.newline_before)
    }

    fn expression_statement(&mut self) -> PResult<()> {
        self.expression()?;
        self.semicolon()
    }

    fn block(&mut self) -> PResult<()> {
        self.expect(&Token::LBrace)?;
        while !self.eat(&Token::RBrace) {
            if self.at_eof() {
                return Err(self.unexpected());
            }
            self.statement()?;
        }
        Ok(())
    }

    fn parenthesized(&mut self) -> PResult<()> {
        self.expect(&Token::LParen)?;
        self.expression()?;
        self.expect(&Token::RParen)
    }

    fn declarations(&mut self, constant: bool) -> PResult<()> {
        loop {
            self.binding_target()?;
            if self.eat(&Token::Assign) {
                self.assignment()?;
            } else if constant && !self.no_in {
                return Err(self.error_here("Missing initializer in const declaration"));
            }
            if !self.eat(&Token::Comma) {
                return Ok(());
            }
        }
    }

    fn for_statement(&mut self) -> PResult<()> {
        self.bump();
        self.eat_id("await");
        self.expect(&Token::LParen)?;

        let saved = self.no_in;
        self.no_in = true;
        let head = self.for_head();
        self.no_in = saved;

        if head? {
            if !self.eat(&Token::Semicolon) {
                return Err(self.unexpected());
            }
            if self.peek() != &Token::Semicolon {
                self.expression()?;
            }
            self.expect(&Token::Semicolon)?;
            if self.peek() != &Token::RParen {
                self.expression()?;
            }
        }
        self.expect(&Token::RParen)?;
        self.statement()
    }

    /// Parses the part of a `for (…)` head before the first `;`. Returns `false` when the head
    /// turned out to be a complete `in`/`of` clause.
    fn for_head(&mut self) -> PResult<bool> {
        if self.peek() == &Token::Semicolon {
            return Ok(true);
        }
        if self.is_id("var") || self.is_id("let") || self.is_id("const") {
            self.bump();
            self.binding_target()?;
            if self.eat_id("of") || self.eat_id("in") {
                self.no_in = false;
                self.assignment()?;
                return Ok(false);
            }
            if self.eat(&Token::Assign) {
                self.assignment()?;
            }
            while self.eat(&Token::Comma) {
                self.binding_target()?;
                if self.eat(&Token::Assign) {
                    self.assignment()?;
                }
            }
            return Ok(true);
        }

        self.expression()?;
        if self.eat_id("of") || self.eat_id("in") {
            self.no_in = false;
            self.assignment()?;
            return Ok(false);
        }
        Ok(true)
    }

    fn try_statement(&mut self) -> PResult<()> {
        self.bump();
        self.block()?;
        let mut handled = false;
        if self.eat_id("catch") {
            if self.eat(&Token::LParen) {
                self.binding_target()?;
                self.expect(&Token::RParen)?;
            }
            self.block()?;
            handled = true;
        }
        if self.eat_id("finally") {
            self.block()?;
            handled = true;
        }
        if !handled {
            return Err(self.error_here("Missing catch or finally after try"));
        }
        Ok(())
    }

    fn switch_statement(&mut self) -> PResult<()> {
        self.bump();
        self.parenthesized()?;
        self.expect(&Token::LBrace)?;
        loop {
            if self.eat(&Token::RBrace) {
                return Ok(());
            }
            if self.eat_id("case") {
                self.expression()?;
                self.expect(&Token::Colon)?;
            } else if self.eat_id("default") {
                self.expect(&Token::Colon)?;
            } else if self.at_eof() {
                return Err(self.unexpected());
            } else {
                self.statement()?;
            }
        }
    }

    fn function(&mut self, declaration: bool) -> PResult<()> {
        self.bump();
        self.eat(&Token::Op("*"));
        if self.is_binding_name() {
            self.bump();
        } else if declaration {
            return Err(self.error_here("Function statements require a function name"));
        }
        self.parameters()?;
        self.block()
    }

    fn parameters(&mut self) -> PResult<()> {
        self.expect(&Token::LParen)?;
        while self.peek() != &Token::RParen {
            if self.eat(&Token::Ellipsis) {
                self.binding_target()?;
                break;
            }
            self.binding_target()?;
            if self.eat(&Token::Assign) {
                self.assignment()?;
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)
    }

    fn binding_target(&mut self) -> PResult<()> {
        self.nested(Self::binding_target_inner)
    }

    fn binding_target_inner(&mut self) -> PResult<()> {
        match self.peek() {
            Token::LBrace => {
                self.bump();
                while self.peek() != &Token::RBrace {
                    if self.eat(&Token::Ellipsis) {
                        self.binding_target()?;
                    } else {
                        let shorthand = self.is_binding_name();
                        self.property_key()?;
                        if self.eat(&Token::Colon) {
                            self.binding_target()?;
                        } else if !shorthand {
                            return Err(self.unexpected());
                        }
                        if self.eat(&Token::Assign) {
                            self.assignment()?;
                        }
                    }
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(&Token::RBrace)
            }
            Token::LBracket => {
                self.bump();
                while self.peek() != &Token::RBracket {
                    if self.eat(&Token::Comma) {
                        continue;
                    }
                    if self.eat(&Token::Ellipsis) {
                        self.binding_target()?;
                    } else {
                        self.binding_target()?;
                        if self.eat(&Token::Assign) {
                            self.assignment()?;
                        }
                    }
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(&Token::RBracket)
            }
            _ if self.is_binding_name() => {
                self.bump();
                Ok(())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn property_key(&mut self) -> PResult<()> {
        match self.peek() {
            Token::Id(_) | Token::Str | Token::Number => {
                self.bump();
                Ok(())
            }
            Token::LBracket => {
                self.bump();
                self.assignment()?;
                self.expect(&Token::RBracket)
            }
            _ => Err(self.unexpected()),
        }
    }

    // ----- expressions -----

    fn expression(&mut self) -> PResult<()> {
        self.assignment()?;
        while self.eat(&Token::Comma) {
            self.assignment()?;
        }
        Ok(())
    }

    fn assignment(&mut self) -> PResult<Shape> {
        self.nested(Self::assignment_inner)
    }

    fn assignment_inner(&mut self) -> PResult<Shape> {
        if self.arrow_ahead() {
            self.arrow_function()?;
            return Ok(Shape::Other);
        }

        let shape = self.conditional()?;
        match self.peek() {
            Token::Assign if shape != Shape::Other => {
                self.bump();
                self.assignment()?;
                Ok(Shape::Other)
            }
            Token::CompoundAssign(_) if shape == Shape::Simple => {
                self.bump();
                self.assignment()?;
                Ok(Shape::Other)
            }
            Token::Assign | Token::CompoundAssign(_) => Err(self.error_here("Invalid left-hand side in assignment")),
            _ => Ok(shape),
        }
    }

    fn arrow_ahead(&self) -> bool {
        let mut i = self.pos;
        if matches!(&self.tokens.get(i).map(|t| &t.token), Some(Token::Id(w)) if w == "async")
            && self.tokens.get(i + 1).is_some_and(|t| !t.newline_before && matches!(t.token, Token::Id(_) | Token::LParen))
        {
            i += 1;
        }
        match self.tokens.get(i).map(|t| &t.token) {
            Some(Token::Id(name)) if !RESERVED.contains(&name.as_str()) => self.is_arrow_at(i + 1),
            Some(Token::LParen) => {
                let mut depth = 0usize;
                for (j, t) in self.tokens.iter().enumerate().skip(i) {
                    match t.token {
                        Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                        Token::RParen | Token::RBracket | Token::RBrace => {
                            depth = depth.saturating_sub(1);
                            if depth == 0 {
                                return self.is_arrow_at(j + 1);
                            }
                        }
                        Token::Eof => return false,
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn is_arrow_at(&self, index: usize) -> bool {
        self.tokens
            .get(index)
            .is_some_and(|t| t.token == Token::Arrow && !t.newline_before)
    }

    fn arrow_function(&mut self) -> PResult<()> {
        self.eat_id("async");
        if self.is_binding_name() {
            self.bump();
        } else {
            self.parameters()?;
        }
        self.expect(&Token::Arrow)?;
        if self.peek() == &Token::LBrace {
            return self.block();
        }
        let saved = self.no_in;
        self.no_in = false;
        let body = self.assignment();
        self.no_in = saved;
        body.map(|_| ())
    }

    fn conditional(&mut self) -> PResult<Shape> {
        let shape = self.binary(1)?;
        if !self.eat(&Token::Question) {
            return Ok(shape);
        }
        let saved = self.no_in;
        self.no_in = false;
        let consequent = self.assignment();
        self.no_in = saved;
        consequent?;
        self.expect(&Token::Colon)?;
        self.assignment()?;
        Ok(Shape::Other)
    }

    fn binary_precedence(&self) -> Option<u8> {
        let prec = match self.peek() {
            Token::Op(op) => match *op {
                "??" => 1,
                "||" => 2,
                "&&" => 3,
                "|" => 4,
                "^" => 5,
                "&" => 6,
                "==" | "!=" | "===" | "!==" => 7,
                "<" | ">" | "<=" | ">=" => 8,
                "<<" | ">>" | ">>>" => 9,
                "+" | "-" => 10,
                "*" | "/" | "%" => 11,
                "**" => 12,
                _ => return None,
            },
            Token::Id(word) if word == "instanceof" => 8,
            Token::Id(word) if word == "in" && !self.no_in => 8,
            _ => return None,
        };
        Some(prec)
    }

    fn binary(&mut self, min: u8) -> PResult<Shape> {
        let mut shape = self.unary()?;
        while let Some(prec) = self.binary_precedence() {
            if prec < min {
                break;
            }
            self.bump();
            // `**` is right-associative.
            let next = if prec == 12 { prec } else { prec + 1 };
            self.binary(next)?;
            shape = Shape::Other;
        }
        Ok(shape)
    }

    fn unary(&mut self) -> PResult<Shape> {
        self.nested(Self::unary_inner)
    }

    fn unary_inner(&mut self) -> PResult<Shape> {
        match self.peek() {
            Token::Op("!" | "~" | "+" | "-") => {
                self.bump();
                self.unary()?;
                Ok(Shape::Other)
            }
            Token::Id(word) if matches!(word.as_str(), "typeof" | "void" | "delete" | "await") => {
                self.bump();
                self.unary()?;
                Ok(Shape::Other)
            }
            Token::Increment | Token::Decrement => {
                self.bump();
                if self.unary()? != Shape::Simple {
                    return Err(self.error_here("Invalid left-hand side expression in prefix operation"));
                }
                Ok(Shape::Other)
            }
            _ => {
                let shape = self.call_member()?;
                if matches!(self.peek(), Token::Increment | Token::Decrement) && !self.current().newline_before {
                    if shape != Shape::Simple {
                        return Err(self.error_here("Invalid left-hand side expression in postfix operation"));
                    }
                    self.bump();
                    return Ok(Shape::Other);
                }
                Ok(shape)
            }
        }
    }

    fn call_member(&mut self) -> PResult<Shape> {
        let mut shape = if self.is_id("new") {
            self.new_expression()?
        } else {
            self.primary()?
        };

        loop {
            match self.peek() {
                Token::Dot => {
                    self.bump();
                    if !matches!(self.peek(), Token::Id(_)) {
                        return Err(self.unexpected());
                    }
                    self.bump();
                    shape = Shape::Simple;
                }
                Token::OptionalDot => {
                    self.bump();
                    match self.peek() {
                        Token::LParen => self.arguments()?,
                        Token::LBracket => {
                            self.bump();
                            self.expression()?;
                            self.expect(&Token::RBracket)?;
                        }
                        Token::Id(_) => self.bump(),
                        _ => return Err(self.unexpected()),
                    }
                    shape = Shape::Other;
                }
                Token::LBracket => {
                    self.bump();
                    let saved = self.no_in;
                    self.no_in = false;
                    let index = self.expression();
                    self.no_in = saved;
                    index?;
                    self.expect(&Token::RBracket)?;
                    shape = Shape::Simple;
                }
                Token::LParen => {
                    self.arguments()?;
                    shape = Shape::Other;
                }
                Token::Template(TemplatePart::Full | TemplatePart::Head) => {
                    self.template()?;
                    shape = Shape::Other;
                }
                _ => return Ok(shape),
            }
        }
    }

    fn new_expression(&mut self) -> PResult<Shape> {
        self.nested(Self::new_expression_inner)
    }

    fn new_expression_inner(&mut self) -> PResult<Shape> {
        self.bump();
        if self.eat(&Token::Dot) {
            if !self.eat_id("target") {
                return Err(self.unexpected());
            }
            return Ok(Shape::Other);
        }
        if self.is_id("new") {
            self.new_expression()?;
        } else {
            self.primary()?;
        }
        loop {
            match self.peek() {
                Token::Dot => {
                    self.bump();
                    if !matches!(self.peek(), Token::Id(_)) {
                        return Err(self.unexpected());
                    }
                    self.bump();
                }
                Token::LBracket => {
                    self.bump();
                    self.expression()?;
                    self.expect(&Token::RBracket)?;
                }
                _ => break,
            }
        }
        if self.peek() == &Token::LParen {
            self.arguments()?;
        }
        Ok(Shape::Other)
    }

    fn arguments(&mut self) -> PResult<()> {
        self.expect(&Token::LParen)?;
        let saved = self.no_in;
        self.no_in = false;
        let result = self.argument_list();
        self.no_in = saved;
        result?;
        self.expect(&Token::RParen)
    }

    fn argument_list(&mut self) -> PResult<()> {
        while self.peek() != &Token::RParen {
            self.eat(&Token::Ellipsis);
            self.assignment()?;
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(())
    }

    fn template(&mut self) -> PResult<()> {
        let head = self.peek().clone();
        self.bump();
        if head == Token::Template(TemplatePart::Full) {
            return Ok(());
        }
        let saved = self.no_in;
        self.no_in = false;
        let result = self.template_substitutions();
        self.no_in = saved;
        result
    }

    fn template_substitutions(&mut self) -> PResult<()> {
        loop {
            self.expression()?;
            match self.peek() {
                Token::Template(TemplatePart::Middle) => self.bump(),
                Token::Template(TemplatePart::Tail) => {
                    self.bump();
                    return Ok(());
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn primary(&mut self) -> PResult<Shape> {
        match self.peek() {
            Token::Id(word) => match word.as_str() {
                "function" => {
                    self.function(false)?;
                    Ok(Shape::Other)
                }
                "async" if self.async_function_ahead() => {
                    self.bump();
                    self.function(false)?;
                    Ok(Shape::Other)
                }
                "this" | "null" | "true" | "false" => {
                    self.bump();
                    Ok(Shape::Other)
                }
                w if RESERVED.contains(&w) => Err(self.unexpected()),
                _ => {
                    self.bump();
                    Ok(Shape::Simple)
                }
            },
            Token::Number | Token::Str | Token::Regex => {
                self.bump();
                Ok(Shape::Other)
            }
            Token::Template(TemplatePart::Full | TemplatePart::Head) => {
                self.template()?;
                Ok(Shape::Other)
            }
            Token::LParen => {
                self.bump();
                let saved = self.no_in;
                self.no_in = false;
                let inner = self.parenthesized_inner();
                self.no_in = saved;
                let shape = inner?;
                self.expect(&Token::RParen)?;
                Ok(if shape == Shape::Simple { Shape::Simple } else { Shape::Other })
            }
            Token::LBracket => {
                self.array_literal()?;
                Ok(Shape::Pattern)
            }
            Token::LBrace => {
                self.object_literal()?;
                Ok(Shape::Pattern)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parenthesized_inner(&mut self) -> PResult<Shape> {
        let shape = self.assignment()?;
        if self.peek() != &Token::Comma {
            return Ok(shape);
        }
        while self.eat(&Token::Comma) {
            self.assignment()?;
        }
        Ok(Shape::Other)
    }

    fn array_literal(&mut self) -> PResult<()> {
        self.bump();
        let saved = self.no_in;
        self.no_in = false;
        let result = self.array_elements();
        self.no_in = saved;
        result?;
        self.expect(&Token::RBracket)
    }

    fn array_elements(&mut self) -> PResult<()> {
        while self.peek() != &Token::RBracket {
            if self.eat(&Token::Comma) {
                continue;
            }
            self.eat(&Token::Ellipsis);
            self.assignment()?;
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(())
    }

    fn object_literal(&mut self) -> PResult<()> {
        self.bump();
        let saved = self.no_in;
        self.no_in = false;
        let result = self.object_members();
        self.no_in = saved;
        result?;
        self.expect(&Token::RBrace)
    }

    fn object_members(&mut self) -> PResult<()> {
        while self.peek() != &Token::RBrace {
            if self.eat(&Token::Ellipsis) {
                self.assignment()?;
            } else {
                self.object_member()?;
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(())
    }

    fn object_member(&mut self) -> PResult<()> {
        let modifier = (self.is_id("get") || self.is_id("set") || self.is_id("async"))
            && self.peek_at(1).is_some_and(|t| {
                !matches!(
                    t.token,
                    Token::Colon | Token::Comma | Token::LParen | Token::RBrace | Token::Assign
                )
            });
        if modifier {
            self.bump();
        }
        self.eat(&Token::Op("*"));

        let shorthand = self.is_binding_name();
        self.property_key()?;
        if self.eat(&Token::Colon) {
            self.assignment()?;
            return Ok(());
        }
        if self.peek() == &Token::LParen {
            self.parameters()?;
            return self.block();
        }
        if !shorthand {
            return Err(self.unexpected());
        }
        // `{ a = 1 }` is only valid as a destructuring target; accepted here for `({a = 1} = o)`.
        if self.eat(&Token::Assign) {
            self.assignment()?;
        }
        Ok(())
    }
}
