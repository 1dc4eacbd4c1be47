//! Recursive-descent parser for sieve queries
//!
//! Produces the `ast` tree, which `transform` then validates against a
//! vocabulary. Whitespace tokens are dropped before parsing.

use crate::ast::{
    Aggregate, ArgItem, Function, Infix, InfixStep, Path, Property, Term, TermContent, Value,
};
use crate::position::{Position, SyntaxError, SyntaxErrorKind};
use crate::tokenize::{Symbol, Token, TokenKind, tokenize};

type PResult<T> = Result<T, SyntaxError>;

/// Parse a query into its list of top-level infix expressions
pub fn parse(source: &str) -> PResult<Vec<Infix>> {
    let tokens = tokenize(source)?
        .into_iter()
        .filter(|t| !t.is_space())
        .collect();
    Parser::new(source, tokens).top()
}

/// Token shape used by lookahead patterns
#[derive(Debug, Clone, Copy)]
enum Shape {
    Symbol(Symbol),
    Path,
    Value,
}

impl Shape {
    fn matches(self, token: &Token<'_>) -> bool {
        match (self, &token.kind) {
            (Shape::Symbol(expected), TokenKind::Symbol(found)) => expected == *found,
            (Shape::Path, TokenKind::Path(_)) => true,
            (Shape::Value, TokenKind::Value { .. }) => true,
            _ => false,
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    cursor: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<Token<'a>>) -> Self {
        Self {
            source,
            tokens,
            cursor: 0,
        }
    }

    // ============ Cursor primitives ============

    /// Consume `pattern` if every token at the cursor matches it, otherwise leave
    /// the cursor untouched
    fn match_forward(&mut self, pattern: &[Shape]) -> Option<Vec<Token<'a>>> {
        let end = self.cursor + pattern.len();
        let window = self.tokens.get(self.cursor..end)?;
        if !window.iter().zip(pattern).all(|(token, shape)| shape.matches(token)) {
            return None;
        }
        let matched = window.to_vec();
        self.cursor = end;
        Some(matched)
    }

    /// Run a production that is required at this point
    fn must<T>(
        &mut self,
        expected: &str,
        production: impl FnOnce(&mut Self) -> PResult<Option<T>>,
    ) -> PResult<T> {
        match production(self)? {
            Some(parsed) => Ok(parsed),
            None => Err(self.expected(expected)),
        }
    }

    fn must_close(&mut self) -> PResult<()> {
        self.must("')'", |p| Ok(p.match_forward(&[Shape::Symbol(Symbol::RParen)])))?;
        Ok(())
    }

    fn current_pos(&self) -> Position {
        match self.tokens.get(self.cursor) {
            Some(token) => token.span.start,
            None => self.end_pos(),
        }
    }

    fn end_pos(&self) -> Position {
        Position::locate(self.source, self.source.len())
    }

    fn expected(&self, expected: &str) -> SyntaxError {
        match self.tokens.get(self.cursor) {
            Some(token) => SyntaxError::at(
                SyntaxErrorKind::UnexpectedToken,
                format!("expected {expected}, found {}", token.describe()),
                self.source,
                token.span.start,
            ),
            None => SyntaxError::at(
                SyntaxErrorKind::UnexpectedEnd,
                format!("expected {expected}, found end of input"),
                self.source,
                self.end_pos(),
            ),
        }
    }

    // ============ Grammar ============

    fn top(&mut self) -> PResult<Vec<Infix>> {
        let mut list = Vec::new();
        while let Some(infix) = self.infix()? {
            list.push(infix);
        }
        if let Some(token) = self.tokens.get(self.cursor) {
            return Err(SyntaxError::at(
                SyntaxErrorKind::UnexpectedToken,
                format!("unexpected {}", token.describe()),
                self.source,
                token.span.start,
            ));
        }
        Ok(list)
    }

    fn infix(&mut self) -> PResult<Option<Infix>> {
        let Some(left) = self.term()? else {
            return Ok(None);
        };
        let pos = left.pos;
        let mut rest = Vec::new();
        while let Some(matched) =
            self.match_forward(&[Shape::Symbol(Symbol::Minus), Shape::Value])
        {
            let infix = value(&matched[1]);
            let right = self.must(&format!("a term after '-{}'", infix.content), Self::term)?;
            rest.push(InfixStep { infix, right });
        }
        Ok(Some(Infix { left, rest, pos }))
    }

    fn term(&mut self) -> PResult<Option<Term>> {
        let pos = self.current_pos();
        let content = if self
            .match_forward(&[Shape::Symbol(Symbol::LParen)])
            .is_some()
        {
            let inner = self.must("an expression after '('", Self::infix)?;
            self.must_close()?;
            TermContent::Group(Box::new(inner))
        } else if let Some(aggregate) = self.aggregate()? {
            TermContent::Aggregate(aggregate)
        } else if let Some(function) = self.function()? {
            TermContent::Function(function)
        } else if let Some(property) = self.property() {
            TermContent::Property(property)
        } else if let Some(text) = self.full_text() {
            TermContent::FullText(text)
        } else {
            return Ok(None);
        };
        Ok(Some(Term { content, pos }))
    }

    fn aggregate(&mut self) -> PResult<Option<Aggregate>> {
        let Some(matched) = self.match_forward(&[
            Shape::Symbol(Symbol::Dollar),
            Shape::Value,
            Shape::Symbol(Symbol::LParen),
        ]) else {
            return Ok(None);
        };
        let mut contents = Vec::new();
        while let Some(infix) = self.infix()? {
            contents.push(infix);
        }
        self.must_close()?;
        Ok(Some(Aggregate {
            name: value(&matched[1]),
            contents,
            pos: matched[0].span.start,
        }))
    }

    fn function(&mut self) -> PResult<Option<Function>> {
        let Some(matched) = self.match_forward(&[
            Shape::Symbol(Symbol::Percent),
            Shape::Value,
            Shape::Symbol(Symbol::LParen),
        ]) else {
            return Ok(None);
        };
        let mut args = Vec::new();
        while let Some(arg) =
            self.match_forward(&[Shape::Value, Shape::Symbol(Symbol::Equals), Shape::Value])
        {
            args.push(ArgItem {
                name: value(&arg[0]),
                value: value(&arg[2]),
            });
        }
        self.must_close()?;
        Ok(Some(Function {
            name: value(&matched[1]),
            args,
            pos: matched[0].span.start,
        }))
    }

    fn property(&mut self) -> Option<Property> {
        let matched = self.match_forward(&[
            Shape::Path,
            Shape::Symbol(Symbol::Equals),
            Shape::Value,
        ])?;
        let path = match &matched[0].kind {
            TokenKind::Path(content) => content.clone(),
            _ => matched[0].text.to_string(),
        };
        Some(Property {
            path: Path {
                content: path,
                pos: matched[0].span.start,
            },
            value: value(&matched[2]),
        })
    }

    fn full_text(&mut self) -> Option<Value> {
        let matched = self.match_forward(&[Shape::Value])?;
        Some(value(&matched[0]))
    }
}

fn value(token: &Token<'_>) -> Value {
    let content = match &token.kind {
        TokenKind::Value { content, .. } => content.clone(),
        _ => token.text.to_string(),
    };
    Value {
        content,
        pos: token.span.start,
    }
}
