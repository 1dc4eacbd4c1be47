//! Tokenizer for sieve queries
//!
//! Splits the source into a flat list of positioned tokens that tile the input.
//! Whitespace is kept as `Space` tokens; the parser strips them.

use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

use crate::position::{Position, Span, SyntaxError, SyntaxErrorKind};

type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Minus,
    Percent,
    Dollar,
    Equals,
    LParen,
    RParen,
}

impl Symbol {
    pub fn as_char(self) -> char {
        match self {
            Symbol::Minus => '-',
            Symbol::Percent => '%',
            Symbol::Dollar => '$',
            Symbol::Equals => '=',
            Symbol::LParen => '(',
            Symbol::RParen => ')',
        }
    }
}

/// Characters that always form a single-char `Symbol` token
pub const SYMBOLS: [char; 6] = ['-', '%', '$', '=', '(', ')'];

pub fn is_symbol(c: char) -> bool {
    SYMBOLS.contains(&c)
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '/'
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Symbol(Symbol),
    /// `/`-delimited word sequence, slashes included
    Path(String),
    Space,
    /// Unescaped content, plus the quote char if the value was quoted
    Value { content: String, quote: Option<char> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: Span,
    /// Raw source text of the token
    pub text: &'a str,
}

impl Token<'_> {
    pub fn is_space(&self) -> bool {
        matches!(self.kind, TokenKind::Space)
    }

    /// Short human description used in error messages
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Symbol(sym) => format!("'{}'", sym.as_char()),
            TokenKind::Path(path) => format!("path '{path}'"),
            TokenKind::Space => "whitespace".to_string(),
            TokenKind::Value { content, .. } => format!("'{content}'"),
        }
    }
}

/// Tokenize a query string
///
/// Fails at the first character that cannot start any token.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, SyntaxError> {
    let mut rest = source;
    let mut pos = Position::START;
    let mut tokens = Vec::new();

    while !rest.is_empty() {
        let start = source.len() - rest.len();
        let kind = match token_kind.parse_next(&mut rest) {
            Ok(kind) => kind,
            Err(_) => {
                let ch = source[start..].chars().next().unwrap_or_default();
                return Err(SyntaxError::at(
                    SyntaxErrorKind::UnexpectedCharacter,
                    format!("unexpected character {ch:?}"),
                    source,
                    pos,
                ));
            }
        };
        let end = source.len() - rest.len();
        let text = &source[start..end];
        let end_pos = pos.advance(text);
        tokens.push(Token {
            kind,
            span: Span {
                start: pos,
                end: end_pos,
            },
            text,
        });
        pos = end_pos;
    }

    log::trace!("tokenized {} bytes into {} tokens", source.len(), tokens.len());
    Ok(tokens)
}

fn token_kind(input: &mut &str) -> PResult<TokenKind> {
    alt((
        space.value(TokenKind::Space),
        symbol.map(TokenKind::Symbol),
        path.map(|p: &str| TokenKind::Path(p.to_string())),
        quoted_value,
        bare_value,
    ))
    .parse_next(input)
}

fn space<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., is_space).parse_next(input)
}

fn symbol(input: &mut &str) -> PResult<Symbol> {
    alt((
        '-'.value(Symbol::Minus),
        '%'.value(Symbol::Percent),
        '$'.value(Symbol::Dollar),
        '='.value(Symbol::Equals),
        '('.value(Symbol::LParen),
        ')'.value(Symbol::RParen),
    ))
    .parse_next(input)
}

fn path<'a>(input: &mut &'a str) -> PResult<&'a str> {
    ('/', take_while(0.., is_path_char)).take().parse_next(input)
}

fn quote_mark(input: &mut &str) -> PResult<char> {
    one_of(['"', '\'']).parse_next(input)
}

/// Quoted value; an unterminated quote runs to end of input
fn quoted_value(input: &mut &str) -> PResult<TokenKind> {
    let quote = quote_mark(input)?;

    let mut escaped = false;
    let mut close = None;
    for (idx, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            close = Some(idx);
            break;
        }
    }

    let raw = match close {
        Some(idx) => {
            let raw = &input[..idx];
            *input = &input[idx + quote.len_utf8()..];
            raw
        }
        None => {
            log::debug!("unterminated {quote} quote, reading to end of input");
            let raw = *input;
            *input = "";
            raw
        }
    };

    Ok(TokenKind::Value {
        content: unescape(raw, quote),
        quote: Some(quote),
    })
}

fn bare_value(input: &mut &str) -> PResult<TokenKind> {
    take_till(1.., |c: char| c.is_whitespace() || is_symbol(c))
        .map(|s: &str| TokenKind::Value {
            content: s.to_string(),
            quote: None,
        })
        .parse_next(input)
}

/// Collapse `\<quote>` to `<quote>`; other backslashes are kept
fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&quote) {
            out.push(quote);
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_space())
            .map(|t| t.kind)
            .collect()
    }

    fn values(source: &str) -> Vec<String> {
        kinds(source)
            .into_iter()
            .filter_map(|k| match k {
                TokenKind::Value { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_source_has_no_tokens() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn quoting_and_escapes() {
        let source = r#"aaa bbb ccc "aa aa" 'bb bb' "aa \" bb" 'cc \' cc' "dd ' dd" 'ee " ee' "ff \n ff""#;
        assert_eq!(
            values(source),
            vec![
                "aaa",
                "bbb",
                "ccc",
                "aa aa",
                "bb bb",
                "aa \" bb",
                "cc ' cc",
                "dd ' dd",
                "ee \" ee",
                "ff \\n ff",
            ]
        );
    }

    #[test]
    fn quote_char_is_recorded() {
        let kinds = kinds(r#"a "b" 'c'"#);
        let quotes: Vec<Option<char>> = kinds
            .into_iter()
            .map(|k| match k {
                TokenKind::Value { quote, .. } => quote,
                other => panic!("unexpected token {other:?}"),
            })
            .collect();
        assert_eq!(quotes, vec![None, Some('"'), Some('\'')]);
    }

    #[test]
    fn path_equals_quoted_path() {
        assert_eq!(
            kinds(r#"/a/b/c/d="/a/b/c/d""#),
            vec![
                TokenKind::Path("/a/b/c/d".into()),
                TokenKind::Symbol(Symbol::Equals),
                TokenKind::Value {
                    content: "/a/b/c/d".into(),
                    quote: Some('"')
                },
            ]
        );
    }

    #[test]
    fn lone_path_is_single_token() {
        assert_eq!(kinds("/a/b/c/d"), vec![TokenKind::Path("/a/b/c/d".into())]);
    }

    #[test]
    fn path_stops_at_non_word_char() {
        assert_eq!(
            kinds("/a/b.c"),
            vec![
                TokenKind::Path("/a/b".into()),
                TokenKind::Value {
                    content: ".c".into(),
                    quote: None
                },
            ]
        );
    }

    #[test]
    fn symbols_split_bare_values() {
        assert_eq!(
            kinds("a-and(b)"),
            vec![
                TokenKind::Value {
                    content: "a".into(),
                    quote: None
                },
                TokenKind::Symbol(Symbol::Minus),
                TokenKind::Value {
                    content: "and".into(),
                    quote: None
                },
                TokenKind::Symbol(Symbol::LParen),
                TokenKind::Value {
                    content: "b".into(),
                    quote: None
                },
                TokenKind::Symbol(Symbol::RParen),
            ]
        );
    }

    #[test]
    fn unterminated_quote_reads_to_end() {
        assert_eq!(values(r#"a "b c"#), vec!["a", "b c"]);
    }

    #[test]
    fn tokens_tile_the_input() {
        let source = "a -and\n(/x/y='z w' $some(%f(k=v)))";
        let tokens = tokenize(source).unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(rebuilt, source);
        for pair in tokens.windows(2) {
            assert_eq!(pair[0].span.end, pair[1].span.start);
        }
        assert_eq!(tokens.last().unwrap().span.end.offset, source.len());
    }

    #[test]
    fn positions_track_lines() {
        let tokens = tokenize("a\n  b").unwrap();
        let b = tokens.last().unwrap();
        assert_eq!(b.span.start.row, 2);
        assert_eq!(b.span.start.col, 3);
        assert_eq!(b.span.start.offset, 4);
    }

    #[test]
    fn unrecognized_character_is_positioned() {
        let err = tokenize("ab \u{000C}cd").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedCharacter);
        let pos = err.position.unwrap();
        assert_eq!(pos.offset, 3);
        assert_eq!(pos.col, 4);
    }
}
