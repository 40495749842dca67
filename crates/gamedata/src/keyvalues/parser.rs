//! KeyValues text parser

use tracing::{debug, warn};

use super::KeyValues;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    /// Quoted or bare string
    Text(String),
    /// `[$WIN32]` style conditional following a value
    Conditional(String),
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some('\n') => {
                    self.line += 1;
                    self.chars.next();
                }
                Some(c) if c.is_whitespace() => {
                    self.chars.next();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() != Some(&'/') {
                        return;
                    }
                    // line comment
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<(Token, usize)>> {
        self.skip_trivia();
        let line = self.line;
        let Some(c) = self.chars.next() else {
            return Ok(None);
        };

        let token = match c {
            '{' => Token::Open,
            '}' => Token::Close,
            '"' => Token::Text(self.quoted()?),
            '[' => Token::Conditional(self.conditional()?),
            c => Token::Text(self.bare(c)),
        };
        Ok(Some((token, line)))
    }

    fn quoted(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    // Unknown escapes are kept verbatim so that `\x48` pattern
                    // text survives untouched.
                    Some(other) => {
                        out.push('\\');
                        if other == '\n' {
                            self.line += 1;
                        }
                        out.push(other);
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    out.push(c);
                }
            }
        }
    }

    fn conditional(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None | Some('\n') => return Err(self.error("unterminated conditional")),
                Some(']') => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn bare(&mut self, first: char) -> String {
        let mut out = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<(Token, usize)>,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Result<Option<(Token, usize)>> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<Option<&Token>> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref().map(|(token, _)| token))
    }

    /// Parse key/value pairs until a closing brace (`nested`) or end of input
    fn pairs(&mut self, nested: bool) -> Result<Vec<KeyValues>> {
        let mut nodes = Vec::new();

        loop {
            let Some((token, line)) = self.next()? else {
                if nested {
                    return Err(self.lexer.error("unexpected end of input, expected '}'"));
                }
                return Ok(nodes);
            };

            let key = match token {
                Token::Close if nested => return Ok(nodes),
                Token::Close => {
                    return Err(Error::Parse {
                        line,
                        message: "unexpected '}'".to_string(),
                    });
                }
                Token::Open => {
                    return Err(Error::Parse {
                        line,
                        message: "expected key, found '{'".to_string(),
                    });
                }
                Token::Conditional(cond) => {
                    return Err(Error::Parse {
                        line,
                        message: format!("expected key, found conditional [{}]", cond),
                    });
                }
                Token::Text(key) => key,
            };

            if key.eq_ignore_ascii_case("#base") || key.eq_ignore_ascii_case("#include") {
                match self.next()? {
                    Some((Token::Text(file), _)) => {
                        warn!("Ignoring {} \"{}\" at line {}", key, file, line);
                        continue;
                    }
                    _ => {
                        return Err(Error::Parse {
                            line,
                            message: format!("expected file name after {}", key),
                        });
                    }
                }
            }

            let node = match self.next()? {
                Some((Token::Open, _)) => KeyValues::section(key, self.pairs(true)?),
                Some((Token::Text(value), _)) => KeyValues::leaf(key, value),
                Some((Token::Close, l)) | Some((Token::Conditional(_), l)) => {
                    return Err(Error::Parse {
                        line: l,
                        message: format!("expected value for key \"{}\"", key),
                    });
                }
                None => {
                    return Err(Error::Parse {
                        line,
                        message: format!("unexpected end of input after key \"{}\"", key),
                    });
                }
            };

            if matches!(self.peek()?, Some(Token::Conditional(_)))
                && let Some((Token::Conditional(cond), _)) = self.next()?
            {
                debug!("Ignoring conditional [{}] on \"{}\"", cond, node.name());
            }

            nodes.push(node);
        }
    }
}

/// Parse a KeyValues document.
///
/// A document with a single top-level section (the usual `"Games" { ... }`
/// layout) returns that section. Anything else is wrapped in an unnamed root
/// section holding every top-level node.
pub fn parse(text: &str) -> Result<KeyValues> {
    let mut parser = Parser {
        lexer: Lexer::new(text),
        peeked: None,
    };
    let mut nodes = parser.pairs(false)?;

    if nodes.len() == 1 && nodes[0].is_section() {
        return Ok(nodes.remove(0));
    }
    Ok(KeyValues::section("", nodes))
}
