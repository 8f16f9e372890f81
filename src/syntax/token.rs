use crate::error::{Error, Result};

/// Splits the input into maximal whitespace-separated tokens, with one
/// token of lookahead. Tokens are zero-copy slices of the input text.
///
/// `$( … $)` comments are legal between any two tokens and are skipped
/// here, so consumers never see them. Nested comments are rejected.
pub struct Tokenizer<'a> {
    rest: &'a str,
    next: Option<&'a str>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Result<Tokenizer<'a>> {
        let mut tokenizer = Tokenizer { rest: text, next: None };
        tokenizer.advance()?;
        Ok(tokenizer)
    }

    /// The next token without consuming it; `None` at end of input.
    pub fn peek(&self) -> Option<&'a str> {
        self.next
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Result<&'a str> {
        let token = self
            .next
            .ok_or_else(|| Error::syntax("unexpected end of input"))?;
        self.advance()?;
        Ok(token)
    }

    /// Consumes the next token, which must be exactly `expected`.
    pub fn expect(&mut self, expected: &str) -> Result<()> {
        let token = self.next_token()?;
        if token != expected {
            return Err(Error::syntax(format!(
                "expected \"{}\", found \"{}\"",
                expected, token
            )));
        }
        Ok(())
    }

    fn raw_token(&mut self) -> Option<&'a str> {
        let rest = self.rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (token, rest) = rest.split_at(end);
        self.rest = rest;
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }

    fn advance(&mut self) -> Result<()> {
        loop {
            match self.raw_token() {
                Some("$(") => loop {
                    match self.raw_token() {
                        Some("$)") => break,
                        Some("$(") => return Err(Error::syntax("nested comment")),
                        Some(_) => {}
                        None => return Err(Error::syntax("unterminated comment")),
                    }
                },
                token => {
                    self.next = token;
                    return Ok(());
                }
            }
        }
    }
}
