// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::stream::{is_digit, is_hex_digit, is_nmchar, is_nmstart, is_space, Stream};
use crate::{Error, ErrorKind};

// Scratch buffer capacity, counting a trailing terminator byte.
const MAX_TOKEN: usize = 1024;

/// A lexical token.
///
/// Tokens carry no text themselves. The payload of the most recent token
/// is held by the tokenizer and stays valid until the next
/// [`next_token()`] call.
///
/// [`next_token()`]: struct.Tokenizer.html#method.next_token
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Token {
    /// An identifier: a tag name, a property name or a keyword value.
    Keyword,
    /// A unitless number, like `1.5` or `-3`.
    Number,
    /// A number with a unit suffix, like `12pt`.
    Length,
    /// A number with a `%` suffix, like `50%`.
    Percent,
    /// A quoted string, with escapes already resolved.
    String,
    /// A hex color, canonicalized to six lowercase hex digits.
    Color,
    /// A `url(...)` reference. The payload is not retained.
    Uri,
    /// Any other single byte, like `{`, `:` or `,`.
    Delim(u8),
    /// End of the source data.
    Eof,
}

/// A CSS tokenizer.
///
/// Comments and the legacy `<!--`/`-->` markers are consumed silently.
///
/// # Example
///
/// ```
/// use flowcss::{Token, Tokenizer};
///
/// let mut t = Tokenizer::new("p { margin: 0 }", "doc.css");
/// assert_eq!(t.next_token().unwrap(), Token::Keyword);
/// assert_eq!(t.text(), "p");
/// assert_eq!(t.next_token().unwrap(), Token::Delim(b'{'));
/// ```
pub struct Tokenizer<'a> {
    stream: Stream<'a>,
    file: &'a str,
    scratch: Vec<u8>,
}

impl<'a> Tokenizer<'a> {
    /// Constructs a new `Tokenizer`.
    ///
    /// `file` is only used in diagnostics.
    pub fn new(source: &'a str, file: &'a str) -> Tokenizer<'a> {
        Tokenizer {
            stream: Stream::new(source.as_bytes()),
            file,
            scratch: Vec::new(),
        }
    }

    /// Returns the payload of the most recent token.
    ///
    /// Empty for tokens that have none, like [`Token::Delim`] and
    /// [`Token::Uri`].
    ///
    /// [`Token::Delim`]: enum.Token.html#variant.Delim
    /// [`Token::Uri`]: enum.Token.html#variant.Uri
    pub fn text(&self) -> &str {
        // A completed token always ends the scratch on a UTF-8 boundary.
        std::str::from_utf8(&self.scratch).unwrap()
    }

    /// Returns the current 1-based line.
    pub fn line(&self) -> u32 {
        self.stream.line()
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.file, self.stream.line())
    }

    /// Produces the next token.
    ///
    /// Any lexical error is fatal to the parse.
    pub fn next_token(&mut self) -> Result<Token, Error> {
        self.scratch.clear();

        loop {
            while is_space(self.stream.curr()) {
                self.stream.advance();
            }

            let c = self.stream.curr();
            match c {
                0 => return Ok(Token::Eof),
                b'/' => {
                    self.stream.advance();
                    if self.stream.curr() == b'*' {
                        self.stream.advance();
                        self.skip_comment()?;
                        continue;
                    }
                    return Ok(Token::Delim(b'/'));
                }
                b'<' => {
                    self.stream.advance();
                    if self.stream.curr() == b'!' {
                        self.stream.advance();
                        self.expect_byte(b'-')?;
                        self.expect_byte(b'-')?;
                        continue;
                    }
                    return Ok(Token::Delim(b'<'));
                }
                b'-' => {
                    self.stream.advance();
                    if self.stream.curr() == b'-' {
                        self.stream.advance();
                        self.expect_byte(b'>')?;
                        continue;
                    }
                    if is_digit(self.stream.curr()) {
                        self.push(b'-')?;
                        return self.lex_number();
                    }
                    if is_nmstart(self.stream.curr()) {
                        self.push(b'-')?;
                        let c = self.stream.curr();
                        self.push(c)?;
                        self.stream.advance();
                        return self.lex_keyword();
                    }
                    return Ok(Token::Delim(b'-'));
                }
                b'+' => {
                    self.stream.advance();
                    if is_digit(self.stream.curr()) {
                        return self.lex_number();
                    }
                    return Ok(Token::Delim(b'+'));
                }
                b'.' => {
                    self.stream.advance();
                    if is_digit(self.stream.curr()) {
                        self.push(b'.')?;
                        return self.lex_number();
                    }
                    return Ok(Token::Delim(b'.'));
                }
                b'#' => {
                    self.stream.advance();
                    return self.lex_color();
                }
                b'"' | b'\'' => {
                    self.stream.advance();
                    return self.lex_string(c);
                }
                b'0'..=b'9' => return self.lex_number(),
                b'u' => {
                    self.stream.advance();
                    return self.lex_uri_or_keyword();
                }
                c if is_nmstart(c) => {
                    self.push(c)?;
                    self.stream.advance();
                    return self.lex_keyword();
                }
                c => {
                    self.stream.advance();
                    return Ok(Token::Delim(c));
                }
            }
        }
    }

    fn push(&mut self, c: u8) -> Result<(), Error> {
        if self.scratch.len() + 1 >= MAX_TOKEN {
            return Err(self.error(ErrorKind::TokenTooLong));
        }
        self.scratch.push(c);
        Ok(())
    }

    fn expect_byte(&mut self, c: u8) -> Result<(), Error> {
        if self.stream.curr() != c {
            return Err(self.error(ErrorKind::UnexpectedChar));
        }
        self.stream.advance();
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<(), Error> {
        loop {
            match self.stream.curr() {
                0 => return Err(self.error(ErrorKind::UnterminatedComment)),
                b'*' => {
                    while self.stream.curr() == b'*' {
                        self.stream.advance();
                    }
                    if self.stream.curr() == b'/' {
                        self.stream.advance();
                        return Ok(());
                    }
                }
                _ => self.stream.advance(),
            }
        }
    }

    // TODO: escape sequences in identifiers
    fn lex_keyword(&mut self) -> Result<Token, Error> {
        while is_nmchar(self.stream.curr()) {
            let c = self.stream.curr();
            self.push(c)?;
            self.stream.advance();
        }
        Ok(Token::Keyword)
    }

    fn lex_number(&mut self) -> Result<Token, Error> {
        while is_digit(self.stream.curr()) {
            let c = self.stream.curr();
            self.push(c)?;
            self.stream.advance();
        }
        if self.stream.curr() == b'.' {
            self.push(b'.')?;
            self.stream.advance();
            while is_digit(self.stream.curr()) {
                let c = self.stream.curr();
                self.push(c)?;
                self.stream.advance();
            }
        }
        if self.stream.curr() == b'%' {
            self.push(b'%')?;
            self.stream.advance();
            return Ok(Token::Percent);
        }
        if is_nmstart(self.stream.curr()) {
            let c = self.stream.curr();
            self.push(c)?;
            self.stream.advance();
            while is_nmchar(self.stream.curr()) {
                let c = self.stream.curr();
                self.push(c)?;
                self.stream.advance();
            }
            return Ok(Token::Length);
        }
        Ok(Token::Number)
    }

    fn lex_string(&mut self, quote: u8) -> Result<Token, Error> {
        loop {
            let c = self.stream.curr();
            match c {
                0 => return Err(self.error(ErrorKind::UnterminatedString)),
                b'\\' => {
                    self.stream.advance();
                    match self.stream.curr() {
                        0 => return Err(self.error(ErrorKind::UnterminatedString)),
                        b'n' => {
                            self.push(b'\n')?;
                            self.stream.advance();
                        }
                        b'r' => {
                            self.push(b'\r')?;
                            self.stream.advance();
                        }
                        b'f' => {
                            self.push(b'\x0C')?;
                            self.stream.advance();
                        }
                        // An escaped newline is a line continuation and
                        // produces nothing.
                        b'\n' | b'\x0C' => self.stream.advance(),
                        b'\r' => {
                            self.stream.advance();
                            if self.stream.curr() == b'\n' {
                                self.stream.advance();
                            }
                        }
                        c => {
                            self.push(c)?;
                            self.stream.advance();
                        }
                    }
                }
                c if c == quote => {
                    self.stream.advance();
                    return Ok(Token::String);
                }
                c => {
                    self.push(c)?;
                    self.stream.advance();
                }
            }
        }
    }

    fn lex_color(&mut self) -> Result<Token, Error> {
        let mut nibble = [0u32; 6];
        nibble[0] = self.hex_nibble()?;
        nibble[1] = self.hex_nibble()?;
        nibble[2] = self.hex_nibble()?;
        let color = if is_hex_digit(self.stream.curr()) {
            nibble[3] = self.hex_nibble()?;
            nibble[4] = self.hex_nibble()?;
            nibble[5] = self.hex_nibble()?;
            (nibble[0] << 20)
                | (nibble[1] << 16)
                | (nibble[2] << 12)
                | (nibble[3] << 8)
                | (nibble[4] << 4)
                | nibble[5]
        } else {
            // Historical layout: #rgb lands at bits 20/12/4 and is NOT
            // doubled into #rrggbb form. Downstream color parsing relies
            // on this exact placement.
            (nibble[0] << 20) | (nibble[1] << 12) | (nibble[2] << 4)
        };
        for b in format!("{:06x}", color).bytes() {
            self.push(b)?;
        }
        Ok(Token::Color)
    }

    fn hex_nibble(&mut self) -> Result<u32, Error> {
        let v = match self.stream.curr() {
            c @ b'0'..=b'9' => c - b'0',
            c @ b'a'..=b'f' => c - b'a' + 10,
            c @ b'A'..=b'F' => c - b'A' + 10,
            _ => return Err(self.error(ErrorKind::InvalidColor)),
        };
        self.stream.advance();
        Ok(u32::from(v))
    }

    fn lex_uri_or_keyword(&mut self) -> Result<Token, Error> {
        // The `u` has been consumed. Try `url(`; on failure push back
        // whatever matched and lex a plain keyword instead.
        if self.stream.curr() == b'r' {
            self.stream.advance();
            if self.stream.curr() == b'l' {
                self.stream.advance();
                if self.stream.curr() == b'(' {
                    self.stream.advance();
                    return self.lex_uri();
                }
                self.push(b'u')?;
                self.push(b'r')?;
                self.push(b'l')?;
            } else {
                self.push(b'u')?;
                self.push(b'r')?;
            }
        } else {
            self.push(b'u')?;
        }
        self.lex_keyword()
    }

    fn lex_uri(&mut self) -> Result<Token, Error> {
        loop {
            match self.stream.curr() {
                b')' => {
                    self.stream.advance();
                    return Ok(Token::Uri);
                }
                0 => return Err(self.error(ErrorKind::UnexpectedChar)),
                _ => self.stream.advance(),
            }
        }
    }
}
