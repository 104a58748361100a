/*!
A CSS parser for reflowable document layout (EPUB/HTML rendering).

This is not a browser-grade CSS parser. If you need one,
use [cssparser](https://crates.io/crates/cssparser) +
[selectors](https://crates.io/crates/selectors).

The parser turns a CSS 2 subset into a plain AST: rules pairing selector
groups with declaration lists, where values stay in lexical form (`12pt`
is a length string, `#aabbcc` a color string). Cascade, specificity and
DOM matching are the host engine's business.

## Limitations

- [At-rules](https://www.w3.org/TR/CSS21/syndata.html#at-rules) are not
  supported. They are skipped wholesale, and the skip is logged.
- Property values are not interpreted, only classified lexically.
- Id selectors are not supported: `#` always starts a hex color.
- Unicode escapes, like `\26`, are not supported.
- The first syntax error aborts the whole parse. There is no recovery.

## Features

- Line-accurate fatal diagnostics: `css syntax error: <message> (<file>:<line>)`.
- Descendant, child and adjacent sibling combinators; class, pseudo-class
  and attribute conditions.
- Incremental loading: append several sheets into one ordered rule chain
  with [`StyleSheet::parse_more`].
- Inline `style` attribute parsing with [`parse_declarations`].
- Has a high-level parser and a low-level tokenizer.
- No unsafe.
*/

#![doc(html_root_url = "https://docs.rs/flowcss/0.1.0")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;

mod parser;
mod stream;
mod tokenizer;

pub use crate::tokenizer::{Token, Tokenizer};

use crate::parser::Parser;

/// A list of possible errors.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ErrorKind {
    /// A comment with no closing `*/`.
    UnterminatedComment,

    /// A string with no closing quote.
    UnterminatedString,

    /// A `#` not followed by three or six hex digits.
    InvalidColor,

    /// A token longer than the lexer is willing to hold.
    TokenTooLong,

    /// The parser met a token it cannot use here.
    UnexpectedToken,

    /// The lexer met a byte it cannot use here.
    UnexpectedChar,

    /// A rule without a selector.
    SelectorMissing,

    /// A condition marker that does not form a valid condition.
    ConditionMissing,

    /// `[name=` without a keyword or string value.
    AttributeValueMissing,

    /// A declaration that does not start with a property name.
    PropertyNameMissing,

    /// A token that cannot appear in a declaration value.
    ValueMissing,

    /// A condition marker without the keyword it introduces.
    KeywordAfter(char),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorKind::UnterminatedComment => write!(f, "unterminated comment"),
            ErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ErrorKind::InvalidColor => write!(f, "invalid color"),
            ErrorKind::TokenTooLong => write!(f, "token too long"),
            ErrorKind::UnexpectedToken => write!(f, "unexpected token"),
            ErrorKind::UnexpectedChar => write!(f, "unexpected character"),
            ErrorKind::SelectorMissing => write!(f, "expected selector"),
            ErrorKind::ConditionMissing => write!(f, "expected condition"),
            ErrorKind::AttributeValueMissing => write!(f, "expected attribute value"),
            ErrorKind::PropertyNameMissing => write!(f, "expected keyword in property"),
            ErrorKind::ValueMissing => write!(f, "expected value"),
            ErrorKind::KeywordAfter(c) => write!(f, "expected keyword after '{}'", c),
        }
    }
}

/// A fatal parse error.
///
/// The first error aborts the whole parse; nothing built so far is
/// returned.
#[derive(Clone, PartialEq, Debug)]
pub struct Error {
    /// What went wrong.
    pub kind: ErrorKind,
    /// The file name given to the parse. Diagnostic only.
    pub file: String,
    /// The 1-based line the lexer had reached.
    pub line: u32,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, file: &str, line: u32) -> Error {
        Error {
            kind,
            file: file.to_owned(),
            line,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "css syntax error: {} ({}:{})",
            self.kind, self.file, self.line
        )
    }
}

impl std::error::Error for Error {}

/// A combinator between two selectors.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Combinator {
    /// Descendant selector.
    Space,
    /// Child selector.
    GreaterThan,
    /// Adjacent sibling selector.
    Plus,
}

/// An extra constraint on a simple selector.
#[derive(Clone, PartialEq, Debug)]
pub enum Condition {
    /// `:name`
    PseudoClass(String),

    /// `.name`
    Class(String),

    /// `#name`
    ///
    /// The tokenizer resolves `#` as a hex color first, so the parser
    /// never builds this today. Kept for hosts that assemble conditions
    /// themselves.
    Id(String),

    /// `[name]`
    HasAttribute(String),

    /// `[name=value]`
    AttributeEqual {
        /// The attribute name.
        name: String,
        /// The value the attribute must equal.
        value: String,
    },

    /// `[name|=value]`
    AttributeDashMatch {
        /// The attribute name.
        name: String,
        /// The value the attribute must equal or extend with a hyphen.
        value: String,
    },

    /// `[name~=value]`
    AttributeIncludes {
        /// The attribute name.
        name: String,
        /// The word the space-separated attribute must contain.
        value: String,
    },
}

/// A parsed selector.
#[derive(Clone, PartialEq, Debug)]
pub enum Selector {
    /// A simple selector: an optional element name plus conditions.
    Simple {
        /// The element name; `None` matches any element.
        name: Option<String>,
        /// Conditions, all of which must hold. May be empty.
        conditions: Vec<Condition>,
    },

    /// Two selectors joined by a combinator.
    ///
    /// Chains lean right: `a > b > c` is `a > (b > c)`.
    Combined {
        /// How the two sides relate.
        combinator: Combinator,
        /// The ancestor or preceding-sibling side.
        left: Box<Selector>,
        /// The subject side.
        right: Box<Selector>,
    },
}

/// A single component of a declaration value.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    /// A bare keyword, like `red` or `solid`.
    Keyword(String),
    /// A unitless number in lexical form, like `1.5`.
    Number(String),
    /// A number with its unit, like `12pt`.
    Length(String),
    /// A percentage, like `50%`.
    Percent(String),
    /// A quoted string, unquoted and unescaped.
    String(String),
    /// A hex color as six lowercase hex digits.
    Color(String),
    /// A `url(...)` reference. The target is not retained.
    Uri,
    /// A `,` separator.
    Comma,
    /// A `/` separator, as in the `font` shorthand.
    Slash,
    /// A functional value, like `rgb(255, 0, 0)`.
    Function {
        /// The function name.
        name: String,
        /// The argument values, separators included.
        args: Vec<Value>,
    },
}

/// A declaration: one `name: values` pair.
#[derive(Clone, PartialEq, Debug)]
pub struct Declaration {
    /// The property name.
    pub name: String,
    /// The value components in source order. May be empty.
    pub values: Vec<Value>,
    /// Filled in by the cascade. The parser leaves it 0.
    pub specificity: u32,
}

/// A rule: a selector group and its declaration block.
#[derive(Clone, PartialEq, Debug)]
pub struct Rule {
    /// The comma-separated selector group. Never empty.
    pub selectors: Vec<Selector>,
    /// The declarations of the block. May be empty.
    pub declarations: Vec<Declaration>,
}

/// A style sheet: rules in document order.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct StyleSheet {
    /// The rules, in the order they were parsed.
    pub rules: Vec<Rule>,
}

impl StyleSheet {
    /// Creates an empty style sheet.
    pub fn new() -> StyleSheet {
        StyleSheet { rules: Vec::new() }
    }

    /// Parses a style sheet from text.
    ///
    /// `file` is only used in diagnostics.
    ///
    /// # Example
    ///
    /// ```
    /// use flowcss::StyleSheet;
    ///
    /// let sheet = StyleSheet::parse("p { color: red }", "doc.css").unwrap();
    /// assert_eq!(sheet.rules.len(), 1);
    /// ```
    pub fn parse(source: &str, file: &str) -> Result<StyleSheet, Error> {
        let mut sheet = StyleSheet::new();
        sheet.parse_more(source, file)?;
        Ok(sheet)
    }

    /// Parses a style sheet and appends its rules to this one.
    ///
    /// Document order is preserved across calls; that is how user-agent,
    /// document and linked sheets stack up into one ordered chain.
    ///
    /// On error this sheet is left unchanged.
    pub fn parse_more(&mut self, source: &str, file: &str) -> Result<(), Error> {
        let mut parser = Parser::new(source, file)?;
        let rules = parser.parse_stylesheet()?;
        self.rules.extend(rules);
        Ok(())
    }
}

/// Parses a bare declaration list, as found in an inline `style`
/// attribute.
///
/// Diagnostics use `<inline>` as the file name.
///
/// # Example
///
/// ```
/// let declarations = flowcss::parse_declarations("color: red").unwrap();
/// assert_eq!(declarations[0].name, "color");
/// ```
pub fn parse_declarations(source: &str) -> Result<Vec<Declaration>, Error> {
    let mut parser = Parser::new(source, "<inline>")?;
    parser.parse_declaration_list()
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Combinator::Space => write!(f, " "),
            Combinator::GreaterThan => write!(f, " > "),
            Combinator::Plus => write!(f, " + "),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Condition::PseudoClass(name) => write!(f, ":{}", name),
            Condition::Class(name) => write!(f, ".{}", name),
            Condition::Id(name) => write!(f, "#{}", name),
            Condition::HasAttribute(name) => write!(f, "[{}]", name),
            Condition::AttributeEqual { name, value } => write!(f, "[{}=\"{}\"]", name, value),
            Condition::AttributeDashMatch { name, value } => write!(f, "[{}|=\"{}\"]", name, value),
            Condition::AttributeIncludes { name, value } => write!(f, "[{}~=\"{}\"]", name, value),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Selector::Simple { name, conditions } => {
                match name {
                    Some(name) => write!(f, "{}", name)?,
                    None => write!(f, "*")?,
                }
                for condition in conditions {
                    write!(f, "{}", condition)?;
                }
                Ok(())
            }
            Selector::Combined {
                combinator,
                left,
                right,
            } => write!(f, "{}{}{}", left, combinator, right),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Keyword(s) | Value::Number(s) | Value::Length(s) | Value::Percent(s) => {
                write!(f, "{}", s)
            }
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Color(s) => write!(f, "#{}", s),
            Value::Uri => write!(f, "url()"),
            Value::Comma => write!(f, ","),
            Value::Slash => write!(f, "/"),
            Value::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    match arg {
                        Value::Comma => write!(f, ",")?,
                        _ => {
                            if i > 0 {
                                write!(f, " ")?;
                            }
                            write!(f, "{}", arg)?;
                        }
                    }
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        for value in &self.values {
            match value {
                Value::Comma => write!(f, ",")?,
                _ => write!(f, " {}", value)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", selector)?;
        }
        write!(f, " {{")?;
        for declaration in &self.declarations {
            write!(f, " {};", declaration)?;
        }
        write!(f, " }}")
    }
}

impl fmt::Display for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            write!(f, "{}", rule)?;
            if i != self.rules.len() - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
