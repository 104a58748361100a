// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::warn;

use crate::tokenizer::{Token, Tokenizer};
use crate::{Combinator, Condition, Declaration, Error, ErrorKind, Rule, Selector, Value};

/// Recursive-descent parser with one token of lookahead.
///
/// The payload of the lookahead token lives in the tokenizer until the
/// parser advances past it.
pub struct Parser<'a> {
    tokens: Tokenizer<'a>,
    lookahead: Token,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file: &'a str) -> Result<Parser<'a>, Error> {
        let mut tokens = Tokenizer::new(source, file);
        let lookahead = tokens.next_token()?;
        Ok(Parser { tokens, lookahead })
    }

    fn next(&mut self) -> Result<(), Error> {
        self.lookahead = self.tokens.next_token()?;
        Ok(())
    }

    fn accept(&mut self, t: Token) -> Result<bool, Error> {
        if self.lookahead == t {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, t: Token) -> Result<(), Error> {
        if !self.accept(t)? {
            return Err(self.error(ErrorKind::UnexpectedToken));
        }
        Ok(())
    }

    fn error(&self, kind: ErrorKind) -> Error {
        self.tokens.error(kind)
    }

    fn take_text(&self) -> String {
        self.tokens.text().to_owned()
    }

    pub fn parse_stylesheet(&mut self) -> Result<Vec<Rule>, Error> {
        let mut rules = Vec::new();
        while self.lookahead != Token::Eof {
            if self.accept(Token::Delim(b'@'))? {
                self.parse_at_rule()?;
            } else {
                rules.push(self.parse_rule()?);
            }
        }
        Ok(rules)
    }

    /// Skips an unrecognized at-rule: everything up to a top-level `;`,
    /// or a brace block with nested braces matched. Running out of input
    /// inside the block just ends the skip.
    fn parse_at_rule(&mut self) -> Result<(), Error> {
        if self.lookahead != Token::Keyword {
            return Err(self.error(ErrorKind::UnexpectedToken));
        }
        let name = self.take_text();
        self.next()?;
        warn!("the @{} rule is not supported, skipping", name);

        loop {
            match self.lookahead {
                Token::Eof => return Ok(()),
                Token::Delim(b';') => {
                    self.next()?;
                    return Ok(());
                }
                Token::Delim(b'{') => {
                    self.next()?;
                    let mut depth = 1;
                    while depth > 0 && self.lookahead != Token::Eof {
                        match self.lookahead {
                            Token::Delim(b'{') => depth += 1,
                            Token::Delim(b'}') => depth -= 1,
                            _ => {}
                        }
                        self.next()?;
                    }
                    return Ok(());
                }
                _ => self.next()?,
            }
        }
    }

    fn parse_rule(&mut self) -> Result<Rule, Error> {
        let selectors = self.parse_selector_list()?;
        self.expect(Token::Delim(b'{'))?;
        let declarations = self.parse_declaration_list()?;
        self.expect(Token::Delim(b'}'))?;
        Ok(Rule {
            selectors,
            declarations,
        })
    }

    fn parse_selector_list(&mut self) -> Result<Vec<Selector>, Error> {
        let mut selectors = vec![self.parse_descendant_selector()?];
        while self.accept(Token::Delim(b','))? {
            selectors.push(self.parse_descendant_selector()?);
        }
        Ok(selectors)
    }

    // Combinators are right-associative: each level recurses into itself
    // on the right operand, so `a b c` becomes `a (b c)`.

    fn parse_descendant_selector(&mut self) -> Result<Selector, Error> {
        let s = self.parse_child_selector()?;
        // No explicit combinator token; anything but the end of the
        // selector group continues it.
        match self.lookahead {
            Token::Delim(b',') | Token::Delim(b'{') | Token::Eof => Ok(s),
            _ => {
                let right = self.parse_descendant_selector()?;
                Ok(combine(Combinator::Space, s, right))
            }
        }
    }

    fn parse_child_selector(&mut self) -> Result<Selector, Error> {
        let s = self.parse_adjacent_selector()?;
        if self.accept(Token::Delim(b'>'))? {
            let right = self.parse_child_selector()?;
            return Ok(combine(Combinator::GreaterThan, s, right));
        }
        Ok(s)
    }

    fn parse_adjacent_selector(&mut self) -> Result<Selector, Error> {
        let s = self.parse_simple_selector()?;
        if self.accept(Token::Delim(b'+'))? {
            let right = self.parse_adjacent_selector()?;
            return Ok(combine(Combinator::Plus, s, right));
        }
        Ok(s)
    }

    fn parse_simple_selector(&mut self) -> Result<Selector, Error> {
        if self.accept(Token::Delim(b'*'))? {
            return Ok(Selector::Simple {
                name: None,
                conditions: self.parse_optional_conditions()?,
            });
        }
        if self.lookahead == Token::Keyword {
            let name = self.take_text();
            self.next()?;
            return Ok(Selector::Simple {
                name: Some(name),
                conditions: self.parse_optional_conditions()?,
            });
        }
        if self.at_condition() {
            return Ok(Selector::Simple {
                name: None,
                conditions: self.parse_condition_list()?,
            });
        }
        Err(self.error(ErrorKind::SelectorMissing))
    }

    fn at_condition(&self) -> bool {
        match self.lookahead {
            Token::Delim(b':') | Token::Delim(b'.') | Token::Delim(b'#') | Token::Delim(b'[') => {
                true
            }
            _ => false,
        }
    }

    fn parse_optional_conditions(&mut self) -> Result<Vec<Condition>, Error> {
        if self.at_condition() {
            self.parse_condition_list()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_condition_list(&mut self) -> Result<Vec<Condition>, Error> {
        let mut conditions = vec![self.parse_condition()?];
        while self.at_condition() {
            conditions.push(self.parse_condition()?);
        }
        Ok(conditions)
    }

    fn parse_condition(&mut self) -> Result<Condition, Error> {
        if self.accept(Token::Delim(b':'))? {
            let name = self.expect_condition_name(':')?;
            return Ok(Condition::PseudoClass(name));
        }
        if self.accept(Token::Delim(b'.'))? {
            let name = self.expect_condition_name('.')?;
            return Ok(Condition::Class(name));
        }
        if self.accept(Token::Delim(b'#'))? {
            let name = self.expect_condition_name('#')?;
            return Ok(Condition::Id(name));
        }
        if self.accept(Token::Delim(b'['))? {
            let name = self.expect_condition_name('[')?;
            if self.accept(Token::Delim(b']'))? {
                return Ok(Condition::HasAttribute(name));
            }
            if self.accept(Token::Delim(b'='))? {
                let value = self.parse_attribute_value()?;
                self.expect(Token::Delim(b']'))?;
                return Ok(Condition::AttributeEqual { name, value });
            }
            if self.accept(Token::Delim(b'|'))? {
                self.expect(Token::Delim(b'='))?;
                let value = self.parse_attribute_value()?;
                self.expect(Token::Delim(b']'))?;
                return Ok(Condition::AttributeDashMatch { name, value });
            }
            if self.accept(Token::Delim(b'~'))? {
                self.expect(Token::Delim(b'='))?;
                let value = self.parse_attribute_value()?;
                self.expect(Token::Delim(b']'))?;
                return Ok(Condition::AttributeIncludes { name, value });
            }
        }
        Err(self.error(ErrorKind::ConditionMissing))
    }

    fn expect_condition_name(&mut self, after: char) -> Result<String, Error> {
        if self.lookahead != Token::Keyword {
            return Err(self.error(ErrorKind::KeywordAfter(after)));
        }
        let name = self.take_text();
        self.next()?;
        Ok(name)
    }

    fn parse_attribute_value(&mut self) -> Result<String, Error> {
        match self.lookahead {
            Token::Keyword | Token::String => {
                let value = self.take_text();
                self.next()?;
                Ok(value)
            }
            _ => Err(self.error(ErrorKind::AttributeValueMissing)),
        }
    }

    pub fn parse_declaration_list(&mut self) -> Result<Vec<Declaration>, Error> {
        let mut declarations = Vec::new();
        match self.lookahead {
            Token::Delim(b'}') | Token::Eof => return Ok(declarations),
            _ => {}
        }
        declarations.push(self.parse_declaration()?);
        while self.accept(Token::Delim(b';'))? {
            match self.lookahead {
                Token::Delim(b'}') | Token::Delim(b';') | Token::Eof => {}
                _ => declarations.push(self.parse_declaration()?),
            }
        }
        Ok(declarations)
    }

    fn parse_declaration(&mut self) -> Result<Declaration, Error> {
        if self.lookahead != Token::Keyword {
            return Err(self.error(ErrorKind::PropertyNameMissing));
        }
        let name = self.take_text();
        self.next()?;
        self.expect(Token::Delim(b':'))?;

        let values = self.parse_value_list()?;

        // `!important` is accepted but not recorded; the cascade decides
        // whether to care.
        if self.accept(Token::Delim(b'!'))? {
            self.expect(Token::Keyword)?;
        }

        Ok(Declaration {
            name,
            values,
            specificity: 0,
        })
    }

    fn parse_value_list(&mut self) -> Result<Vec<Value>, Error> {
        let mut values = Vec::new();
        loop {
            match self.lookahead {
                Token::Delim(b'}')
                | Token::Delim(b';')
                | Token::Delim(b'!')
                | Token::Delim(b')')
                | Token::Eof => return Ok(values),
                _ => values.push(self.parse_value()?),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, Error> {
        match self.lookahead {
            Token::Keyword => {
                let text = self.take_text();
                self.next()?;
                // A keyword directly followed by parentheses is a
                // functional value, like rgb(...).
                if self.accept(Token::Delim(b'('))? {
                    let args = self.parse_value_list()?;
                    self.expect(Token::Delim(b')'))?;
                    return Ok(Value::Function { name: text, args });
                }
                Ok(Value::Keyword(text))
            }
            Token::Number => {
                let text = self.take_text();
                self.next()?;
                Ok(Value::Number(text))
            }
            Token::Length => {
                let text = self.take_text();
                self.next()?;
                Ok(Value::Length(text))
            }
            Token::Percent => {
                let text = self.take_text();
                self.next()?;
                Ok(Value::Percent(text))
            }
            Token::String => {
                let text = self.take_text();
                self.next()?;
                Ok(Value::String(text))
            }
            Token::Color => {
                let text = self.take_text();
                self.next()?;
                Ok(Value::Color(text))
            }
            Token::Uri => {
                self.next()?;
                Ok(Value::Uri)
            }
            Token::Delim(b',') => {
                self.next()?;
                Ok(Value::Comma)
            }
            Token::Delim(b'/') => {
                self.next()?;
                Ok(Value::Slash)
            }
            _ => Err(self.error(ErrorKind::ValueMissing)),
        }
    }
}

fn combine(combinator: Combinator, left: Selector, right: Selector) -> Selector {
    Selector::Combined {
        combinator,
        left: Box::new(left),
        right: Box::new(right),
    }
}
