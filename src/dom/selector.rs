//! Minimal CSS selector support
//!
//! Covers what the front-end needs: type, `.class`, `#id`, `[attr]`,
//! `[attr="value"]`, `:not(...)`, the descendant combinator and comma
//! separated selector lists.

use thiserror::Error;

use super::{Document, Element, NodeId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected '{found}' at position {position} in selector '{selector}'")]
    Unexpected {
        selector: String,
        position: usize,
        found: char,
    },
    #[error("unterminated {what} in selector '{selector}'")]
    Unterminated { selector: String, what: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
    negations: Vec<Compound>,
}

impl Compound {
    fn matches_element(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag
            && !tag.eq_ignore_ascii_case(element.tag())
        {
            return false;
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        let attrs_match = self.attrs.iter().all(|attr| match attr {
            AttrMatch::Exists(name) => element.attr(name).is_some(),
            AttrMatch::Equals(name, value) => element.attr(name) == Some(value.as_str()),
        });
        attrs_match && !self.negations.iter().any(|n| n.matches_element(element))
    }
}

/// Compounds joined by descendant combinators, left to right
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<Compound>,
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some((last, ancestors)) = self.parts.split_last() else {
            return false;
        };
        if !doc.element(node).is_some_and(|el| last.matches_element(el)) {
            return false;
        }

        // Descendant-only chains can be matched greedily against the nearest ancestor
        let mut current = doc.parent(node);
        for part in ancestors.iter().rev() {
            loop {
                let Some(ancestor) = current else {
                    return false;
                };
                current = doc.parent(ancestor);
                if doc.element(ancestor).is_some_and(|el| part.matches_element(el)) {
                    break;
                }
            }
        }
        true
    }
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let alternatives = Parser::new(source).parse_list()?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True if `node` matches any selector in the list
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected {
                selector: self.source.to_string(),
                position: self.pos,
                found,
            },
            None => SelectorError::Empty,
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), SelectorError> {
        if self.peek() == Some(wanted) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '-' || c == '_'
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(Self::is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_list(&mut self) -> Result<Vec<Complex>, SelectorError> {
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                return Err(SelectorError::Empty);
            }
            list.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(list),
                Some(',') => self.pos += 1,
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        let mut parts = vec![self.parse_compound()?];
        loop {
            let had_whitespace = self.skip_whitespace();
            match self.peek() {
                None | Some(',') | Some(')') => break,
                Some(_) if had_whitespace => parts.push(self.parse_compound()?),
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(Complex { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => self.pos += 1,
            Some(c) if Self::is_ident_char(c) => compound.tag = Some(self.ident()?),
            _ => {}
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('#') => {
                    self.pos += 1;
                    let id = self.ident()?;
                    compound.attrs.push(AttrMatch::Equals("id".to_string(), id));
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.ident()?;
                    if pseudo != "not" {
                        self.pos -= pseudo.chars().count();
                        return Err(self.unexpected());
                    }
                    self.expect('(')?;
                    self.skip_whitespace();
                    compound.negations.push(self.parse_compound()?);
                    self.skip_whitespace();
                    self.expect(')')?;
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();
        let matcher = match self.peek() {
            Some(']') => AttrMatch::Exists(name),
            Some('=') => {
                self.pos += 1;
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.pos += 1;
                        let start = self.pos;
                        while self.peek().is_some_and(|c| c != quote) {
                            self.pos += 1;
                        }
                        if self.peek().is_none() {
                            return Err(SelectorError::Unterminated {
                                selector: self.source.to_string(),
                                what: "string",
                            });
                        }
                        let value: String = self.chars[start..self.pos].iter().collect();
                        self.pos += 1;
                        value
                    }
                    _ => self.ident()?,
                };
                self.skip_whitespace();
                AttrMatch::Equals(name, value)
            }
            None => {
                return Err(SelectorError::Unterminated {
                    selector: self.source.to_string(),
                    what: "attribute selector",
                });
            }
            Some(_) => return Err(self.unexpected()),
        };
        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(matcher)
            }
            None => Err(SelectorError::Unterminated {
                selector: self.source.to_string(),
                what: "attribute selector",
            }),
            Some(_) => Err(self.unexpected()),
        }
    }
}
