//! Declarative field rules
//!
//! A [`FieldRule`] describes the constraints on one named field together
//! with the message shown for each kind of failure. Evaluation stops at the
//! first failing check, in this order: required, custom, min length,
//! max length, pattern.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::predicates::{self, EMAIL_PATTERN, PHONE_PATTERN};
use crate::constants::messages;

/// User-supplied check, called with the trimmed non-empty value
pub type Predicate = Rc<dyn Fn(&str) -> bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    Required,
    Custom,
    MinLength,
    MaxLength,
    Pattern,
}

#[derive(Clone, Default)]
pub struct FieldRule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub custom: Option<Predicate>,
    pub messages: BTreeMap<RuleKind, String>,
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("custom", &self.custom.is_some())
            .field("messages", &self.messages)
            .finish()
    }
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, message: &str) -> Self {
        self.required = true;
        self.messages.insert(RuleKind::Required, message.to_string());
        self
    }

    pub fn min_length(mut self, min: usize, message: &str) -> Self {
        self.min_length = Some(min);
        self.messages.insert(RuleKind::MinLength, message.to_string());
        self
    }

    pub fn max_length(mut self, max: usize, message: &str) -> Self {
        self.max_length = Some(max);
        self.messages.insert(RuleKind::MaxLength, message.to_string());
        self
    }

    pub fn pattern(mut self, pattern: Regex, message: &str) -> Self {
        self.pattern = Some(pattern);
        self.messages.insert(RuleKind::Pattern, message.to_string());
        self
    }

    pub fn custom(mut self, check: impl Fn(&str) -> bool + 'static, message: &str) -> Self {
        self.custom = Some(Rc::new(check));
        self.messages.insert(RuleKind::Custom, message.to_string());
        self
    }

    /// Check a raw field value. Returns the first failing kind.
    ///
    /// A custom check replaces the length and pattern checks. Empty values
    /// only ever fail `required`.
    pub fn evaluate(&self, raw: &str) -> Result<(), RuleKind> {
        let value = raw.trim();
        if value.is_empty() {
            return if self.required { Err(RuleKind::Required) } else { Ok(()) };
        }

        if let Some(custom) = &self.custom {
            return if custom(value) { Ok(()) } else { Err(RuleKind::Custom) };
        }

        let length = value.chars().count();
        if self.min_length.is_some_and(|min| length < min) {
            return Err(RuleKind::MinLength);
        }
        if self.max_length.is_some_and(|max| length > max) {
            return Err(RuleKind::MaxLength);
        }
        if self.pattern.as_ref().is_some_and(|re| !re.is_match(value)) {
            return Err(RuleKind::Pattern);
        }
        Ok(())
    }

    /// Message for a failure kind, with a generic fallback
    pub fn message(&self, kind: RuleKind) -> &str {
        self.messages
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(messages::FALLBACK_FIELD_ERROR)
    }

    /// Overlay the fields set in `partial`. Messages merge key by key
    pub fn merge(&mut self, partial: PartialRule) {
        if let Some(required) = partial.required {
            self.required = required;
        }
        if let Some(min) = partial.min_length {
            self.min_length = Some(min);
        }
        if let Some(max) = partial.max_length {
            self.max_length = Some(max);
        }
        if let Some(pattern) = partial.pattern {
            self.pattern = Some(pattern);
        }
        if let Some(custom) = partial.custom {
            self.custom = Some(custom);
        }
        self.messages.extend(partial.messages);
    }
}

/// Rule fragment for [`RuleSet::merge`]; unset fields keep their current value
#[derive(Clone, Default)]
pub struct PartialRule {
    pub required: Option<bool>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub custom: Option<Predicate>,
    pub messages: BTreeMap<RuleKind, String>,
}

impl PartialRule {
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn custom(mut self, check: impl Fn(&str) -> bool + 'static) -> Self {
        self.custom = Some(Rc::new(check));
        self
    }

    pub fn message(mut self, kind: RuleKind, text: &str) -> Self {
        self.messages.insert(kind, text.to_string());
        self
    }
}

impl From<PartialRule> for FieldRule {
    fn from(partial: PartialRule) -> Self {
        let mut rule = FieldRule::default();
        rule.merge(partial);
        rule
    }
}

/// Field name to rule
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, FieldRule>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in rules for the admin forms
    pub fn defaults() -> Result<Self, regex::Error> {
        let mut set = Self::empty();
        set.insert(
            "nombre",
            FieldRule::new()
                .required("El nombre es obligatorio")
                .min_length(2, "El nombre debe tener al menos 2 caracteres")
                .max_length(100, "El nombre no puede exceder 100 caracteres")
                .pattern(
                    Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑ\s]+$")?,
                    "El nombre solo puede contener letras y espacios",
                ),
        );
        set.insert(
            "precio",
            FieldRule::new()
                .required("El precio es obligatorio")
                .custom(predicates::is_valid_price, "Formato de precio inválido (ej: 25.000)"),
        );
        set.insert(
            "descripcion",
            FieldRule::new().max_length(500, "La descripción no puede exceder 500 caracteres"),
        );
        set.insert(
            "email",
            FieldRule::new().pattern(Regex::new(EMAIL_PATTERN)?, "Email inválido"),
        );
        set.insert(
            "telefono",
            FieldRule::new().pattern(Regex::new(PHONE_PATTERN)?, "Número de teléfono inválido"),
        );
        Ok(set)
    }

    /// Defaults with caller rules replacing same-named defaults wholesale
    pub fn defaults_with<I>(overrides: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (String, FieldRule)>,
    {
        let mut set = Self::defaults()?;
        set.rules.extend(overrides);
        Ok(set)
    }

    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.get(field)
    }

    pub fn insert(&mut self, field: &str, rule: FieldRule) {
        self.rules.insert(field.to_string(), rule);
    }

    /// Merge into the existing rule, creating it if absent
    pub fn merge(&mut self, field: &str, partial: PartialRule) {
        self.rules.entry(field.to_string()).or_default().merge(partial);
    }

    pub fn remove(&mut self, field: &str) -> bool {
        self.rules.remove(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}
