//! Form validator
//!
//! Validates the controls of one form against a [`RuleSet`], keeps one inline
//! `div.field-error` per failing field and blocks submission while any field
//! is invalid.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::rules::{FieldRule, PartialRule, RuleSet};
use crate::constants::classes;
use crate::context::AppContext;
use crate::dom::{Document, Event, EventKind, ListenerId, NodeId};

/// Result of intercepting a submit event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Allowed,
    Blocked { first_invalid: Option<NodeId> },
}

enum FieldCheck {
    Unruled,
    Valid,
    Invalid(String),
}

pub struct FormValidator {
    form: NodeId,
    rules: RuleSet,
    errors: BTreeMap<String, String>,
    first_invalid: Option<NodeId>,
    listeners: Vec<ListenerId>,
}

impl FormValidator {
    /// Validator with the default rule set
    pub fn new(ctx: &mut AppContext, form: NodeId) -> Result<Self> {
        Self::with_rules(ctx, form, Vec::new())
    }

    /// Validator whose `overrides` replace default rules of the same name
    pub fn with_rules(
        ctx: &mut AppContext,
        form: NodeId,
        overrides: Vec<(String, FieldRule)>,
    ) -> Result<Self> {
        let rules = RuleSet::defaults_with(overrides)
            .context("Failed to compile default validation rules")?;
        let listeners = vec![
            ctx.document.add_listener(form, EventKind::Input),
            ctx.document.add_listener(form, EventKind::Submit),
        ];
        debug!(form = ?form, fields = rules.fields().count(), "form validator attached");
        Ok(Self {
            form,
            rules,
            errors: BTreeMap::new(),
            first_invalid: None,
            listeners,
        })
    }

    pub fn form(&self) -> NodeId {
        self.form
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Validate one control and update its markers. Controls without a rule are valid
    pub fn validate_field(&mut self, ctx: &mut AppContext, field: NodeId) -> bool {
        !matches!(self.check_field(ctx, field), FieldCheck::Invalid(_))
    }

    fn check_field(&self, ctx: &mut AppContext, field: NodeId) -> FieldCheck {
        let doc = &mut ctx.document;
        let name = doc.attr(field, "name").unwrap_or_default().to_string();
        let Some(rule) = self.rules.get(&name) else {
            return FieldCheck::Unruled;
        };

        let value = doc.value(field).to_string();
        let message = rule.evaluate(&value).err().map(|kind| rule.message(kind).to_string());

        doc.remove_class(field, classes::FIELD_VALID);
        doc.remove_class(field, classes::FIELD_INVALID);
        if !value.trim().is_empty() {
            let marker = if message.is_some() {
                classes::FIELD_INVALID
            } else {
                classes::FIELD_VALID
            };
            doc.add_class(field, marker);
        }
        sync_error_element(doc, field, &name, message.as_deref());

        match message {
            Some(message) => FieldCheck::Invalid(message),
            None => FieldCheck::Valid,
        }
    }

    /// Validate every control in document order, rebuilding the error map
    pub fn validate_all(&mut self, ctx: &mut AppContext) -> bool {
        self.errors.clear();
        self.first_invalid = None;

        let fields = ctx.document.query_all(self.form, &ctx.selectors.form_control);
        for field in fields {
            if let FieldCheck::Invalid(message) = self.check_field(ctx, field) {
                let name = ctx.document.attr(field, "name").unwrap_or_default();
                self.errors.insert(name.to_string(), message);
                self.first_invalid.get_or_insert(field);
            }
        }

        let valid = self.errors.is_empty() && self.first_invalid.is_none();
        debug!(valid, errors = self.errors.len(), "form validated");
        valid
    }

    pub fn validate(&mut self, ctx: &mut AppContext) -> bool {
        self.validate_all(ctx)
    }

    /// Re-validate the control an input event came from
    pub fn handle_input(&mut self, ctx: &mut AppContext, event: &Event) -> bool {
        if !self.is_attached()
            || event.kind != EventKind::Input
            || !ctx.document.contains(self.form, event.target)
            || !ctx.document.matches(event.target, &ctx.selectors.form_control)
        {
            return false;
        }
        self.validate_field(ctx, event.target);
        true
    }

    /// Cancel an invalid submission and move focus to the first invalid field
    pub fn handle_submit(&mut self, ctx: &mut AppContext, event: &mut Event) -> SubmitOutcome {
        if !self.is_attached() || event.kind != EventKind::Submit || event.target != self.form {
            return SubmitOutcome::Allowed;
        }
        if self.validate_all(ctx) {
            return SubmitOutcome::Allowed;
        }

        event.prevent_default();
        if let Some(field) = self.first_invalid {
            ctx.document.focus(field);
            ctx.document.scroll_into_view(field);
        }
        info!(errors = ?self.errors, "form submission blocked");
        SubmitOutcome::Blocked {
            first_invalid: self.first_invalid,
        }
    }

    /// Snapshot of the last `validate_all` errors
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.errors.clone()
    }

    /// Strip validity markers and inline errors from the form
    pub fn clear_validation(&mut self, ctx: &mut AppContext) {
        let doc = &mut ctx.document;
        for node in doc.descendants(self.form) {
            doc.remove_class(node, classes::FIELD_VALID);
            doc.remove_class(node, classes::FIELD_INVALID);
            if doc.has_class(node, classes::FIELD_ERROR) {
                doc.remove(node);
            }
        }
    }

    /// Merge into the field's rule. Existing markers are not re-evaluated
    pub fn add_custom_rule(&mut self, field: &str, rule: PartialRule) {
        self.rules.merge(field, rule);
    }

    pub fn remove_rule(&mut self, field: &str) -> bool {
        self.rules.remove(field)
    }

    /// Drop the form listeners
    pub fn detach(&mut self, ctx: &mut AppContext) {
        for listener in self.listeners.drain(..) {
            ctx.document.remove_listener(listener);
        }
    }
}

fn find_error_element(doc: &Document, parent: NodeId, name: &str) -> Option<NodeId> {
    doc.descendants(parent).into_iter().find(|node| {
        doc.has_class(*node, classes::FIELD_ERROR) && doc.attr(*node, "data-for") == Some(name)
    })
}

/// Create, update or remove the field's inline error next to it
fn sync_error_element(doc: &mut Document, field: NodeId, name: &str, message: Option<&str>) {
    let Some(parent) = doc.parent(field) else {
        return;
    };
    let existing = find_error_element(doc, parent, name);
    match (message, existing) {
        (Some(message), Some(element)) => doc.set_text(element, message),
        (Some(message), None) => {
            let element = doc.create_element("div");
            doc.add_class(element, classes::FIELD_ERROR);
            doc.set_attr(element, "data-for", name);
            doc.set_text(element, message);
            doc.append_child(parent, element);
        }
        (None, Some(element)) => {
            doc.remove(element);
        }
        (None, None) => {}
    }
}
