//! Page wiring
//!
//! [`App`] initialises every component the page markup calls for and routes
//! events to them in delegation order. Deferred work only runs when the
//! caller advances the clock.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

use crate::admin::{self, AdminPanel, Confirm, DeleteOutcome, DeleteRequest};
use crate::config::{Settings, Storage};
use crate::constants::messages;
use crate::context::AppContext;
use crate::dom::{Document, Event, EventKind, Key, NodeId};
use crate::lightbox::Lightbox;
use crate::notifications::{self, NotificationKind};
use crate::theme::{self, Theme};
use crate::validation::{FormValidator, SubmitOutcome};

/// What happened while dispatching one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub default_prevented: bool,
    /// A delete trigger was clicked; run it with [`App::run_delete`]
    pub delete: Option<DeleteRequest>,
    pub submit: Option<SubmitOutcome>,
}

pub struct App {
    pub ctx: AppContext,
    lightbox: Option<Lightbox>,
    validators: Vec<FormValidator>,
    admin: AdminPanel,
    theme: Theme,
}

impl App {
    /// Initialise the page: theme, gallery, form validators, admin panel
    pub fn init(document: Document, settings: Settings, storage: &Storage, prefers_dark: bool) -> Result<Self> {
        let mut ctx = AppContext::new(document, settings)?;
        let theme = theme::setup(&mut ctx.document, storage, prefers_dark);

        let root = ctx.document.root();
        let lightbox = ctx
            .document
            .query(root, &ctx.selectors.gallery_item)
            .is_some()
            .then(|| Lightbox::new(&mut ctx));

        let forms = ctx.document.query_all(root, &ctx.selectors.validate_form);
        let validators = forms
            .into_iter()
            .map(|form| FormValidator::new(&mut ctx, form))
            .collect::<Result<Vec<_>>>()?;

        let admin = AdminPanel::new(&mut ctx)?;

        info!(
            theme = theme.as_str(),
            gallery = lightbox.is_some(),
            validators = validators.len(),
            "application initialized"
        );
        Ok(Self {
            ctx,
            lightbox,
            validators,
            admin,
            theme,
        })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn lightbox(&self) -> Option<&Lightbox> {
        self.lightbox.as_ref()
    }

    pub fn validator(&self, form: NodeId) -> Option<&FormValidator> {
        self.validators.iter().find(|v| v.form() == form)
    }

    pub fn advance(&mut self, by: Duration) {
        self.ctx.advance(by);
    }

    /// Deliver an event to the components that listen for it
    pub fn dispatch(&mut self, mut event: Event) -> Dispatch {
        let mut out = Dispatch::default();
        debug!(kind = ?event.kind, target = ?event.target, key = ?event.key, "dispatching event");

        match event.kind {
            EventKind::KeyDown => self.dispatch_key(&mut event),
            EventKind::Click => {
                let handled = self
                    .lightbox
                    .as_mut()
                    .is_some_and(|lb| lb.handle_click(&mut self.ctx, &mut event));
                if !handled && !notifications::handle_close_click(&mut self.ctx, event.target) {
                    out.delete = self.admin.handle_click(&self.ctx, &mut event);
                }
            }
            EventKind::Input => {
                let target = event.target;
                if let Some(validator) = self
                    .validators
                    .iter_mut()
                    .find(|v| self.ctx.document.contains(v.form(), target))
                {
                    validator.handle_input(&mut self.ctx, &event);
                }
            }
            EventKind::Submit => {
                let target = event.target;
                if let Some(validator) = self
                    .validators
                    .iter_mut()
                    .find(|v| v.is_attached() && v.form() == target)
                {
                    let outcome = validator.handle_submit(&mut self.ctx, &mut event);
                    match outcome {
                        SubmitOutcome::Blocked { .. } => {
                            notifications::show_notification(
                                &mut self.ctx,
                                messages::FORM_ERRORS,
                                NotificationKind::Error,
                            );
                        }
                        SubmitOutcome::Allowed => {
                            admin::show_loading(&mut self.ctx.document);
                        }
                    }
                    out.submit = Some(outcome);
                }
            }
            EventKind::MouseEnter => {
                if self.admin.is_attached()
                    && self.ctx.document.matches(event.target, &self.ctx.selectors.tooltip_target)
                {
                    admin::show_tooltip(&mut self.ctx.document, event.target);
                }
            }
            EventKind::MouseLeave => {
                if self.admin.is_attached()
                    && self.ctx.document.matches(event.target, &self.ctx.selectors.tooltip_target)
                {
                    admin::hide_tooltip(&mut self.ctx.document);
                }
            }
        }

        out.default_prevented = event.is_default_prevented();
        out
    }

    fn dispatch_key(&mut self, event: &mut Event) {
        // The trap listens on the overlay, below the document-level listeners
        let close_target = self
            .lightbox
            .as_ref()
            .and_then(Lightbox::trap)
            .and_then(|trap| trap.handle_key(&mut self.ctx, &mut *event));
        if let Some(target) = close_target {
            self.dispatch(Event::click(target));
        }

        if let Some(lightbox) = self.lightbox.as_mut() {
            lightbox.handle_keydown(&mut self.ctx, event);
        }

        if event.key == Some(Key::Tab) && !event.is_default_prevented() {
            self.default_tab(event.shift_key);
        }
    }

    /// Browser default: move focus through visible focusables in document order
    fn default_tab(&mut self, backwards: bool) {
        let doc = &self.ctx.document;
        let order: Vec<NodeId> = doc
            .query_all(doc.root(), &self.ctx.selectors.focusable)
            .into_iter()
            .filter(|node| !doc.is_hidden(*node))
            .collect();
        if order.is_empty() {
            return;
        }

        let current = doc
            .active_element()
            .and_then(|active| order.iter().position(|n| *n == active));
        let next = match (current, backwards) {
            (Some(i), false) => (i + 1) % order.len(),
            (Some(i), true) => (i + order.len() - 1) % order.len(),
            (None, false) => 0,
            (None, true) => order.len() - 1,
        };
        self.ctx.document.focus(order[next]);
    }

    /// Confirm and run a delete requested by a click
    pub async fn run_delete(&mut self, request: &DeleteRequest, confirm: &mut dyn Confirm) -> DeleteOutcome {
        self.admin.run_delete(&mut self.ctx, request, confirm).await
    }

    /// Tear down listeners and close the lightbox
    pub fn shutdown(&mut self) {
        if let Some(lightbox) = self.lightbox.as_mut() {
            lightbox.destroy(&mut self.ctx);
        }
        for validator in &mut self.validators {
            validator.detach(&mut self.ctx);
        }
        self.admin.detach(&mut self.ctx);
        debug!("application shut down");
    }
}
