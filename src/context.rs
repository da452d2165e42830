//! Application context
//!
//! Owns the document, the scheduler and every single-instance element
//! (lightbox overlay, notification container). Components borrow it mutably
//! for the duration of a call instead of reaching for globals.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Settings;
use crate::constants::{classes, selectors};
use crate::dom::{Document, NodeId, Selector};
use crate::lightbox::LightboxOverlay;
use crate::scheduler::{Scheduler, Task, TaskId};

/// Selectors parsed once at startup
#[derive(Debug, Clone)]
pub struct CachedSelectors {
    pub gallery_image: Selector,
    pub gallery_item: Selector,
    pub focusable: Selector,
    pub close_marker: Selector,
    pub form_control: Selector,
    pub validate_form: Selector,
    pub delete_action: Selector,
    pub tooltip_target: Selector,
    pub notification: Selector,
    pub notification_close: Selector,
}

impl CachedSelectors {
    pub fn new() -> Result<Self> {
        let parse = |source: &str| {
            Selector::parse(source).context(format!("Failed to parse selector '{source}'"))
        };
        Ok(Self {
            gallery_image: parse(selectors::GALLERY_IMAGE)?,
            gallery_item: parse(selectors::GALLERY_ITEM)?,
            focusable: parse(selectors::FOCUSABLE)?,
            close_marker: parse(selectors::CLOSE_MARKER)?,
            form_control: parse(selectors::FORM_CONTROL)?,
            validate_form: parse(selectors::VALIDATE_FORM)?,
            delete_action: parse(selectors::DELETE_ACTION)?,
            tooltip_target: parse(selectors::TOOLTIP_TARGET)?,
            notification: parse(selectors::NOTIFICATION)?,
            notification_close: parse(selectors::NOTIFICATION_CLOSE)?,
        })
    }
}

pub struct AppContext {
    pub document: Document,
    pub scheduler: Scheduler,
    pub settings: Settings,
    pub selectors: CachedSelectors,
    /// Built on first lightbox construction, reused afterwards
    pub lightbox_overlay: Option<LightboxOverlay>,
    notification_container: Option<NodeId>,
    reloads: u32,
}

impl AppContext {
    pub fn new(document: Document, settings: Settings) -> Result<Self> {
        Ok(Self {
            document,
            scheduler: Scheduler::new(),
            settings,
            selectors: CachedSelectors::new()?,
            lightbox_overlay: None,
            notification_container: None,
            reloads: 0,
        })
    }

    /// Schedule work relative to the current virtual time
    pub fn schedule(&mut self, delay: Duration, task: Task) -> TaskId {
        self.scheduler.schedule(delay, task)
    }

    /// Advance the virtual clock, running every task that falls due
    pub fn advance(&mut self, by: Duration) {
        let until = self.scheduler.now() + by;
        while let Some((id, task)) = self.scheduler.pop_due(until) {
            debug!(?id, ?task, "running task");
            self.run_task(task);
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Focus(node) => {
                self.document.focus(node);
            }
            Task::RemoveNode(node) => {
                self.document.remove(node);
            }
            Task::ExpireNotification(node) => {
                if self.document.is_attached(node) {
                    self.document.add_class(node, classes::NOTIFICATION_EXIT);
                    let exit = self.settings.notification_exit();
                    self.scheduler.schedule(exit, Task::RemoveNode(node));
                }
            }
            Task::Reload => {
                self.reloads += 1;
                info!(url = %self.settings.page_url, "reloading page");
            }
        }
    }

    /// Number of page reloads performed so far
    pub fn reload_count(&self) -> u32 {
        self.reloads
    }

    /// The single toast container, created under body on first use
    pub fn notification_container(&mut self) -> NodeId {
        if let Some(container) = self.notification_container
            && self.document.is_attached(container)
        {
            return container;
        }
        let container = self.document.create_element("div");
        self.document.add_class(container, classes::NOTIFICATION_CONTAINER);
        let body = self.document.body();
        self.document.append_child(body, container);
        self.notification_container = Some(container);
        container
    }
}
