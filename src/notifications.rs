//! Toast notifications
//!
//! Toasts live in the context's single `.notification-container` and expire on
//! their own through the scheduler.

use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::constants::classes;
use crate::context::AppContext;
use crate::dom::NodeId;
use crate::scheduler::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl NotificationKind {
    pub fn icon(self) -> &'static str {
        match self {
            NotificationKind::Success => "✓",
            NotificationKind::Error => "✕",
            NotificationKind::Warning => "⚠",
            NotificationKind::Info => "ℹ",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown kinds fall back to `Info`
impl FromStr for NotificationKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "success" => NotificationKind::Success,
            "error" => NotificationKind::Error,
            "warning" => NotificationKind::Warning,
            _ => NotificationKind::Info,
        })
    }
}

/// Append a toast and schedule its expiry
pub fn show_notification(ctx: &mut AppContext, message: &str, kind: NotificationKind) -> NodeId {
    let container = ctx.notification_container();
    let doc = &mut ctx.document;

    let toast = doc.create_element("div");
    doc.add_class(toast, classes::NOTIFICATION);
    doc.add_class(toast, &format!("{}-{}", classes::NOTIFICATION, kind));

    let content = doc.create_element("div");
    doc.add_class(content, classes::NOTIFICATION_CONTENT);
    doc.append_child(toast, content);

    for (tag, class, text) in [
        ("span", classes::NOTIFICATION_ICON, kind.icon()),
        ("span", classes::NOTIFICATION_TEXT, message),
        ("button", classes::NOTIFICATION_CLOSE, "×"),
    ] {
        let part = doc.create_element(tag);
        doc.add_class(part, class);
        doc.set_text(part, text);
        doc.append_child(content, part);
    }
    doc.append_child(container, toast);

    let lifetime = ctx.settings.notification_duration();
    ctx.schedule(lifetime, Task::ExpireNotification(toast));
    info!(kind = kind.as_str(), message, "notification shown");
    toast
}

/// Handle a click on a toast's close button. Returns true if a toast was removed
pub fn handle_close_click(ctx: &mut AppContext, target: NodeId) -> bool {
    let doc = &ctx.document;
    let Some(button) = doc.closest(target, &ctx.selectors.notification_close) else {
        return false;
    };
    let Some(toast) = doc.closest(button, &ctx.selectors.notification) else {
        return false;
    };
    debug!(toast = ?toast, "notification dismissed");
    ctx.document.remove(toast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dom::Document;
    use std::time::Duration;

    fn ctx() -> AppContext {
        AppContext::new(Document::new(), Settings::default()).unwrap()
    }

    #[test]
    fn test_toast_structure() {
        let mut ctx = ctx();
        let toast = show_notification(&mut ctx, "Elemento eliminado correctamente", NotificationKind::Success);
        let doc = &ctx.document;
        assert!(doc.has_class(toast, "notification"));
        assert!(doc.has_class(toast, "notification-success"));

        let content = doc.children(toast)[0];
        let parts = doc.children(content);
        assert_eq!(doc.text(parts[0]), "✓");
        assert_eq!(doc.text(parts[1]), "Elemento eliminado correctamente");
        assert!(doc.has_class(parts[2], "notification-close"));

        let container = doc.parent(toast).unwrap();
        assert!(doc.has_class(container, "notification-container"));
    }

    #[test]
    fn test_toasts_share_container() {
        let mut ctx = ctx();
        let a = show_notification(&mut ctx, "uno", NotificationKind::Info);
        let b = show_notification(&mut ctx, "dos", NotificationKind::Error);
        assert_eq!(ctx.document.parent(a), ctx.document.parent(b));
    }

    #[test]
    fn test_expiry() {
        let mut ctx = ctx();
        let toast = show_notification(&mut ctx, "Hola", NotificationKind::Warning);
        ctx.advance(Duration::from_millis(4999));
        assert!(!ctx.document.has_class(toast, "notification-exit"));
        ctx.advance(Duration::from_millis(1));
        assert!(ctx.document.has_class(toast, "notification-exit"));
        ctx.advance(Duration::from_millis(300));
        assert!(!ctx.document.is_attached(toast));
    }

    #[test]
    fn test_close_button() {
        let mut ctx = ctx();
        let toast = show_notification(&mut ctx, "Hola", NotificationKind::Info);
        let content = ctx.document.children(toast)[0];
        let close = ctx.document.children(content)[2];
        assert!(handle_close_click(&mut ctx, close));
        assert!(!ctx.document.is_attached(toast));

        // the pending expiry is harmless once the toast is gone
        ctx.advance(Duration::from_secs(6));
        assert_eq!(ctx.scheduler.pending_count(), 0);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("error".parse::<NotificationKind>().unwrap(), NotificationKind::Error);
        assert_eq!("otro".parse::<NotificationKind>().unwrap(), NotificationKind::Info);
        assert_eq!(NotificationKind::Warning.icon(), "⚠");
    }
}
