//! Screen reader announcements

use tracing::debug;

use crate::constants::classes;
use crate::context::AppContext;
use crate::dom::NodeId;
use crate::scheduler::Task;

/// `aria-live` politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Polite,
    Assertive,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Polite => "polite",
            Priority::Assertive => "assertive",
        }
    }
}

/// Append a visually hidden live region carrying `message` to body and
/// schedule its removal. Empty messages are ignored.
pub fn announce(ctx: &mut AppContext, message: &str, priority: Priority) -> Option<NodeId> {
    if message.is_empty() {
        return None;
    }

    let doc = &mut ctx.document;
    let region = doc.create_element("div");
    doc.set_attr(region, "aria-live", priority.as_str());
    doc.set_attr(region, "aria-atomic", "true");
    doc.add_class(region, classes::SCREEN_READER_ONLY);
    doc.set_text(region, message);
    let body = doc.body();
    doc.append_child(body, region);

    let lifetime = ctx.settings.announce_duration();
    ctx.schedule(lifetime, Task::RemoveNode(region));
    debug!(message, priority = priority.as_str(), "announced");
    Some(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dom::Document;
    use std::time::Duration;

    #[test]
    fn test_announcer_removed_after_lifetime() {
        let mut ctx = AppContext::new(Document::new(), Settings::default()).unwrap();
        let region = announce(&mut ctx, "Galería de imágenes abierta", Priority::Polite).unwrap();

        assert_eq!(ctx.document.attr(region, "aria-live"), Some("polite"));
        assert_eq!(ctx.document.attr(region, "aria-atomic"), Some("true"));
        assert!(ctx.document.has_class(region, "sr-only"));
        assert_eq!(ctx.document.text(region), "Galería de imágenes abierta");

        ctx.advance(Duration::from_millis(1000));
        assert!(!ctx.document.is_attached(region));
    }

    #[test]
    fn test_empty_message_ignored() {
        let mut ctx = AppContext::new(Document::new(), Settings::default()).unwrap();
        assert_eq!(announce(&mut ctx, "", Priority::Assertive), None);
        assert!(ctx.document.children(ctx.document.body()).is_empty());
    }
}
