//! Focus containment for modal overlays
//!
//! The focusable set is a snapshot taken when the trap is installed.
//! Elements added to the container later do not join the tab cycle, and
//! removed ones are skipped by focus (the document refuses detached nodes).

use tracing::{debug, trace};

use crate::context::AppContext;
use crate::dom::{Event, EventKind, Key, ListenerId, NodeId};
use crate::scheduler::{Task, TaskId};

#[derive(Debug)]
pub struct FocusTrap {
    container: NodeId,
    focusables: Vec<NodeId>,
    listener: Option<ListenerId>,
    initial_focus: Option<TaskId>,
}

impl FocusTrap {
    /// Install a trap on `container` and schedule focus of its first focusable
    pub fn trap(ctx: &mut AppContext, container: NodeId) -> Self {
        let focusables = ctx.document.query_all(container, &ctx.selectors.focusable);
        let listener = ctx.document.add_listener(container, EventKind::KeyDown);

        let delay = ctx.settings.focus_delay();
        let initial_focus = focusables
            .first()
            .map(|first| ctx.schedule(delay, Task::Focus(*first)));

        debug!(container = ?container, focusables = focusables.len(), "focus trap installed");
        Self {
            container,
            focusables,
            listener: Some(listener),
            initial_focus,
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn focusables(&self) -> &[NodeId] {
        &self.focusables
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Handle a keydown inside the container.
    ///
    /// Tab and Shift+Tab wrap at the ends of the cycle. Escape returns the
    /// close affordance the caller should click, if the container has one.
    pub fn handle_key(&self, ctx: &mut AppContext, event: &mut Event) -> Option<NodeId> {
        if !self.is_active()
            || event.kind != EventKind::KeyDown
            || !ctx.document.contains(self.container, event.target)
        {
            return None;
        }

        match event.key {
            Some(Key::Tab) => {
                let (Some(&first), Some(&last)) = (self.focusables.first(), self.focusables.last())
                else {
                    return None;
                };
                let active = ctx.document.active_element();
                if event.shift_key {
                    if active == Some(first) {
                        event.prevent_default();
                        ctx.document.focus(last);
                        trace!("focus wrapped to last element");
                    }
                } else if active == Some(last) {
                    event.prevent_default();
                    ctx.document.focus(first);
                    trace!("focus wrapped to first element");
                }
                None
            }
            Some(Key::Escape) => ctx.document.query(self.container, &ctx.selectors.close_marker),
            _ => None,
        }
    }

    /// Remove the key listener and cancel the pending initial focus.
    /// Returns false when the trap was already released.
    pub fn release(&mut self, ctx: &mut AppContext) -> bool {
        let Some(listener) = self.listener.take() else {
            return false;
        };
        ctx.document.remove_listener(listener);
        if let Some(task) = self.initial_focus.take() {
            ctx.scheduler.cancel(task);
        }
        debug!(container = ?self.container, "focus trap released");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dom::Document;
    use std::time::Duration;

    struct Fixture {
        ctx: AppContext,
        container: NodeId,
        buttons: Vec<NodeId>,
    }

    fn fixture(button_count: usize) -> Fixture {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        let body = doc.body();
        doc.append_child(body, container);
        let buttons = (0..button_count)
            .map(|_| {
                let button = doc.create_element("button");
                doc.append_child(container, button);
                button
            })
            .collect();
        let ctx = AppContext::new(doc, Settings::default()).unwrap();
        Fixture {
            ctx,
            container,
            buttons,
        }
    }

    #[test]
    fn test_initial_focus_deferred() {
        let mut f = fixture(3);
        let _trap = FocusTrap::trap(&mut f.ctx, f.container);
        assert_eq!(f.ctx.document.active_element(), None);
        f.ctx.advance(Duration::from_millis(100));
        assert_eq!(f.ctx.document.active_element(), Some(f.buttons[0]));
    }

    #[test]
    fn test_tab_wraps_both_ways() {
        let mut f = fixture(3);
        let trap = FocusTrap::trap(&mut f.ctx, f.container);
        f.ctx.advance(Duration::from_millis(100));

        f.ctx.document.focus(f.buttons[2]);
        let mut tab = Event::key_down(f.buttons[2], Key::Tab);
        assert_eq!(trap.handle_key(&mut f.ctx, &mut tab), None);
        assert!(tab.is_default_prevented());
        assert_eq!(f.ctx.document.active_element(), Some(f.buttons[0]));

        let mut back = Event::key_down_shifted(f.buttons[0], Key::Tab);
        trap.handle_key(&mut f.ctx, &mut back);
        assert!(back.is_default_prevented());
        assert_eq!(f.ctx.document.active_element(), Some(f.buttons[2]));
    }

    #[test]
    fn test_tab_in_middle_not_prevented() {
        let mut f = fixture(3);
        let trap = FocusTrap::trap(&mut f.ctx, f.container);
        f.ctx.document.focus(f.buttons[1]);
        let mut tab = Event::key_down(f.buttons[1], Key::Tab);
        trap.handle_key(&mut f.ctx, &mut tab);
        assert!(!tab.is_default_prevented());
        assert_eq!(f.ctx.document.active_element(), Some(f.buttons[1]));
    }

    #[test]
    fn test_escape_finds_close_marker() {
        let mut f = fixture(2);
        f.ctx.document.set_attr(f.buttons[1], "data-close", "");
        let trap = FocusTrap::trap(&mut f.ctx, f.container);
        let mut esc = Event::key_down(f.buttons[0], Key::Escape);
        assert_eq!(trap.handle_key(&mut f.ctx, &mut esc), Some(f.buttons[1]));
    }

    #[test]
    fn test_release_twice() {
        let mut f = fixture(1);
        let mut trap = FocusTrap::trap(&mut f.ctx, f.container);
        assert_eq!(f.ctx.document.listener_count(f.container, EventKind::KeyDown), 1);

        assert!(trap.release(&mut f.ctx));
        assert!(!trap.release(&mut f.ctx));
        assert_eq!(f.ctx.document.listener_count(f.container, EventKind::KeyDown), 0);

        // pending initial focus was cancelled
        f.ctx.advance(Duration::from_millis(100));
        assert_eq!(f.ctx.document.active_element(), None);
    }

    #[test]
    fn test_zero_focusables() {
        let mut f = fixture(0);
        let trap = FocusTrap::trap(&mut f.ctx, f.container);
        assert!(trap.is_active());
        assert_eq!(f.ctx.scheduler.pending_count(), 0);
        let mut tab = Event::key_down(f.container, Key::Tab);
        trap.handle_key(&mut f.ctx, &mut tab);
        assert!(!tab.is_default_prevented());
    }

    #[test]
    fn test_focusables_are_a_snapshot() {
        let mut f = fixture(2);
        let trap = FocusTrap::trap(&mut f.ctx, f.container);
        let late = f.ctx.document.create_element("button");
        f.ctx.document.append_child(f.container, late);
        assert_eq!(trap.focusables(), f.buttons.as_slice());
    }

    #[test]
    fn test_skips_disabled_tabindex() {
        let mut f = fixture(1);
        let span = f.ctx.document.create_element("span");
        f.ctx.document.set_attr(span, "tabindex", "-1");
        f.ctx.document.append_child(f.container, span);
        let div = f.ctx.document.create_element("div");
        f.ctx.document.set_attr(div, "tabindex", "0");
        f.ctx.document.append_child(f.container, div);

        let trap = FocusTrap::trap(&mut f.ctx, f.container);
        assert_eq!(trap.focusables(), &[f.buttons[0], div]);
    }
}
