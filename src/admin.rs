//! Admin panel: delete actions, tooltips and the loading overlay
//!
//! Clicking a `[data-action="delete"]` trigger yields a [`DeleteRequest`].
//! After confirmation the request is sent through the fetch wrapper; success
//! schedules a page reload, failure raises an error notification.

use anyhow::{Context, Result, anyhow};
use std::io::{BufRead, Write};
use tracing::{error, info};

use crate::constants::{classes, messages};
use crate::context::AppContext;
use crate::dom::{Document, Event, EventKind, ListenerId, NodeId};
use crate::error_report;
use crate::http::{self, HttpClient};
use crate::notifications::{NotificationKind, show_notification};
use crate::scheduler::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    /// `href` or `data-url` of the trigger
    pub url: Option<String>,
    pub item_type: String,
    pub item_name: String,
}

impl DeleteRequest {
    pub fn new(url: &str, item_type: Option<&str>, item_name: Option<&str>) -> Self {
        Self {
            url: Some(url.to_string()),
            item_type: item_type.unwrap_or(messages::DEFAULT_ITEM_TYPE).to_string(),
            item_name: item_name.unwrap_or(messages::DEFAULT_ITEM_NAME).to_string(),
        }
    }

    /// Read the request from a trigger's attributes
    pub fn from_trigger(doc: &Document, trigger: NodeId) -> Self {
        let non_empty = |name: &str| doc.attr(trigger, name).filter(|v| !v.is_empty());
        Self {
            url: non_empty("href").or_else(|| non_empty("data-url")).map(str::to_string),
            item_type: non_empty("data-type").unwrap_or(messages::DEFAULT_ITEM_TYPE).to_string(),
            item_name: non_empty("data-name").unwrap_or(messages::DEFAULT_ITEM_NAME).to_string(),
        }
    }

    pub fn confirmation_message(&self) -> String {
        format!(
            "¿Estás seguro de que quieres eliminar {} \"{}\"?\n\nEsta acción no se puede deshacer.",
            self.item_type, self.item_name
        )
    }
}

/// Asks the user to confirm a destructive action
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

/// Confirms everything (`--yes`)
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _message: &str) -> bool {
        true
    }
}

/// Line-based prompt; accepts `s`, `si`, `sí`, `y` and `yes`
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        if write!(self.output, "{message}\n[s/N] ").and_then(|_| self.output.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        if self.input.read_line(&mut answer).is_err() {
            return false;
        }
        matches!(
            answer.trim().to_lowercase().as_str(),
            "s" | "si" | "sí" | "y" | "yes"
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted { status: u16 },
    Failed { error: String },
}

pub struct AdminPanel {
    client: HttpClient,
    listeners: Vec<ListenerId>,
}

impl AdminPanel {
    pub fn new(ctx: &mut AppContext) -> Result<Self> {
        let client = HttpClient::new(ctx.settings.request_timeout())
            .context("Failed to build HTTP client for admin actions")?;

        let root = ctx.document.root();
        let mut listeners = vec![ctx.document.add_listener(root, EventKind::Click)];
        let targets = ctx.document.query_all(root, &ctx.selectors.tooltip_target);
        for target in &targets {
            listeners.push(ctx.document.add_listener(*target, EventKind::MouseEnter));
            listeners.push(ctx.document.add_listener(*target, EventKind::MouseLeave));
        }
        info!(tooltips = targets.len(), "admin panel initialized");
        Ok(Self { client, listeners })
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Intercept a click on a delete trigger (or anything inside one)
    pub fn handle_click(&self, ctx: &AppContext, event: &mut Event) -> Option<DeleteRequest> {
        if !self.is_attached() || event.kind != EventKind::Click {
            return None;
        }
        let trigger = ctx.document.closest(event.target, &ctx.selectors.delete_action)?;
        event.prevent_default();
        Some(DeleteRequest::from_trigger(&ctx.document, trigger))
    }

    /// Confirm, then delete
    pub async fn run_delete(
        &self,
        ctx: &mut AppContext,
        request: &DeleteRequest,
        confirm: &mut dyn Confirm,
    ) -> DeleteOutcome {
        if !confirm.confirm(&request.confirmation_message()) {
            info!(item = %request.item_name, "delete cancelled");
            return DeleteOutcome::Cancelled;
        }
        self.perform_delete(ctx, request).await
    }

    pub async fn perform_delete(&self, ctx: &mut AppContext, request: &DeleteRequest) -> DeleteOutcome {
        show_loading(&mut ctx.document);
        let result = self.send(ctx, request).await;
        hide_loading(&mut ctx.document);

        match result {
            Ok(status) => {
                show_notification(ctx, messages::DELETE_SUCCESS, NotificationKind::Success);
                let delay = ctx.settings.reload_delay();
                ctx.schedule(delay, Task::Reload);
                info!(status, item_type = %request.item_type, item = %request.item_name, "item deleted");
                DeleteOutcome::Deleted { status }
            }
            Err(err) => {
                error!(error = %err, url = ?request.url, "Error deleting");
                error_report::report_error(ctx, "Delete", &err);
                show_notification(ctx, messages::DELETE_FAILURE, NotificationKind::Error);
                DeleteOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    async fn send(&self, ctx: &AppContext, request: &DeleteRequest) -> Result<u16> {
        let href = request
            .url
            .as_deref()
            .ok_or_else(|| anyhow!("delete trigger has no href or data-url"))?;
        let url = http::resolve_url(&ctx.settings.page_url, href)?;
        let response = self.client.get(&url).await?;
        Ok(response.status)
    }

    /// Drop click and hover listeners
    pub fn detach(&mut self, ctx: &mut AppContext) {
        for listener in self.listeners.drain(..) {
            ctx.document.remove_listener(listener);
        }
    }
}

/// Show a `div.tooltip` with the target's `data-tooltip` text
pub fn show_tooltip(doc: &mut Document, target: NodeId) -> Option<NodeId> {
    let text = doc.attr(target, "data-tooltip").filter(|t| !t.is_empty())?.to_string();
    let tooltip = doc.create_element("div");
    doc.add_class(tooltip, classes::TOOLTIP);
    doc.set_text(tooltip, &text);
    let body = doc.body();
    doc.append_child(body, tooltip);
    Some(tooltip)
}

/// Remove the first tooltip in the document, if any
pub fn hide_tooltip(doc: &mut Document) -> bool {
    match find_by_class(doc, classes::TOOLTIP) {
        Some(tooltip) => doc.remove(tooltip),
        None => false,
    }
}

/// Show the loading overlay; at most one exists at a time
pub fn show_loading(doc: &mut Document) -> NodeId {
    if let Some(existing) = find_by_class(doc, classes::LOADING_OVERLAY) {
        return existing;
    }
    let overlay = doc.create_element("div");
    doc.add_class(overlay, classes::LOADING_OVERLAY);
    let spinner_box = doc.create_element("div");
    doc.add_class(spinner_box, classes::LOADING_SPINNER);
    let spinner = doc.create_element("div");
    doc.add_class(spinner, "spinner");
    let text = doc.create_element("div");
    doc.add_class(text, classes::LOADING_TEXT);
    doc.set_text(text, messages::LOADING);

    doc.append_child(spinner_box, spinner);
    doc.append_child(spinner_box, text);
    doc.append_child(overlay, spinner_box);
    let body = doc.body();
    doc.append_child(body, overlay);
    overlay
}

pub fn hide_loading(doc: &mut Document) -> bool {
    match find_by_class(doc, classes::LOADING_OVERLAY) {
        Some(overlay) => doc.remove(overlay),
        None => false,
    }
}

fn find_by_class(doc: &Document, class: &str) -> Option<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .find(|node| doc.has_class(*node, class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/admin/")
    }

    fn ctx_with_trigger(attrs: &[(&str, &str)]) -> (AppContext, NodeId) {
        let mut doc = Document::new();
        let link = doc.create_element("a");
        doc.set_attr(link, "data-action", "delete");
        for (name, value) in attrs {
            doc.set_attr(link, name, value);
        }
        let icon = doc.create_element("i");
        doc.append_child(link, icon);
        let body = doc.body();
        doc.append_child(body, link);
        (AppContext::new(doc, Settings::default()).unwrap(), link)
    }

    fn notification_texts(ctx: &AppContext) -> Vec<String> {
        let doc = &ctx.document;
        doc.descendants(doc.root())
            .into_iter()
            .filter(|n| doc.has_class(*n, "notification-text"))
            .map(|n| doc.text(n).to_string())
            .collect()
    }

    struct Refuse(Vec<String>);

    impl Confirm for Refuse {
        fn confirm(&mut self, message: &str) -> bool {
            self.0.push(message.to_string());
            false
        }
    }

    #[test]
    fn test_request_defaults() {
        let (ctx, link) = ctx_with_trigger(&[("data-url", "/imagen/4/eliminar")]);
        let request = DeleteRequest::from_trigger(&ctx.document, link);
        assert_eq!(request.url.as_deref(), Some("/imagen/4/eliminar"));
        assert_eq!(request.item_type, "elemento");
        assert_eq!(request.item_name, "este elemento");
        assert_eq!(
            request.confirmation_message(),
            "¿Estás seguro de que quieres eliminar elemento \"este elemento\"?\n\nEsta acción no se puede deshacer."
        );
    }

    #[test]
    fn test_href_preferred_over_data_url() {
        let (ctx, link) = ctx_with_trigger(&[
            ("href", "/servicio/1/eliminar"),
            ("data-url", "/otro"),
            ("data-type", "servicio"),
            ("data-name", "Fade"),
        ]);
        let request = DeleteRequest::from_trigger(&ctx.document, link);
        assert_eq!(request.url.as_deref(), Some("/servicio/1/eliminar"));
        assert!(request.confirmation_message().starts_with("¿Estás seguro de que quieres eliminar servicio \"Fade\"?"));
    }

    #[tokio::test]
    async fn test_click_inside_trigger() {
        let (mut ctx, link) = ctx_with_trigger(&[("href", "/x")]);
        let panel = AdminPanel::new(&mut ctx).unwrap();
        let icon = ctx.document.children(link)[0];
        let mut click = Event::click(icon);
        assert!(panel.handle_click(&ctx, &mut click).is_some());
        assert!(click.is_default_prevented());

        let body = ctx.document.body();
        assert!(panel.handle_click(&ctx, &mut Event::click(body)).is_none());
    }

    #[tokio::test]
    async fn test_successful_delete_schedules_reload() {
        let base = serve_once("HTTP/1.1 302 Found\r\nlocation: /admin\r\ncontent-length: 0\r\n\r\n").await;
        let (mut ctx, link) = ctx_with_trigger(&[("href", "servicio/2/eliminar")]);
        ctx.settings.page_url = base;
        let panel = AdminPanel::new(&mut ctx).unwrap();
        let request = DeleteRequest::from_trigger(&ctx.document, link);

        let outcome = panel.run_delete(&mut ctx, &request, &mut AssumeYes).await;
        assert_eq!(outcome, DeleteOutcome::Deleted { status: 302 });
        assert_eq!(notification_texts(&ctx), vec!["Elemento eliminado correctamente"]);
        assert_eq!(find_by_class(&ctx.document, "loading-overlay"), None);

        ctx.advance(Duration::from_millis(999));
        assert_eq!(ctx.reload_count(), 0);
        ctx.advance(Duration::from_millis(1));
        assert_eq!(ctx.reload_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_notifies() {
        let base = serve_once("HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\n\r\n").await;
        let (mut ctx, link) = ctx_with_trigger(&[("href", "/servicio/9/eliminar")]);
        ctx.settings.page_url = base;
        let panel = AdminPanel::new(&mut ctx).unwrap();
        let request = DeleteRequest::from_trigger(&ctx.document, link);

        let outcome = panel.perform_delete(&mut ctx, &request).await;
        assert_eq!(
            outcome,
            DeleteOutcome::Failed {
                error: "HTTP 500: Internal Server Error".to_string()
            }
        );
        assert_eq!(notification_texts(&ctx), vec!["Error al eliminar el elemento"]);
        ctx.advance(Duration::from_secs(2));
        assert_eq!(ctx.reload_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_url_fails() {
        let (mut ctx, link) = ctx_with_trigger(&[]);
        let panel = AdminPanel::new(&mut ctx).unwrap();
        let request = DeleteRequest::from_trigger(&ctx.document, link);
        let outcome = panel.perform_delete(&mut ctx, &request).await;
        assert!(matches!(outcome, DeleteOutcome::Failed { .. }));
        assert_eq!(notification_texts(&ctx), vec!["Error al eliminar el elemento"]);
    }

    #[tokio::test]
    async fn test_cancelled_delete_sends_nothing() {
        let (mut ctx, link) = ctx_with_trigger(&[("href", "http://192.0.2.1/nunca"), ("data-name", "Barba")]);
        let panel = AdminPanel::new(&mut ctx).unwrap();
        let request = DeleteRequest::from_trigger(&ctx.document, link);
        let mut refuse = Refuse(Vec::new());

        let outcome = panel.run_delete(&mut ctx, &request, &mut refuse).await;
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(refuse.0.len(), 1);
        assert!(refuse.0[0].contains("\"Barba\""));
        assert!(notification_texts(&ctx).is_empty());
    }

    #[test]
    fn test_prompt_confirm() {
        let mut out = Vec::new();
        let mut prompt = PromptConfirm::new("sí\n".as_bytes(), &mut out);
        assert!(prompt.confirm("¿Eliminar?"));
        let mut prompt = PromptConfirm::new("\n".as_bytes(), Vec::new());
        assert!(!prompt.confirm("¿Eliminar?"));
        assert!(String::from_utf8(out).unwrap().starts_with("¿Eliminar?"));
    }

    #[test]
    fn test_loading_overlay_single() {
        let mut doc = Document::new();
        let first = show_loading(&mut doc);
        assert_eq!(show_loading(&mut doc), first);
        assert!(hide_loading(&mut doc));
        assert!(!hide_loading(&mut doc));
    }

    #[test]
    fn test_tooltips() {
        let mut doc = Document::new();
        let target = doc.create_element("a");
        doc.set_attr(target, "data-tooltip", "Eliminar servicio");
        let plain = doc.create_element("a");
        let body = doc.body();
        doc.append_child(body, target);
        doc.append_child(body, plain);

        let tooltip = show_tooltip(&mut doc, target).unwrap();
        assert!(doc.has_class(tooltip, "tooltip"));
        assert_eq!(doc.text(tooltip), "Eliminar servicio");
        assert_eq!(doc.parent(tooltip), Some(body));
        assert_eq!(show_tooltip(&mut doc, plain), None);

        assert!(hide_tooltip(&mut doc));
        assert!(!hide_tooltip(&mut doc));
    }
}
