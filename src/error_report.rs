//! Structured reports for unexpected errors
//!
//! Reports are always logged. Outside local development hosts they are also
//! handed to [`forward`], which only logs until a collector exists.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value};
use std::panic::PanicHookInfo;
use tracing::{error, info};

use crate::config::Settings;
use crate::context::AppContext;
use crate::dom::Viewport;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub error: String,
    /// Causes below the top-level error, outermost first
    pub stack: Option<String>,
    pub url: String,
    pub viewport: Viewport,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorReport {
    pub fn new(context: &str, error: &anyhow::Error, url: &str, viewport: Viewport) -> Self {
        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        Self {
            timestamp: Utc::now(),
            context: context.to_string(),
            error: error.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
            url: url.to_string(),
            viewport,
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// True when `url` points at one of the local development hosts
pub fn is_local(url: &str, local_hosts: &[String]) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .is_some_and(|host| local_hosts.iter().any(|local| *local == host))
}

/// Log a report and forward it when not running locally. Returns whether it was forwarded
pub fn log_error(report: &ErrorReport, local_hosts: &[String]) -> bool {
    let payload = serde_json::to_string(report).unwrap_or_else(|e| format!("<unserializable report: {e}>"));
    error!(context = %report.context, error = %report.error, report = %payload, "Error logged");

    if is_local(&report.url, local_hosts) {
        return false;
    }
    forward(report);
    true
}

fn forward(report: &ErrorReport) {
    // TODO: post to the hosted error collector once the admin site has one
    info!(context = %report.context, url = %report.url, "Would send to logging service");
}

/// Build and log a report for an error caught at a component boundary
pub fn report_error(ctx: &AppContext, context: &str, err: &anyhow::Error) -> ErrorReport {
    let report = ErrorReport::new(context, err, &ctx.settings.page_url, ctx.document.viewport());
    log_error(&report, &ctx.settings.local_hosts);
    report
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// Route panics through the error reporter
pub fn install_panic_hook(settings: &Settings) {
    let url = settings.page_url.clone();
    let local_hosts = settings.local_hosts.clone();
    std::panic::set_hook(Box::new(move |info| {
        let err = anyhow::anyhow!(panic_message(info));
        let mut report = ErrorReport::new("Panic", &err, &url, Viewport::default());
        if let Some(location) = info.location() {
            report = report
                .with_extra("filename", location.file())
                .with_extra("lineno", location.line())
                .with_extra("colno", location.column());
        }
        log_error(&report, &local_hosts);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn hosts() -> Vec<String> {
        Settings::default().local_hosts
    }

    #[test]
    fn test_is_local() {
        assert!(is_local("http://localhost:5000/admin", &hosts()));
        assert!(is_local("http://127.0.0.1/", &hosts()));
        assert!(!is_local("https://barberia.example/", &hosts()));
        assert!(!is_local("no es url", &hosts()));
    }

    #[test]
    fn test_report_fields() {
        let err = Err::<(), _>(anyhow::anyhow!("connection reset"))
            .context("Failed to delete servicio")
            .unwrap_err();
        let report = ErrorReport::new("Delete", &err, "https://barberia.example/admin", Viewport::default())
            .with_extra("attempt", 1);

        assert_eq!(report.error, "Failed to delete servicio");
        assert_eq!(report.stack.as_deref(), Some("connection reset"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["context"], "Delete");
        assert_eq!(json["viewport"]["width"], 1280);
        assert_eq!(json["attempt"], 1);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_report_uses_page_viewport() {
        let mut doc = crate::dom::Document::new();
        doc.set_viewport(Viewport { width: 390, height: 844 });
        let settings = Settings {
            page_url: "https://barberia.example/admin".to_string(),
            ..Settings::default()
        };
        let ctx = AppContext::new(doc, settings).unwrap();

        let report = report_error(&ctx, "Delete", &anyhow::anyhow!("HTTP 500: Internal Server Error"));
        assert_eq!(report.viewport, Viewport { width: 390, height: 844 });
        assert_eq!(report.url, "https://barberia.example/admin");
        assert_eq!(report.context, "Delete");
    }

    #[test]
    fn test_forwarding_only_outside_local_hosts() {
        let err = anyhow::anyhow!("boom");
        let local = ErrorReport::new("x", &err, "http://localhost:5000/", Viewport::default());
        let remote = ErrorReport::new("x", &err, "https://barberia.example/", Viewport::default());
        assert!(!log_error(&local, &hosts()));
        assert!(log_error(&remote, &hosts()));
    }
}
