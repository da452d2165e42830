#![forbid(unsafe_code)]

pub mod a11y;
pub mod admin;
pub mod app;
pub mod config;
pub mod constants;
pub mod context;
pub mod dom;
pub mod error_report;
pub mod focus_trap;
pub mod http;
pub mod lightbox;
pub mod notifications;
pub mod page;
pub mod scheduler;
pub mod theme;
pub mod validation;
