#![forbid(unsafe_code)]

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::{Level as TraceLevel, error, info};
use tracing_subscriber::FmtSubscriber;

use barberia_ui::admin::{AssumeYes, Confirm, DeleteOutcome, DeleteRequest, PromptConfirm};
use barberia_ui::app::App;
use barberia_ui::config::{Settings, Storage};
use barberia_ui::dom::{Document, Event, Key};
use barberia_ui::error_report;
use barberia_ui::page::{self, PageSpec};
use barberia_ui::theme::{self, Theme};
use barberia_ui::validation::SubmitOutcome;

/// Headless driver for the barber shop front-end
#[derive(Parser, Debug)]
#[command(name = "barberia-ui", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage file for persisted preferences
    #[arg(long, global = true)]
    storage: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the gallery lightbox and replay keys
    Gallery {
        /// Page description (JSON)
        page: PathBuf,
        /// Image to open, counting from 1
        #[arg(long, default_value_t = 1)]
        open: usize,
        /// Keys to press, e.g. ArrowRight,ArrowRight,Escape
        #[arg(long, value_delimiter = ',')]
        keys: Vec<Key>,
    },

    /// Fill a form, submit it and print validation errors
    Validate {
        page: PathBuf,
        /// `id` of the form to submit
        #[arg(long)]
        form: String,
        /// Field values as name=value
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },

    /// Delete an item through the admin endpoint
    Delete {
        /// Absolute or page-relative URL of the delete endpoint
        url: String,
        #[arg(long = "type")]
        item_type: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show or set the colour theme
    Theme {
        theme: Option<Theme>,
        /// Report the system preference as dark
        #[arg(long)]
        prefers_dark: bool,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got '{raw}'"))?;
    if name.trim().is_empty() {
        bail!("empty field name in '{raw}'");
    }
    Ok((name.trim().to_string(), value.to_string()))
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.config {
        Some(path) => {
            let mut settings = Settings::load_from(path)?;
            settings.apply_overrides(|var| std::env::var(var).ok());
            settings.validate_and_clamp();
            Ok(settings)
        }
        None => Settings::load(),
    }
}

fn open_page(path: &PathBuf, mut settings: Settings, storage: &Storage) -> Result<App> {
    let spec = PageSpec::load(path)?;
    if let Some(url) = &spec.url {
        settings.page_url = url.clone();
    }
    App::init(spec.build(), settings, storage, false)
}

fn run_gallery(app: &mut App, open: usize, keys: &[Key]) -> Result<()> {
    let thumbnails: Vec<_> = app
        .lightbox()
        .map(|lb| lb.images().iter().map(|e| e.element).collect())
        .unwrap_or_default();
    let thumbnail = open
        .checked_sub(1)
        .and_then(|i| thumbnails.get(i).copied())
        .with_context(|| format!("image {open} not found, page has {} images", thumbnails.len()))?;

    app.dispatch(Event::click(thumbnail));
    app.advance(app.ctx.settings.focus_delay());

    for key in keys {
        let target = app
            .ctx
            .document
            .active_element()
            .unwrap_or(app.ctx.document.root());
        app.dispatch(Event::key_down(target, key.clone()));
        info!(%key, "key pressed");
    }

    let lightbox = app.lightbox().context("page has no gallery")?;
    let overlay = lightbox.overlay();
    let doc = &app.ctx.document;
    println!("open: {}", lightbox.is_open());
    println!("index: {}", lightbox.current_index());
    println!("counter: {}", doc.text(overlay.counter));
    println!("caption: {}", doc.text(overlay.caption));
    println!("src: {}", doc.attr(overlay.image, "src").unwrap_or_default());
    Ok(())
}

fn run_validate(app: &mut App, form_id: &str, values: &[(String, String)]) -> Result<bool> {
    let form = page::element_by_id(&app.ctx.document, form_id)
        .with_context(|| format!("form '{form_id}' not found"))?;
    if app.validator(form).is_none() {
        bail!("form '{form_id}' is not a validated form");
    }

    for (name, value) in values {
        let field = page::field_by_name(&app.ctx.document, form, name)
            .with_context(|| format!("field '{name}' not found in form '{form_id}'"))?;
        app.ctx.document.set_value(field, value);
    }

    let result = app.dispatch(Event::submit(form));
    let errors = app.validator(form).map(|v| v.errors()).unwrap_or_default();
    match result.submit {
        Some(SubmitOutcome::Blocked { first_invalid }) => {
            let focused = first_invalid
                .and_then(|field| app.ctx.document.attr(field, "name"))
                .unwrap_or_default();
            println!("submission blocked, focus on '{focused}'");
            for (field, message) in &errors {
                println!("  {field}: {message}");
            }
            Ok(false)
        }
        _ => {
            println!("submission allowed");
            Ok(true)
        }
    }
}

fn run_delete(
    settings: Settings,
    storage: &Storage,
    request: &DeleteRequest,
    yes: bool,
) -> Result<bool> {
    let reload_delay = settings.reload_delay();
    let mut app = App::init(Document::new(), settings, storage, false)?;

    let mut confirm: Box<dyn Confirm> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(PromptConfirm::new(io::stdin().lock(), io::stdout()))
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let outcome = runtime.block_on(app.run_delete(request, confirm.as_mut()));

    match outcome {
        DeleteOutcome::Cancelled => {
            println!("cancelled");
            Ok(true)
        }
        DeleteOutcome::Deleted { status } => {
            println!("deleted (HTTP {status})");
            app.advance(reload_delay);
            Ok(true)
        }
        DeleteOutcome::Failed { error } => {
            println!("failed: {error}");
            Ok(false)
        }
    }
}

fn run_theme(storage: &mut Storage, choice: Option<Theme>, prefers_dark: bool) -> Result<()> {
    let mut doc = Document::new();
    match choice {
        Some(theme) => {
            theme::set_theme(&mut doc, storage, theme)?;
            println!("theme set to {theme}");
        }
        None => {
            let theme = theme::setup(&mut doc, storage, prefers_dark);
            let source = if theme::stored(storage).is_some() { "stored" } else { "system" };
            println!("{theme} ({source})");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    error_report::install_panic_hook(&settings);
    info!(config = ?settings, "loaded settings");

    let mut storage = Storage::open(cli.storage.clone().unwrap_or_else(Storage::default_path));

    let ok = match &cli.command {
        Command::Gallery { page, open, keys } => {
            let mut app = open_page(page, settings, &storage)?;
            run_gallery(&mut app, *open, keys).map(|_| true)
        }
        Command::Validate { page, form, values } => {
            let mut app = open_page(page, settings, &storage)?;
            run_validate(&mut app, form, values)
        }
        Command::Delete { url, item_type, name, yes } => {
            let request = DeleteRequest::new(url, item_type.as_deref(), name.as_deref());
            run_delete(settings, &storage, &request, *yes)
        }
        Command::Theme { theme, prefers_dark } => {
            run_theme(&mut storage, *theme, *prefers_dark).map(|_| true)
        }
    };

    match ok {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!(error = ?err, "command failed");
            Err(err.into())
        }
    }
}
