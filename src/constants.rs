//! Application-wide constants
//!
//! Selectors, class names, user-facing messages and timings used throughout
//! the front-end, kept in one place so markup and behavior stay in sync.

/// CSS selectors understood by the headless document
pub mod selectors {
    /// Gallery thumbnails, scanned in document order
    pub const GALLERY_IMAGE: &str = ".gallery-item img";

    /// Gallery item containers (presence enables the lightbox)
    pub const GALLERY_ITEM: &str = ".gallery-item";

    /// Elements that take part in the focus trap's tab cycle
    pub const FOCUSABLE: &str = concat!(
        "a[href], button, textarea, input[type=\"text\"], input[type=\"radio\"], ",
        "input[type=\"checkbox\"], select, [tabindex]:not([tabindex=\"-1\"])"
    );

    /// Close affordance triggered by Escape inside a focus trap
    pub const CLOSE_MARKER: &str = "[data-close], .lightbox-close, .modal-close";

    /// Form controls validated by the field validator
    pub const FORM_CONTROL: &str = "input, textarea, select";

    /// Forms that get a validator on page init
    pub const VALIDATE_FORM: &str = "form.validate-form";

    /// Admin delete triggers
    pub const DELETE_ACTION: &str = "[data-action=\"delete\"]";

    /// Elements with hover tooltips
    pub const TOOLTIP_TARGET: &str = "[data-tooltip]";

    /// Close button inside a notification toast
    pub const NOTIFICATION_CLOSE: &str = ".notification-close";

    /// A notification toast
    pub const NOTIFICATION: &str = ".notification";
}

/// Class names toggled by components
pub mod classes {
    pub const LIGHTBOX: &str = "gallery-lightbox";
    pub const LIGHTBOX_BACKDROP: &str = "lightbox-overlay";
    pub const LIGHTBOX_CONTAINER: &str = "lightbox-container";
    pub const LIGHTBOX_CLOSE: &str = "lightbox-close";
    pub const LIGHTBOX_PREV: &str = "lightbox-prev";
    pub const LIGHTBOX_NEXT: &str = "lightbox-next";
    pub const LIGHTBOX_CONTENT: &str = "lightbox-content";
    pub const LIGHTBOX_IMAGE: &str = "lightbox-image";
    pub const LIGHTBOX_CAPTION: &str = "lightbox-caption";
    pub const LIGHTBOX_COUNTER: &str = "lightbox-counter";

    pub const FIELD_VALID: &str = "field-valid";
    pub const FIELD_INVALID: &str = "field-invalid";
    pub const FIELD_ERROR: &str = "field-error";

    pub const SCREEN_READER_ONLY: &str = "sr-only";

    pub const NOTIFICATION_CONTAINER: &str = "notification-container";
    pub const NOTIFICATION: &str = "notification";
    pub const NOTIFICATION_CONTENT: &str = "notification-content";
    pub const NOTIFICATION_ICON: &str = "notification-icon";
    pub const NOTIFICATION_TEXT: &str = "notification-text";
    pub const NOTIFICATION_CLOSE: &str = "notification-close";
    pub const NOTIFICATION_EXIT: &str = "notification-exit";

    pub const LOADING_OVERLAY: &str = "loading-overlay";
    pub const LOADING_SPINNER: &str = "loading-spinner";
    pub const LOADING_TEXT: &str = "loading-text";

    pub const TOOLTIP: &str = "tooltip";
    pub const VALIDATE_FORM: &str = "validate-form";
}

/// User-facing text (the site is in Spanish)
pub mod messages {
    pub const LIGHTBOX_LABEL: &str = "Galería de imágenes";
    pub const LIGHTBOX_CLOSE_LABEL: &str = "Cerrar galería";
    pub const LIGHTBOX_PREV_LABEL: &str = "Imagen anterior";
    pub const LIGHTBOX_NEXT_LABEL: &str = "Imagen siguiente";
    pub const LIGHTBOX_OPENED: &str = "Galería de imágenes abierta";
    pub const LIGHTBOX_CLOSED: &str = "Galería de imágenes cerrada";
    pub const DEFAULT_IMAGE_ALT: &str = "Imagen de galería";

    pub const DEFAULT_ITEM_TYPE: &str = "elemento";
    pub const DEFAULT_ITEM_NAME: &str = "este elemento";
    pub const DELETE_SUCCESS: &str = "Elemento eliminado correctamente";
    pub const DELETE_FAILURE: &str = "Error al eliminar el elemento";
    pub const LOADING: &str = "Procesando...";
    pub const FORM_ERRORS: &str = "Por favor, corrige los errores en el formulario";

    /// Used when a failing rule has no message configured
    pub const FALLBACK_FIELD_ERROR: &str = "Valor inválido";
}

/// Default timings (milliseconds), overridable through the config file
pub mod timing {
    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;
    pub const RELOAD_DELAY_MS: u64 = 1_000;
    pub const ANNOUNCE_DURATION_MS: u64 = 1_000;
    pub const NOTIFICATION_DURATION_MS: u64 = 5_000;
    pub const NOTIFICATION_EXIT_MS: u64 = 300;
    pub const FOCUS_DELAY_MS: u64 = 100;
}

/// Request headers sent by the fetch wrapper
pub mod http {
    /// Lowercase, as `HeaderName::from_static` requires
    pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";
    pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    /// Redirect status accepted as success for GET deletes
    pub const FOUND: u16 = 302;
}

/// Config file locations
pub mod config {
    pub const APP_DIR: &str = "barberia-ui";
    pub const FILENAME: &str = "config.json";
    pub const STORAGE_FILENAME: &str = "storage.json";
}

/// Keys in the browser-storage analog
pub mod storage {
    pub const THEME_KEY: &str = "theme";
}

/// Validation limits for config values
pub mod validation {
    pub const MIN_REQUEST_TIMEOUT_MS: u64 = 1_000;
    pub const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;
    pub const MAX_DELAY_MS: u64 = 60_000;
    pub const MAX_FOCUS_DELAY_MS: u64 = 1_000;
}
