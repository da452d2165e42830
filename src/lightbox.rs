//! Gallery lightbox
//!
//! Presents the `.gallery-item img` thumbnails one at a time in a modal
//! overlay with keyboard and pointer navigation. The overlay element tree is
//! built once per application context and shared by every navigator.

use tracing::{debug, info};

use crate::a11y::{self, Priority};
use crate::constants::{classes, messages};
use crate::context::AppContext;
use crate::dom::{Document, Event, EventKind, Key, ListenerId, NodeId};
use crate::focus_trap::FocusTrap;

/// One gallery image, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub src: String,
    pub alt: String,
    /// The thumbnail this entry was collected from
    pub element: NodeId,
}

/// Node ids of the overlay's parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightboxOverlay {
    pub root: NodeId,
    pub backdrop: NodeId,
    pub close: NodeId,
    pub prev: NodeId,
    pub next: NodeId,
    pub image: NodeId,
    pub caption: NodeId,
    pub counter: NodeId,
}

impl LightboxOverlay {
    fn build(doc: &mut Document) -> Self {
        let root = doc.create_element("div");
        doc.add_class(root, classes::LIGHTBOX);
        doc.set_attr(root, "aria-hidden", "true");
        doc.set_attr(root, "role", "dialog");
        doc.set_attr(root, "aria-label", messages::LIGHTBOX_LABEL);

        let backdrop = child(doc, root, "div", classes::LIGHTBOX_BACKDROP);
        let container = child(doc, root, "div", classes::LIGHTBOX_CONTAINER);

        let close = glyph_button(doc, container, classes::LIGHTBOX_CLOSE, messages::LIGHTBOX_CLOSE_LABEL, "×");
        let prev = glyph_button(doc, container, classes::LIGHTBOX_PREV, messages::LIGHTBOX_PREV_LABEL, "‹");
        let next = glyph_button(doc, container, classes::LIGHTBOX_NEXT, messages::LIGHTBOX_NEXT_LABEL, "›");

        let content = child(doc, container, "div", classes::LIGHTBOX_CONTENT);
        let image = child(doc, content, "img", classes::LIGHTBOX_IMAGE);
        doc.set_attr(image, "src", "");
        doc.set_attr(image, "alt", "");
        doc.set_attr(image, "loading", "lazy");
        let caption = child(doc, content, "div", classes::LIGHTBOX_CAPTION);

        let counter = child(doc, container, "div", classes::LIGHTBOX_COUNTER);
        doc.set_text(counter, "1 / 1");

        let body = doc.body();
        doc.append_child(body, root);
        debug!(root = ?root, "lightbox overlay built");

        Self {
            root,
            backdrop,
            close,
            prev,
            next,
            image,
            caption,
            counter,
        }
    }

    /// Reuse the context's overlay while it is still in the document
    fn get_or_build(ctx: &mut AppContext) -> Self {
        if let Some(overlay) = ctx.lightbox_overlay
            && ctx.document.is_attached(overlay.root)
        {
            return overlay;
        }
        let overlay = Self::build(&mut ctx.document);
        ctx.lightbox_overlay = Some(overlay);
        overlay
    }
}

fn child(doc: &mut Document, parent: NodeId, tag: &str, class: &str) -> NodeId {
    let node = doc.create_element(tag);
    doc.add_class(node, class);
    doc.append_child(parent, node);
    node
}

fn glyph_button(doc: &mut Document, parent: NodeId, class: &str, label: &str, glyph: &str) -> NodeId {
    let button = child(doc, parent, "button", class);
    doc.set_attr(button, "aria-label", label);
    let span = doc.create_element("span");
    doc.set_attr(span, "aria-hidden", "true");
    doc.set_text(span, glyph);
    doc.append_child(button, span);
    button
}

pub struct Lightbox {
    images: Vec<ImageEntry>,
    overlay: LightboxOverlay,
    current_index: usize,
    is_open: bool,
    trap: Option<FocusTrap>,
    opener: Option<NodeId>,
    listeners: Vec<ListenerId>,
}

impl Lightbox {
    pub fn new(ctx: &mut AppContext) -> Self {
        let images = collect_images(ctx);
        let overlay = LightboxOverlay::get_or_build(ctx);
        let root = ctx.document.root();
        let listeners = vec![
            ctx.document.add_listener(root, EventKind::KeyDown),
            ctx.document.add_listener(root, EventKind::Click),
        ];
        info!(images = images.len(), "gallery initialized");
        Self {
            images,
            overlay,
            current_index: 0,
            is_open: false,
            trap: None,
            opener: None,
            listeners,
        }
    }

    pub fn images(&self) -> &[ImageEntry] {
        &self.images
    }

    pub fn overlay(&self) -> LightboxOverlay {
        self.overlay
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn trap(&self) -> Option<&FocusTrap> {
        self.trap.as_ref()
    }

    /// False once [`Lightbox::destroy`] has dropped the listeners
    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Open at the entry collected from `thumbnail`. Unknown thumbnails are ignored
    pub fn open(&mut self, ctx: &mut AppContext, thumbnail: NodeId) -> bool {
        let Some(index) = self.images.iter().position(|entry| entry.element == thumbnail) else {
            debug!(node = ?thumbnail, "thumbnail not in gallery, ignoring");
            return false;
        };

        if let Some(mut old) = self.trap.take() {
            old.release(ctx);
        }
        if !self.is_open {
            self.opener = ctx.document.active_element();
        }

        self.current_index = index;
        self.is_open = true;
        self.render(ctx);

        let doc = &mut ctx.document;
        doc.set_attr(self.overlay.root, "aria-hidden", "false");
        let body = doc.body();
        doc.set_style(body, "overflow", "hidden");

        self.trap = Some(FocusTrap::trap(ctx, self.overlay.root));
        ctx.document.focus(self.overlay.close);
        a11y::announce(ctx, messages::LIGHTBOX_OPENED, Priority::Polite);
        info!(index, total = self.images.len(), "lightbox opened");
        true
    }

    /// Move by `delta` without wrapping. Out of range or closed is a no-op
    pub fn navigate(&mut self, ctx: &mut AppContext, delta: isize) -> bool {
        if !self.is_open {
            return false;
        }
        let Some(target) = self.current_index.checked_add_signed(delta) else {
            return false;
        };
        if target >= self.images.len() {
            return false;
        }
        self.current_index = target;
        self.render(ctx);
        debug!(index = target, "lightbox navigated");
        true
    }

    /// Hide the overlay and hand focus back. Closing twice is a no-op
    pub fn close(&mut self, ctx: &mut AppContext) -> bool {
        if !self.is_open {
            return false;
        }
        self.is_open = false;
        self.current_index = 0;

        let doc = &mut ctx.document;
        doc.set_attr(self.overlay.root, "aria-hidden", "true");
        let body = doc.body();
        doc.remove_style(body, "overflow");

        if let Some(mut trap) = self.trap.take() {
            trap.release(ctx);
        }

        match self.opener.take() {
            Some(opener) if ctx.document.focus(opener) => {}
            _ => {
                if ctx
                    .document
                    .active_element()
                    .is_some_and(|active| ctx.document.contains(self.overlay.root, active))
                {
                    ctx.document.blur();
                }
            }
        }

        a11y::announce(ctx, messages::LIGHTBOX_CLOSED, Priority::Polite);
        info!("lightbox closed");
        true
    }

    /// Escape closes, arrows navigate. Returns true if the key was consumed
    pub fn handle_keydown(&mut self, ctx: &mut AppContext, event: &Event) -> bool {
        if !self.is_attached() || !self.is_open || event.kind != EventKind::KeyDown {
            return false;
        }
        match event.key {
            Some(Key::Escape) => self.close(ctx),
            Some(Key::ArrowLeft) => self.navigate(ctx, -1),
            Some(Key::ArrowRight) => self.navigate(ctx, 1),
            _ => false,
        }
    }

    /// Route a click on the overlay controls or a thumbnail
    pub fn handle_click(&mut self, ctx: &mut AppContext, event: &mut Event) -> bool {
        if !self.is_attached() || event.kind != EventKind::Click {
            return false;
        }
        let target = event.target;
        let overlay = self.overlay;

        if self.is_open {
            let doc = &ctx.document;
            if target == overlay.backdrop || doc.contains(overlay.close, target) {
                return self.close(ctx);
            }
            if doc.contains(overlay.prev, target) {
                self.navigate(ctx, -1);
                return true;
            }
            if doc.contains(overlay.next, target) {
                self.navigate(ctx, 1);
                return true;
            }
        }

        if let Some(thumbnail) = ctx.document.closest(target, &ctx.selectors.gallery_image)
            && self.images.iter().any(|entry| entry.element == thumbnail)
        {
            event.prevent_default();
            return self.open(ctx, thumbnail);
        }
        false
    }

    /// Re-scan the gallery. An open lightbox clamps to the last image, or
    /// closes when none are left.
    pub fn update_images(&mut self, ctx: &mut AppContext) {
        self.images = collect_images(ctx);
        if !self.is_open {
            return;
        }
        if self.images.is_empty() {
            self.close(ctx);
            return;
        }
        if self.current_index >= self.images.len() {
            self.current_index = self.images.len() - 1;
        }
        self.render(ctx);
    }

    /// Close if open and drop the navigator's listeners
    pub fn destroy(&mut self, ctx: &mut AppContext) {
        self.close(ctx);
        for listener in self.listeners.drain(..) {
            ctx.document.remove_listener(listener);
        }
        info!("gallery cleaned up");
    }

    fn render(&self, ctx: &mut AppContext) {
        let Some(entry) = self.images.get(self.current_index) else {
            return;
        };
        let total = self.images.len();
        let doc = &mut ctx.document;
        let overlay = self.overlay;

        doc.set_attr(overlay.image, "src", &entry.src);
        doc.set_attr(overlay.image, "alt", &entry.alt);
        doc.set_text(overlay.caption, &entry.alt);
        doc.set_text(overlay.counter, &format!("{} / {}", self.current_index + 1, total));

        let prev_opacity = if self.current_index > 0 { "1" } else { "0.3" };
        let next_opacity = if self.current_index + 1 < total { "1" } else { "0.3" };
        doc.set_style(overlay.prev, "opacity", prev_opacity);
        doc.set_style(overlay.next, "opacity", next_opacity);
    }
}

fn collect_images(ctx: &AppContext) -> Vec<ImageEntry> {
    let doc = &ctx.document;
    doc.query_all(doc.root(), &ctx.selectors.gallery_image)
        .into_iter()
        .map(|element| ImageEntry {
            src: doc.attr(element, "src").unwrap_or_default().to_string(),
            alt: doc
                .attr(element, "alt")
                .filter(|alt| !alt.is_empty())
                .unwrap_or(messages::DEFAULT_IMAGE_ALT)
                .to_string(),
            element,
        })
        .collect()
}
