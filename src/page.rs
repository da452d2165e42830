//! Page descriptions
//!
//! A JSON description of the server-rendered markup the front-end runs on:
//! gallery thumbnails, admin forms and delete links. [`PageSpec::build`] turns
//! it into a headless document.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::constants::classes;
use crate::dom::{Document, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Overrides the configured page URL
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    #[serde(default)]
    pub forms: Vec<FormSpec>,
    #[serde(default)]
    pub delete_actions: Vec<DeleteAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSpec {
    pub id: String,
    /// Adds the `validate-form` class so a validator is attached on init
    #[serde(default = "default_true")]
    pub validate: bool,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default = "default_field_tag")]
    pub tag: String,
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAction {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub data_url: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_field_tag() -> String {
    "input".to_string()
}

impl PageSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read page description {}", path.display()))?;
        serde_json::from_str(&contents)
            .context(format!("Invalid page description {}", path.display()))
    }

    pub fn build(&self) -> Document {
        let mut doc = Document::new();
        let body = doc.body();

        if !self.gallery.is_empty() {
            let gallery = doc.create_element("section");
            doc.add_class(gallery, "gallery");
            doc.append_child(body, gallery);
            for image in &self.gallery {
                let item = doc.create_element("div");
                doc.add_class(item, "gallery-item");
                let img = doc.create_element("img");
                doc.set_attr(img, "src", &image.src);
                if let Some(alt) = &image.alt {
                    doc.set_attr(img, "alt", alt);
                }
                doc.append_child(item, img);
                doc.append_child(gallery, item);
            }
        }

        for form_spec in &self.forms {
            let form = doc.create_element("form");
            doc.set_attr(form, "id", &form_spec.id);
            if form_spec.validate {
                doc.add_class(form, classes::VALIDATE_FORM);
            }
            for field_spec in &form_spec.fields {
                let group = doc.create_element("div");
                doc.add_class(group, "form-group");
                if let Some(label_text) = &field_spec.label {
                    let label = doc.create_element("label");
                    doc.set_attr(label, "for", &field_spec.name);
                    doc.set_text(label, label_text);
                    doc.append_child(group, label);
                }
                let field = doc.create_element(&field_spec.tag);
                doc.set_attr(field, "name", &field_spec.name);
                doc.set_attr(field, "id", &field_spec.name);
                if field_spec.tag == "input" {
                    let input_type = field_spec.input_type.as_deref().unwrap_or("text");
                    doc.set_attr(field, "type", input_type);
                }
                doc.set_value(field, &field_spec.value);
                doc.append_child(group, field);
                doc.append_child(form, group);
            }
            let submit = doc.create_element("button");
            doc.set_attr(submit, "type", "submit");
            doc.set_text(submit, "Guardar");
            doc.append_child(form, submit);
            doc.append_child(body, form);
        }

        for action in &self.delete_actions {
            let link = doc.create_element("a");
            doc.set_attr(link, "data-action", "delete");
            for (attr, value) in [
                ("href", &action.href),
                ("data-url", &action.data_url),
                ("data-type", &action.item_type),
                ("data-name", &action.name),
                ("data-tooltip", &action.tooltip),
            ] {
                if let Some(value) = value {
                    doc.set_attr(link, attr, value);
                }
            }
            doc.set_text(link, "Eliminar");
            doc.append_child(body, link);
        }

        debug!(
            images = self.gallery.len(),
            forms = self.forms.len(),
            delete_actions = self.delete_actions.len(),
            "page built"
        );
        doc
    }
}

/// First element whose `id` attribute equals `id`
pub fn element_by_id(doc: &Document, id: &str) -> Option<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .find(|node| doc.attr(*node, "id") == Some(id))
}

/// The control named `name` inside `form`
pub fn field_by_name(doc: &Document, form: NodeId, name: &str) -> Option<NodeId> {
    doc.descendants(form)
        .into_iter()
        .find(|node| doc.attr(*node, "name") == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Selector;

    const PAGE: &str = r#"{
        "gallery": [
            { "src": "/static/img/fade.jpg", "alt": "Fade clásico" },
            { "src": "/static/img/barba.jpg" }
        ],
        "forms": [
            { "id": "servicio", "fields": [
                { "name": "nombre", "label": "Nombre" },
                { "name": "precio", "value": "25.000" },
                { "name": "descripcion", "tag": "textarea" }
            ] }
        ],
        "delete_actions": [
            { "href": "/admin/servicio/1/eliminar", "type": "servicio", "name": "Fade", "tooltip": "Eliminar servicio" }
        ]
    }"#;

    #[test]
    fn test_build_page() {
        let spec: PageSpec = serde_json::from_str(PAGE).unwrap();
        let doc = spec.build();

        let images = Selector::parse(".gallery-item img").unwrap();
        assert_eq!(doc.query_all(doc.root(), &images).len(), 2);

        let form = element_by_id(&doc, "servicio").unwrap();
        assert!(doc.has_class(form, "validate-form"));
        let precio = field_by_name(&doc, form, "precio").unwrap();
        assert_eq!(doc.value(precio), "25.000");
        assert_eq!(doc.attr(precio, "type"), Some("text"));
        let descripcion = field_by_name(&doc, form, "descripcion").unwrap();
        assert_eq!(doc.element(descripcion).map(|e| e.tag()), Some("textarea"));

        let delete = Selector::parse("[data-action=\"delete\"]").unwrap();
        let link = doc.query(doc.root(), &delete).unwrap();
        assert_eq!(doc.attr(link, "data-type"), Some("servicio"));
        assert_eq!(doc.attr(link, "data-url"), None);
    }

    #[test]
    fn test_demo_page_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/admin.json");
        let spec = PageSpec::load(&path).unwrap();
        assert_eq!(spec.gallery.len(), 3);
        assert_eq!(spec.delete_actions[1].data_url.as_deref(), Some("galeria/3/eliminar"));

        let doc = spec.build();
        let contacto = element_by_id(&doc, "form-contacto").unwrap();
        let email = field_by_name(&doc, contacto, "email").unwrap();
        assert_eq!(doc.attr(email, "type"), Some("email"));
    }

    #[test]
    fn test_load_errors_have_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        fs::write(&path, "{ \"gallery\": 3 }").unwrap();
        let err = PageSpec::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid page description"));
    }
}
