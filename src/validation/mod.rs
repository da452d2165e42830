//! Form validation
//!
//! - **rules**: declarative per-field rules and the default rule set
//! - **predicates**: reusable value checks (price, email, phone) and escaping
//! - **validator**: binds a rule set to a form in the document

pub mod predicates;
pub mod rules;
pub mod validator;

pub use predicates::{is_valid_email, is_valid_phone, is_valid_price, sanitize_html};
pub use rules::{FieldRule, PartialRule, RuleKind, RuleSet};
pub use validator::{FormValidator, SubmitOutcome};
