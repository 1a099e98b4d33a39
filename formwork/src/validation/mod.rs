//! Declarative form validation.
//!
//! A field owns zero or more rules; on value change the field asks each
//! attached rule (required first) for a verdict, and the verdicts drive the
//! field's displayed state. A form validator collects fields, runs group
//! validation and can push server-side error messages back into individual
//! fields by name.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use formwork::prelude::*;
//!
//! let nls = Arc::new(Nls::default());
//!
//! let username = FormField::new("username")
//!     .with_required(RequiredRule::new(nls.clone(), ()))
//!     .with_rule(LengthRule::new(nls.clone(), LengthConfig {
//!         min: Some(3),
//!         max: Some(16),
//!         ..Default::default()
//!     }));
//!
//! let form = FormValidator::new().with_field(username.clone());
//!
//! username.set_value("ab".into());
//! assert!(!form.valid());
//! assert_eq!(username.state(), FieldState::Invalid);
//! ```

pub mod cache;
pub mod field;
pub mod form;
pub mod rules;

mod verdict;

pub use verdict::{MessageKind, Verdict};
