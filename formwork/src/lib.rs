//! Form building blocks for component-based UIs.
//!
//! Formwork provides the non-visual half of a form layer: localized message
//! lookup, an HTTP request envelope, and a declarative validation engine
//! that composes per-field rules (required, length, range, regexp, password
//! checks, custom sync/async predicates, API-backed checks) into a per-field
//! state machine and a whole-form aggregate.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use formwork::prelude::*;
//!
//! let nls = Arc::new(Nls::default());
//!
//! let email = FormField::new("email")
//!     .with_required(RequiredRule::new(nls.clone(), ()))
//!     .with_rule(RegexpRule::email(nls.clone(), ()));
//!
//! let form = FormValidator::new().with_field(email.clone());
//!
//! email.set_value("user@domain.com".into());
//! assert!(form.valid());
//! ```

pub mod nls;
pub mod transport;
pub mod value;
pub mod validation;

pub mod prelude {
    pub use crate::nls::Nls;
    pub use crate::transport::{ApiResponse, HttpTransport, RequestOptions, Transport};
    pub use crate::validation::cache::{AsyncCache, CacheEntry};
    pub use crate::validation::field::{FieldState, FormField};
    pub use crate::validation::form::FormValidator;
    pub use crate::validation::rules::{
        ApiConfig, ApiRule, AsyncConfig, AsyncResolver, AsyncRule, CustomConfig, CustomRule,
        EmailConfig, LengthConfig, LengthRule, PasswordComplexityConfig, PasswordComplexityRule,
        PasswordRepeatConfig, PasswordRepeatRule, RangeConfig, RangeRule, RegexpConfig,
        RegexpRule, RequiredConfig, RequiredRule, ValidationRule,
    };
    pub use crate::validation::{MessageKind, Verdict};
}
