//! URL handling
//!
//! Canonical forms used for duplicate detection, and the allowed-domain check
//! applied to every discovered link.

mod canonical;
mod domain;

pub use canonical::canonicalize_url;
pub use domain::{extract_domain, is_allowed_domain};
