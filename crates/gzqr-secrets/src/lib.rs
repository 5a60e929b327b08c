//! gzqr-secrets: password component collection
//!
//! Components come from a file, an environment variable, or an interactive
//! hidden-echo prompt. Each must be at least 8 bytes; they are joined with a
//! NUL byte between them into the scrypt password.

pub mod join;
pub mod source;

pub use join::{join_components, MIN_COMPONENT_LEN};
pub use source::{
    collect_components, parse_component_count, resolve_source, resolve_source_with,
    PasswordSource, PASSFILE_ENV,
};
