//! Shared driver utilities: connection-string redaction, post-read
//! filtering, and TLS configuration.

pub mod filter;
pub mod redact;
pub mod tls;

pub use filter::{apply_read_options, name_matches};
pub use redact::{display_name, mask_username};
