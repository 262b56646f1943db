// crates/backend-lib/src/middleware/mod.rs

//! Request middleware: identity resolution and role gating.

pub mod identity;
pub mod role_gate;

pub use identity::{require_auth, CurrentUser};
pub use role_gate::{is_admin, require_admin};
