// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) -> Protected (Bearer JWT). Handlers only extract and
// delegate; rules live in `crate::services`.

pub mod extract;
pub mod protected;
pub mod public;

pub use extract::{ApiPath, ApiQuery, ValidJson};
