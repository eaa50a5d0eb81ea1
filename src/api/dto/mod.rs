//! Data Transfer Objects for REST request/response serialization.
//!
//! All monetary amounts are serialized as JSON strings to prevent
//! precision loss in clients that parse numbers as floats.

pub mod change_dto;
pub mod common_dto;
pub mod summary_dto;

pub use change_dto::*;
pub use common_dto::*;
pub use summary_dto::*;
