//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod log_dto;
pub mod plot_dto;

pub use common_dto::*;
pub use log_dto::*;
pub use plot_dto::*;
