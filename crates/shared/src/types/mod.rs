//! Common types used across the application.

pub mod money;
pub mod pagination;

pub use money::{Currency, MAX_AMOUNT, MAX_TARGET, fits_amount};
pub use pagination::{PageMeta, PageRequest, PageResponse};
