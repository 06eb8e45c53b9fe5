// ABOUTME: Public library API for incremental ban exports
// ABOUTME: Re-exports core modules for external use

pub mod api;
pub mod auth;
pub mod cli;
pub mod error;
pub mod model;
pub mod normalize;
pub mod paginate;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
pub use model::{BanRecord, Page, RateLimit, UserRestriction};
