pub mod app;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod limits;
pub mod services;
pub mod storage;

pub use error::{AppError, Result};
