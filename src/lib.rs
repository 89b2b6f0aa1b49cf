// src/lib.rs

pub mod api;
pub mod common;
pub mod config;
pub mod models;
pub mod services;
pub mod session;
pub mod sync;

pub use common::error::{AppError, AppResult};
pub use config::{AppConfig, AppState};
