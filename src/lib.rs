pub mod builder;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs;
pub mod models;
pub mod process;
pub mod validation;
