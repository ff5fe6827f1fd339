//! Resume writer library

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod llm;
pub mod monitor;
pub mod terminal;
pub mod text;
pub mod web;

pub use config::Config;
pub use error::{Result, ResumeWriterError};
