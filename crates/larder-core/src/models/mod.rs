//! Data models for the import pipeline.

pub mod config;
pub mod item;
pub mod session;
