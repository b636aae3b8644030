//! API module
//!
//! Contains HTTP request handlers for slide deck generation endpoints

pub mod slides;
pub mod streaming;
