//! # SCMS Common Library
//!
//! Shared code for the site content management service:
//! - Partial-merge resolver for singleton content sections
//! - Section schemas (About, VMV, Footer, Hero)
//! - Database initialization and migrations
//! - Bootstrap configuration and root folder resolution

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod merge;

pub use error::{Error, Result};
pub use merge::{resolve, RawUpdate, Resolution, SectionContent, SectionSchema};
