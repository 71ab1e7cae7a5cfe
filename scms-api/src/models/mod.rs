//! Data models for scms-api
//!
//! Singleton sections are modelled by `scms_common::merge`; this module holds
//! the collection items and dynamic pages.

pub mod collections;
pub mod lenient;
pub mod pages;

pub use collections::{CollectionItem, CollectionKind};
pub use pages::{ContentBlock, DynamicPage, PageDraft};
