//! # EntiOData Testkit
//!
//! Test utilities for EntiOData.
//!
//! This crate provides:
//! - Shop fixtures: record types, accessors and a producer serving them
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use entiodata_core::QueryInfo;
//! use entiodata_testkit::prelude::*;
//!
//! let shop = Shop::new(reference_orders());
//! let page = shop.get_entities("Orders", &QueryInfo::new()).unwrap();
//! assert_eq!(page.entities.len(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
