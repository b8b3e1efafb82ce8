//! The source schema every variant builds on
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod mount_units;
pub mod schema;
pub mod translate;
pub mod validate;

pub use schema::Config;
pub use translate::{base_translator, translate_config};
pub use validate::validate_config;
