//! Shared checks for file modes and files-directory paths
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod files_dir;
pub mod mode;

pub use files_dir::{ensure_within_files_dir, read_local, resolve_local};
pub use mode::{check_for_decimal_mode, is_reasonable_mode};
