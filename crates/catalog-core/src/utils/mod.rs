//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{asset_url, contains_ignore_case, encode_path_segment, initials, slugify, truncate};
