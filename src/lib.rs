#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Emits a `log::debug!` record when the `log` feature is enabled, and
/// nothing otherwise.
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    }};
}
pub(crate) use log_debug;

/// Sizing options and their validation.
pub mod config;

/// A HashMap implementation using linear probing.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

pub mod hash_table;

pub use config::Config;
pub use config::ConfigError;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_table::HashTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`HashMap`] when none is specified.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used by [`HashMap`] when none is specified.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder hasher builder when neither `foldhash` nor `std` is
        /// enabled. It cannot be constructed, so maps must be given a hasher
        /// explicitly.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
