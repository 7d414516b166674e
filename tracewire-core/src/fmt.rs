//! Logging shims
//!
//! Forward to `defmt` when the feature is enabled; otherwise the arguments
//! are evaluated and discarded so call sites compile identically.

#![allow(unused_macros)]

#[cfg(feature = "defmt")]
macro_rules! trace { ($($arg:tt)*) => { ::defmt::trace!($($arg)*) }; }
#[cfg(feature = "defmt")]
macro_rules! debug { ($($arg:tt)*) => { ::defmt::debug!($($arg)*) }; }
#[cfg(feature = "defmt")]
macro_rules! info { ($($arg:tt)*) => { ::defmt::info!($($arg)*) }; }
#[cfg(feature = "defmt")]
macro_rules! warn { ($($arg:tt)*) => { ::defmt::warn!($($arg)*) }; }
#[cfg(feature = "defmt")]
macro_rules! error { ($($arg:tt)*) => { ::defmt::error!($($arg)*) }; }

#[cfg(not(feature = "defmt"))]
macro_rules! trace { ($($arg:tt)*) => {{ let _ = ($($arg)*,); }}; }
#[cfg(not(feature = "defmt"))]
macro_rules! debug { ($($arg:tt)*) => {{ let _ = ($($arg)*,); }}; }
#[cfg(not(feature = "defmt"))]
macro_rules! info { ($($arg:tt)*) => {{ let _ = ($($arg)*,); }}; }
#[cfg(not(feature = "defmt"))]
macro_rules! warn { ($($arg:tt)*) => {{ let _ = ($($arg)*,); }}; }
#[cfg(not(feature = "defmt"))]
macro_rules! error { ($($arg:tt)*) => {{ let _ = ($($arg)*,); }}; }
