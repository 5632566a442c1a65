//! Concrete file formats found inside Nitro ROMs
//!
//! Only container formats live here; the mount core does not depend on them.

pub mod narc;

pub use narc::Narc;
