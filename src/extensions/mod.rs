//! Checks built on top of the core reconstruction.
pub mod consistency;
