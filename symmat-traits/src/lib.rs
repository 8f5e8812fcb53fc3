//! Shared traits for the symmat workspace.
//!
//! This crate provides the numeric element abstraction that is shared by
//! `symmat` (the symmetric matrix core) and `symmat-decomp` (the LU,
//! Bunch-Kaufman and eigen collaborators).
//!
//! External crates can depend on `symmat-traits` to write code that is
//! generic over the supported element types without pulling in the core.

pub mod element;

pub use element::{Element, Precision};
