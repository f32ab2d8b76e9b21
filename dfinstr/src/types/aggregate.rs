//! Aggregate types
//!
//! Composite types built from `Typeref` references stored in the central
//! `TypeRegistry`:
//! - `ArrayType`: a fixed-size array of elements referenced by `Typeref`.
//! - `StructType`: an ordered (optionally named, optionally packed) sequence
//!   of element `Typeref`s.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::Typeref;

/// Array type
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArrayType {
    pub ty: Typeref,
    pub num_elements: usize,
}

/// Structure type
///
/// Named structures are identified across two program snapshots by `name`
/// alone; their bodies are free to differ between snapshots.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StructType {
    pub name: Option<String>,
    pub element_types: Vec<Typeref>,
    pub packed: bool,
}

impl StructType {
    /// A named, non-packed structure.
    pub fn named(name: impl Into<String>, element_types: Vec<Typeref>) -> Self {
        Self {
            name: Some(name.into()),
            element_types,
            packed: false,
        }
    }

    /// A literal (anonymous), non-packed structure.
    pub fn literal(element_types: Vec<Typeref>) -> Self {
        Self {
            name: None,
            element_types,
            packed: false,
        }
    }
}
