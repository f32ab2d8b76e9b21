//! Instruction-level SSA IR used by the differential comparator.
//!
//! The crate models two compiled program snapshots as [`modules::Module`]s:
//! a deduplicating type registry, a data layout, functions made of basic
//! blocks, and the instruction set the comparator reasons about.
#![allow(clippy::manual_is_multiple_of, clippy::manual_div_ceil)]

pub mod consts;
pub mod modules;
pub mod types;
pub mod utils;
