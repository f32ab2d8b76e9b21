//! Differential equivalence checking of function pairs.
//!
//! The crate compares two versions of a function, each taken from its own
//! [`dfinstr::modules::Module`], and decides whether they are equivalent up
//! to a catalogue of benign changes (renumbered macro constants, reordered or
//! resized structures, an extra defaulted call argument, ...).
//!
//! Most consumers will interact with [`coordinator::ModuleComparator`], which
//! drives [`compare::differential::DifferentialHooks`] and inlines callees
//! on request. The lower-level [`compare::FunctionComparator`] can be
//! instantiated with any [`compare::hooks::ComparisonHooks`] strategy.

pub mod base;
pub mod compare;
pub mod coordinator;
pub mod debuginfo;
pub mod magic;
pub mod utils;

pub extern crate dfinstr;
