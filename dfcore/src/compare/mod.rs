//! Structural function comparison
//!
//! A comparison session walks two function bodies in lock-step and produces
//! a total [`Ordering`]: `Equal` when the functions are equivalent, anything
//! else when they differ. The direction of a difference carries no meaning
//! beyond giving a canonical order.
//!
//! - `baseline`: the session itself ([`FunctionComparator`]) and the plain
//!   structural rules
//! - `hooks`: the strategy trait through which every nested comparison is
//!   dispatched
//! - `differential`: the strategy tolerating benign source changes
//! - `serial`: first-appearance numbering of values
//! - `view`: per-side lookups into a function and its module
use std::cmp::Ordering;

use dfinstr::modules::{
    operand::Label,
    operation::Operation,
};

use crate::compare::serial::ValueKey;

/// Return early unless the comparison yielded `Equal`.
macro_rules! try_cmp {
    ($e:expr) => {
        match $e {
            std::cmp::Ordering::Equal => {}
            other => return other,
        }
    };
}

pub mod baseline;
pub mod differential;
pub mod hooks;
pub mod serial;
pub mod view;

pub use baseline::FunctionComparator;

/// One of the two compared snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// An operation together with its position in the function.
#[derive(Debug, Clone, Copy)]
pub struct OpSite<'a> {
    pub label: Label,
    pub index: usize,
    pub operation: Operation<'a>,
}

impl<'a> OpSite<'a> {
    /// Serial identity of the operation's result: its name, or its position
    /// for operations producing nothing.
    pub fn key(&self) -> ValueKey {
        match self.operation.destination() {
            Some(dest) => ValueKey::Reg(dest),
            None => ValueKey::Site(self.label, self.index),
        }
    }
}

/// Callee whose inlining may resolve a difference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InlineRequest {
    pub callee: String,
    /// Side on which the callee body was found.
    pub side: Side,
}

/// Outcome of one comparison session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub ordering: Ordering,
    inline_request: Option<InlineRequest>,
}

impl Comparison {
    pub fn new(ordering: Ordering, inline_request: Option<InlineRequest>) -> Self {
        Self {
            ordering,
            inline_request,
        }
    }

    pub fn is_equal(&self) -> bool {
        self.ordering.is_eq()
    }

    pub fn inline_request(&self) -> Option<&InlineRequest> {
        self.inline_request.as_ref()
    }

    /// Drain the inline request, leaving the slot empty.
    pub fn take_inline_request(&mut self) -> Option<InlineRequest> {
        self.inline_request.take()
    }
}
