//! Override points of the structural comparison.
//!
//! The traversal in [`FunctionComparator`] never calls a comparison routine
//! directly: every nested comparison is dispatched through the session's
//! strategy, so an override of (say) [`ComparisonHooks::cmp_types`] is also
//! honored inside array and structure types, constant operands and call
//! signatures. Each method defaults to the matching `baseline_*` routine.
use std::cmp::Ordering;

use dfinstr::{
    consts::int::IConst,
    modules::{BasicBlock, attributes::AttributeList, mem::MGetElementPtr, operand::Operand},
    types::Typeref,
};

use crate::compare::{FunctionComparator, OpSite};

pub trait ComparisonHooks: Sized {
    fn cmp_basic_blocks<'a>(
        &self,
        cmp: &mut FunctionComparator<'a, Self>,
        left: &'a BasicBlock,
        right: &'a BasicBlock,
    ) -> Ordering {
        cmp.baseline_cmp_basic_blocks(left, right)
    }

    /// Compare two operations. Clearing `need_operands` tells the block
    /// driver the operands were already accounted for.
    fn cmp_operations<'a>(
        &self,
        cmp: &mut FunctionComparator<'a, Self>,
        left: OpSite<'a>,
        right: OpSite<'a>,
        need_operands: &mut bool,
    ) -> Ordering {
        cmp.baseline_cmp_operations(left, right, need_operands)
    }

    fn cmp_geps<'a>(
        &self,
        cmp: &mut FunctionComparator<'a, Self>,
        left: &'a MGetElementPtr,
        right: &'a MGetElementPtr,
    ) -> Ordering {
        cmp.baseline_cmp_geps(left, right)
    }

    fn cmp_values(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        left: &Operand,
        right: &Operand,
    ) -> Ordering {
        cmp.baseline_cmp_values(left, right)
    }

    fn cmp_types(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        left: Typeref,
        right: Typeref,
    ) -> Ordering {
        cmp.baseline_cmp_types(left, right)
    }

    fn cmp_ints(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        left: &IConst,
        right: &IConst,
    ) -> Ordering {
        cmp.baseline_cmp_ints(left, right)
    }

    fn cmp_attrs(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        left: &AttributeList,
        right: &AttributeList,
    ) -> Ordering {
        cmp.baseline_cmp_attrs(left, right)
    }
}

/// Plain structural comparison, no override.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaselineHooks;

impl ComparisonHooks for BaselineHooks {}
