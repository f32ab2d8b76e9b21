//! Differential comparison rules.
//!
//! [`DifferentialHooks`] extends the structural comparison with rules for
//! changes that do not alter behavior:
//!
//! - field accesses are matched by field name, so reordered structures
//!   compare equal
//! - allocations and memsets of `sizeof(S)` tolerate a resized `S`
//! - a trailing null/zero argument added to a call is ignored (relaxed)
//! - macro and enumerator constants are matched by their rendering
//! - inlining attributes are ignored
//! - in relaxed mode integers ignore signedness and width, casts are
//!   transparent, and allocas and casts without counterpart are skipped
//!
//! Differences that may come from code moved into (or out of) a callee are
//! reported through an [`InlineRequest`]; the coordinator inlines the callee
//! and compares again.
use std::cmp::Ordering;

use dfinstr::{
    consts::int::IConst,
    modules::{
        BasicBlock, Function, Module,
        attributes::{AttributeFlags, AttributeList},
        instructions::Instr,
        mem::MGetElementPtr,
        misc::{CastVariant, Invoke},
        operand::Operand,
        operation::Operation,
    },
    types::{AnyType, Typeref, aggregate::StructType, primary::PrimaryType},
};
use log::trace;

use crate::{
    base::config::DiffConfig,
    compare::{
        Comparison, FunctionComparator, InlineRequest, OpSite, Side,
        hooks::ComparisonHooks,
        serial::ValueKey,
        view::{FunctionView, const_index},
    },
    debuginfo::DebugInfo,
};

/// Comparison strategy tolerating benign source changes.
#[derive(Debug, Clone, Copy)]
pub struct DifferentialHooks<'d> {
    config: &'d DiffConfig,
    debug_info: &'d DebugInfo,
}

/// Compare two functions with [`DifferentialHooks`] in a fresh session.
pub fn compare_functions(
    config: &DiffConfig,
    debug_info: &DebugInfo,
    left: (&Module, &Function),
    right: (&Module, &Function),
) -> Comparison {
    let hooks = DifferentialHooks::new(config, debug_info);
    FunctionComparator::new(&hooks, left, right).compare()
}

/// `size` is a constant equal to the store size of `st` on this side.
fn is_sizeof(view: &FunctionView<'_>, st: Typeref, size: &Operand) -> bool {
    match (const_index(size), view.store_size(st)) {
        (Some(size), Some(store_size)) => size == store_size,
        _ => false,
    }
}

/// Structure an allocation result is cast to by the very next instruction.
fn allocated_struct(
    view: &FunctionView<'_>,
    call: &Invoke,
    next: Option<Operation<'_>>,
) -> Option<(Typeref, StructType)> {
    let dest = call.dest?;
    match next? {
        Operation::Instr(Instr::Cast(cast))
            if cast.variant == CastVariant::BitCast && cast.value == Operand::Reg(dest) =>
        {
            view.pointee_struct(cast.ty)
        }
        _ => None,
    }
}

impl<'d> DifferentialHooks<'d> {
    pub fn new(config: &'d DiffConfig, debug_info: &'d DebugInfo) -> Self {
        Self { config, debug_info }
    }

    pub fn relaxed(&self) -> bool {
        self.config.relaxed
    }

    /// Allocations of the same size, or of `sizeof` the same named structure.
    fn cmp_allocs<'a>(
        &self,
        cmp: &mut FunctionComparator<'a, Self>,
        left: OpSite<'a>,
        right: OpSite<'a>,
        (cl, cr): (&'a Invoke, &'a Invoke),
    ) -> Ordering {
        let (Some(sl), Some(sr)) = (cl.args.first(), cr.args.first()) else {
            return Ordering::Greater;
        };
        if cmp.cmp_values(sl, sr).is_eq() {
            return Ordering::Equal;
        }

        let next_l = cmp.left().operation_after(left.label, left.index);
        let next_r = cmp.right().operation_after(right.label, right.index);
        let (Some((lt, ls)), Some((rt, rs))) = (
            allocated_struct(cmp.left(), cl, next_l),
            allocated_struct(cmp.right(), cr, next_r),
        ) else {
            return Ordering::Greater;
        };

        if ls.name == rs.name && is_sizeof(cmp.left(), lt, sl) && is_sizeof(cmp.right(), rt, sr) {
            trace!("Allocation sizes follow resized `{}`", ls.name.as_deref().unwrap_or("<anon>"));
            Ordering::Equal
        } else {
            Ordering::Greater
        }
    }

    /// Memsets over the same destination and fill, sized alike or each by
    /// `sizeof` the same named structure.
    fn cmp_memset<'a>(
        &self,
        cmp: &mut FunctionComparator<'a, Self>,
        (cl, cr): (&'a Invoke, &'a Invoke),
    ) -> Ordering {
        if cl.args.len() < 3 || cl.args.len() != cr.args.len() {
            return Ordering::Greater;
        }
        for (i, (l, r)) in cl.args.iter().zip(&cr.args).enumerate() {
            if i != 2 {
                try_cmp!(cmp.cmp_values(l, r));
            }
        }
        if cmp.cmp_values(&cl.args[2], &cr.args[2]).is_eq() {
            return Ordering::Equal;
        }

        let (Some((lt, ls)), Some((rt, rs))) = (
            cmp.left().struct_behind(&cl.args[0]),
            cmp.right().struct_behind(&cr.args[0]),
        ) else {
            return Ordering::Greater;
        };

        if ls.name == rs.name
            && is_sizeof(cmp.left(), lt, &cl.args[2])
            && is_sizeof(cmp.right(), rt, &cr.args[2])
        {
            trace!("Memset sizes follow resized `{}`", ls.name.as_deref().unwrap_or("<anon>"));
            Ordering::Equal
        } else {
            Ordering::Greater
        }
    }

    /// Calls whose operand counts differ by one: the longer call must end
    /// with a null/zero argument, the rest must match.
    fn cmp_calls_with_extra_arg(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        cl: &Invoke,
        cr: &Invoke,
    ) -> Ordering {
        let extra = if cl.args.len() > cr.args.len() { cl } else { cr };
        match extra.args.last() {
            Some(Operand::Imm(constant)) if constant.is_null_value() => {}
            _ => return Ordering::Greater,
        }

        try_cmp!(cmp.cmp_optional_types(cl.ty, cr.ty));
        for (l, r) in cl.args.iter().zip(&cr.args) {
            try_cmp!(cmp.cmp_operand_types(l, r));
            try_cmp!(cmp.cmp_values(l, r));
        }
        trace!("Ignoring trailing default argument");
        Ordering::Equal
    }

    fn request_inline_of(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        candidates: &[(Side, &Invoke)],
    ) {
        for (side, call) in candidates {
            let view = cmp.view(*side);
            if view.callee_has_body(call) {
                if let Some(callee) = view.callee_name(call) {
                    cmp.request_inline(InlineRequest {
                        callee: callee.to_string(),
                        side: *side,
                    });
                    return;
                }
            }
        }
    }

    /// Name of the struct type `ty`, `Some(None)` for a literal struct.
    fn struct_name(view: &FunctionView<'_>, ty: Typeref) -> Option<Option<String>> {
        view.struct_type(ty).map(|st| st.name)
    }
}

impl ComparisonHooks for DifferentialHooks<'_> {
    fn cmp_basic_blocks<'a>(
        &self,
        cmp: &mut FunctionComparator<'a, Self>,
        left: &'a BasicBlock,
        right: &'a BasicBlock,
    ) -> Ordering {
        let (mut il, mut ir) = (0, 0);
        while let (Some(sl), Some(sr)) = (
            FunctionComparator::<Self>::site(left, il),
            FunctionComparator::<Self>::site(right, ir),
        ) {
            let checkpoint = cmp.checkpoint();
            let mut need_operands = true;
            let res = cmp.cmp_operations(sl, sr, &mut need_operands);
            if res.is_ne() {
                let (skip_left, skip_right) = (sl.operation.is_ignorable(), sr.operation.is_ignorable());
                if self.relaxed() && (skip_left || skip_right) {
                    cmp.rollback(checkpoint);
                    debug_assert!(
                        {
                            let (ls, rs) = cmp.serials();
                            ls.len() == rs.len()
                        },
                        "serial maps out of sync after a skip"
                    );

                    // Left first when both could be skipped.
                    if skip_left {
                        trace!("Skipping `{}` on the left", sl.operation.fmt(Some(cmp.left().module)));
                        il += 1;
                    } else {
                        trace!("Skipping `{}` on the right", sr.operation.fmt(Some(cmp.right().module)));
                        ir += 1;
                    }
                    continue;
                }
                cmp.report_divergence(sl, sr);
                return res;
            }

            if need_operands {
                let res = cmp.cmp_operands(sl, sr);
                if res.is_ne() {
                    cmp.report_divergence(sl, sr);
                    return res;
                }
            }
            il += 1;
            ir += 1;
        }
        (il < left.len()).cmp(&(ir < right.len()))
    }

    fn cmp_operations<'a>(
        &self,
        cmp: &mut FunctionComparator<'a, Self>,
        left: OpSite<'a>,
        right: OpSite<'a>,
        need_operands: &mut bool,
    ) -> Ordering {
        let result = cmp.baseline_cmp_operations(left, right, need_operands);

        match (left.operation.as_call(), right.operation.as_call()) {
            (Some(cl), Some(cr)) => {
                let callee = match (cmp.left().callee_name(cl), cmp.right().callee_name(cr)) {
                    (Some(l), Some(r)) if l == r => Some(l),
                    _ => None,
                };
                if let Some(callee) = callee {
                    if self.config.is_allocator(callee)
                        && self.cmp_allocs(cmp, left, right, (cl, cr)).is_eq()
                    {
                        *need_operands = false;
                        return Ordering::Equal;
                    }
                    if self.config.is_memset(callee) && self.cmp_memset(cmp, (cl, cr)).is_eq() {
                        *need_operands = false;
                        return Ordering::Equal;
                    }
                    if result.is_ne() && self.relaxed() && cl.args.len().abs_diff(cr.args.len()) == 1 {
                        *need_operands = false;
                        return self.cmp_calls_with_extra_arg(cmp, cl, cr);
                    }
                    if result.is_ne() {
                        self.request_inline_of(cmp, &[(Side::Left, cl), (Side::Right, cr)]);
                    }
                }
            }
            (Some(call), None) => self.request_inline_of(cmp, &[(Side::Left, call)]),
            (None, Some(call)) => self.request_inline_of(cmp, &[(Side::Right, call)]),
            (None, None) => {}
        }

        if result.is_ne() {
            match (left.operation, right.operation) {
                (Operation::Instr(Instr::ICmp(l)), Operation::Instr(Instr::ICmp(r)))
                    if self.relaxed() && l.variant.to_unsigned() == r.variant.to_unsigned() =>
                {
                    return Ordering::Equal;
                }
                (Operation::Instr(Instr::MAlloca(l)), Operation::Instr(Instr::MAlloca(r))) => {
                    let names = (
                        Self::struct_name(cmp.left(), l.allocated),
                        Self::struct_name(cmp.right(), r.allocated),
                    );
                    if let (Some(ln), Some(rn)) = names {
                        if ln == rn {
                            return l.alignment.cmp(&r.alignment);
                        }
                    }
                }
                _ => {}
            }
        }
        result
    }

    fn cmp_geps<'a>(
        &self,
        cmp: &mut FunctionComparator<'a, Self>,
        left: &'a MGetElementPtr,
        right: &'a MGetElementPtr,
    ) -> Ordering {
        let structural = cmp.baseline_cmp_geps(left, right);
        if structural.is_eq() {
            return structural;
        }

        let (Some(ls), Some(rs)) = (
            cmp.left().struct_type(left.source_ty),
            cmp.right().struct_type(right.source_ty),
        ) else {
            return structural;
        };
        if ls.name != rs.name {
            return structural;
        }

        let las = cmp.left().type_of(&left.base).and_then(|ty| cmp.left().addr_space(ty));
        let ras = cmp.right().type_of(&right.base).and_then(|ty| cmp.right().addr_space(ty));
        try_cmp!(las.cmp(&ras));
        try_cmp!(left.indices.len().cmp(&right.indices.len()));

        let all_constant = |gep: &MGetElementPtr| gep.indices.iter().all(Operand::is_imm);
        if all_constant(left) && all_constant(right) {
            for (i, (li, ri)) in left.indices.iter().zip(&right.indices).enumerate() {
                let lt = cmp.left().indexed_type(left.source_ty, &left.indices[..i]);
                let rt = cmp.right().indexed_type(right.source_ty, &right.indices[..i]);

                // The first index steps over whole structures, not fields.
                let same_field = i > 0 && match (lt, rt, const_index(li), const_index(ri)) {
                    (Some(lt), Some(rt), Some(lf), Some(rf))
                        if cmp.left().struct_type(lt).is_some()
                            && cmp.right().struct_type(rt).is_some() =>
                    {
                        let names = &self.debug_info.struct_field_names;
                        let name = names.get(lt, lf);
                        name.is_some() && name == names.get(rt, rf)
                    }
                    _ => false,
                };
                if same_field {
                    trace!("Field {} and field {} share their name", li.fmt(None), ri.fmt(None));
                } else {
                    try_cmp!(cmp.cmp_values(li, ri));
                }
            }
            Ordering::Equal
        } else if left.indices.len() == 1 && right.indices.len() == 1 {
            cmp.cmp_values(&left.indices[0], &right.indices[0])
        } else {
            structural
        }
    }

    fn cmp_values(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        left: &Operand,
        right: &Operand,
    ) -> Ordering {
        if self.relaxed() {
            let sources = (cmp.left().cast_source(left), cmp.right().cast_source(right));
            match sources {
                (Some(ls), Some(rs)) => return cmp.cmp_values(ls, rs),
                (Some(ls), None) => return cmp.cmp_values(ls, right),
                (None, Some(rs)) => return cmp.cmp_values(left, rs),
                (None, None) => {}
            }
        }

        let result = cmp.baseline_cmp_values(left, right);
        if result.is_eq() {
            return result;
        }

        match (left, right) {
            (Operand::Imm(lc), Operand::Imm(rc))
                if self.debug_info.macro_constants.equivalent(lc, rc) =>
            {
                trace!("Constants {} and {} render alike", lc, rc);
                Ordering::Equal
            }
            (Operand::Lbl(ll), Operand::Lbl(rl)) => {
                // Blocks may differ in number when code moved into a callee;
                // keep going and let a later inline settle it.
                let (left_serials, right_serials) = cmp.serials_mut();
                if left_serials.len() != right_serials.len() {
                    left_serials.remove_if_last(ValueKey::Lbl(*ll));
                    right_serials.remove_if_last(ValueKey::Lbl(*rl));
                }
                Ordering::Equal
            }
            _ => result,
        }
    }

    fn cmp_types(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        left: Typeref,
        right: Typeref,
    ) -> Ordering {
        if self.relaxed() {
            match (cmp.left().resolve(left), cmp.right().resolve(right)) {
                (
                    Some(AnyType::Primary(PrimaryType::Int(_))),
                    Some(AnyType::Primary(PrimaryType::Int(_))),
                ) => return Ordering::Equal,
                (Some(AnyType::Array(l)), Some(AnyType::Array(r))) => {
                    return cmp.cmp_types(l.ty, r.ty);
                }
                _ => {}
            }
        }
        cmp.baseline_cmp_types(left, right)
    }

    fn cmp_ints(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        left: &IConst,
        right: &IConst,
    ) -> Ordering {
        let result = cmp.baseline_cmp_ints(left, right);
        if result.is_eq() || !self.relaxed() {
            return result;
        }
        left.zext_value().cmp(&right.zext_value())
    }

    fn cmp_attrs(
        &self,
        cmp: &mut FunctionComparator<'_, Self>,
        left: &AttributeList,
        right: &AttributeList,
    ) -> Ordering {
        let left = left.without(AttributeFlags::INLINING);
        let right = right.without(AttributeFlags::INLINING);
        cmp.baseline_cmp_attrs(&left, &right)
    }
}
