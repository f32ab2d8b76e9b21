use std::{cmp::Ordering, collections::HashSet};

use dfinstr::{
    consts::{AnyConst, int::IConst},
    modules::{
        BasicBlock, Function, Module,
        attributes::AttributeList,
        instructions::Instr,
        mem::MGetElementPtr,
        operand::{Label, Operand},
        operation::Operation,
    },
    types::{AnyType, Typeref, primary::{IType, PrimaryType}},
};
use log::{debug, trace};

use crate::compare::{
    Comparison, InlineRequest, OpSite, Side,
    hooks::ComparisonHooks,
    serial::{Checkpoint, SerialMap, ValueKey},
    view::FunctionView,
};

/// One comparison session over a pair of functions.
///
/// The session owns a fresh [`SerialMap`] per side and the inline-request
/// slot; both are dropped with the session. Retrying after an inline must
/// start a new session.
pub struct FunctionComparator<'a, H: ComparisonHooks> {
    hooks: &'a H,
    left: FunctionView<'a>,
    right: FunctionView<'a>,
    left_serials: SerialMap,
    right_serials: SerialMap,
    inline_request: Option<InlineRequest>,
}

fn value_key(operand: &Operand) -> Option<ValueKey> {
    match operand {
        Operand::Reg(name) => Some(ValueKey::Reg(*name)),
        Operand::Lbl(label) => Some(ValueKey::Lbl(*label)),
        Operand::Imm(_) | Operand::Func(_) => None,
    }
}

fn type_rank(ty: &AnyType) -> u8 {
    match ty {
        AnyType::Primary(PrimaryType::Int(_)) => 0,
        AnyType::Primary(PrimaryType::Float(_)) => 1,
        AnyType::Primary(PrimaryType::Ptr(_)) => 2,
        AnyType::Primary(PrimaryType::Lbl(_)) => 3,
        AnyType::Array(_) => 4,
        AnyType::Struct(_) => 5,
    }
}

impl<'a, H: ComparisonHooks> FunctionComparator<'a, H> {
    pub fn new(hooks: &'a H, left: (&'a Module, &'a Function), right: (&'a Module, &'a Function)) -> Self {
        Self {
            hooks,
            left: FunctionView::new(left.0, left.1),
            right: FunctionView::new(right.0, right.1),
            left_serials: SerialMap::new(),
            right_serials: SerialMap::new(),
            inline_request: None,
        }
    }

    pub fn left(&self) -> &FunctionView<'a> {
        &self.left
    }

    pub fn right(&self) -> &FunctionView<'a> {
        &self.right
    }

    pub fn view(&self, side: Side) -> &FunctionView<'a> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn serials(&self) -> (&SerialMap, &SerialMap) {
        (&self.left_serials, &self.right_serials)
    }

    pub fn serials_mut(&mut self) -> (&mut SerialMap, &mut SerialMap) {
        (&mut self.left_serials, &mut self.right_serials)
    }

    pub fn checkpoint(&self) -> (Checkpoint, Checkpoint) {
        (self.left_serials.checkpoint(), self.right_serials.checkpoint())
    }

    pub fn rollback(&mut self, (left, right): (Checkpoint, Checkpoint)) {
        self.left_serials.rollback(left);
        self.right_serials.rollback(right);
    }

    /// Fill the inline-request slot. The first request of a session wins.
    pub fn request_inline(&mut self, request: InlineRequest) {
        match &self.inline_request {
            Some(pending) if *pending != request => trace!(
                "Dropping inline request for `{}`, `{}` is already pending",
                request.callee, pending.callee
            ),
            Some(_) => {}
            None => {
                debug!(
                    "Requesting inline of `{}` ({} side) while comparing `{}`",
                    request.callee, request.side, self.left.function.name
                );
                self.inline_request = Some(request);
            }
        }
    }

    pub fn inline_request(&self) -> Option<&InlineRequest> {
        self.inline_request.as_ref()
    }

    /// Run the session to completion.
    pub fn compare(mut self) -> Comparison {
        let ordering = self.compare_functions();
        Comparison::new(ordering, self.inline_request)
    }

    fn compare_signatures(&mut self) -> Ordering {
        let (lf, rf) = (self.left.function, self.right.function);
        try_cmp!(self.cmp_attrs(&lf.attributes, &rf.attributes));
        try_cmp!(lf.variadic.cmp(&rf.variadic));
        try_cmp!(lf.cconv.cmp(&rf.cconv));
        try_cmp!(self.cmp_optional_types(lf.return_type, rf.return_type));
        try_cmp!(lf.params.len().cmp(&rf.params.len()));
        for ((_, lt), (_, rt)) in lf.params.iter().zip(&rf.params) {
            try_cmp!(self.cmp_types(*lt, *rt));
        }
        Ordering::Equal
    }

    fn compare_functions(&mut self) -> Ordering {
        try_cmp!(self.compare_signatures());

        let (lf, rf) = (self.left.function, self.right.function);
        for ((ln, _), (rn, _)) in lf.params.iter().zip(&rf.params) {
            try_cmp!(self.number_keys(ValueKey::Reg(*ln), ValueKey::Reg(*rn)));
        }

        if lf.is_declaration() || rf.is_declaration() {
            return rf.is_declaration().cmp(&lf.is_declaration());
        }

        // Depth-first walk pairing successors positionally.
        let mut worklist = vec![(Label::NIL, Label::NIL)];
        let mut visited = HashSet::from([Label::NIL]);
        while let Some((ll, rl)) = worklist.pop() {
            try_cmp!(self.cmp_values(&Operand::Lbl(ll), &Operand::Lbl(rl)));

            let (lb, rb) = match (self.left.block(ll), self.right.block(rl)) {
                (Some(lb), Some(rb)) => (lb, rb),
                (None, _) => return Ordering::Less,
                (_, None) => return Ordering::Greater,
            };
            try_cmp!(self.cmp_basic_blocks(lb, rb));

            let (ls, rs) = (lb.terminator.successors(), rb.terminator.successors());
            try_cmp!(ls.len().cmp(&rs.len()));
            for (l, r) in ls.into_iter().zip(rs) {
                if visited.insert(l) {
                    worklist.push((l, r));
                }
            }
        }

        Ordering::Equal
    }

    pub fn cmp_basic_blocks(&mut self, left: &'a BasicBlock, right: &'a BasicBlock) -> Ordering {
        let hooks = self.hooks;
        hooks.cmp_basic_blocks(self, left, right)
    }

    pub fn cmp_operations(
        &mut self,
        left: OpSite<'a>,
        right: OpSite<'a>,
        need_operands: &mut bool,
    ) -> Ordering {
        let hooks = self.hooks;
        hooks.cmp_operations(self, left, right, need_operands)
    }

    pub fn cmp_geps(&mut self, left: &'a MGetElementPtr, right: &'a MGetElementPtr) -> Ordering {
        let hooks = self.hooks;
        hooks.cmp_geps(self, left, right)
    }

    pub fn cmp_values(&mut self, left: &Operand, right: &Operand) -> Ordering {
        let hooks = self.hooks;
        hooks.cmp_values(self, left, right)
    }

    pub fn cmp_types(&mut self, left: Typeref, right: Typeref) -> Ordering {
        let hooks = self.hooks;
        hooks.cmp_types(self, left, right)
    }

    pub fn cmp_ints(&mut self, left: &IConst, right: &IConst) -> Ordering {
        let hooks = self.hooks;
        hooks.cmp_ints(self, left, right)
    }

    pub fn cmp_attrs(&mut self, left: &AttributeList, right: &AttributeList) -> Ordering {
        let hooks = self.hooks;
        hooks.cmp_attrs(self, left, right)
    }

    pub fn cmp_optional_types(&mut self, left: Option<Typeref>, right: Option<Typeref>) -> Ordering {
        match (left, right) {
            (Some(l), Some(r)) => self.cmp_types(l, r),
            (l, r) => l.is_some().cmp(&r.is_some()),
        }
    }

    /// Compare the types of two operands, each typed on its own side.
    pub fn cmp_operand_types(&mut self, left: &Operand, right: &Operand) -> Ordering {
        let lt = self.left.type_of(left);
        let rt = self.right.type_of(right);
        self.cmp_optional_types(lt, rt)
    }

    /// Number both keys on their side and compare the numbers.
    pub fn number_keys(&mut self, left: ValueKey, right: ValueKey) -> Ordering {
        let l = self.left_serials.number(left);
        let r = self.right_serials.number(right);
        l.cmp(&r)
    }

    /// Operation at `index` of `block`, with its position.
    pub fn site(block: &'a BasicBlock, index: usize) -> Option<OpSite<'a>> {
        Some(OpSite {
            label: block.label,
            index,
            operation: block.operation(index)?,
        })
    }

    pub fn report_divergence(&self, left: OpSite<'a>, right: OpSite<'a>) {
        debug!(
            "`{}` diverges: `{}` vs `{}`",
            self.left.function.name,
            left.operation.fmt(Some(self.left.module)),
            right.operation.fmt(Some(self.right.module))
        );
    }

    /// Compare operands pairwise after the operations themselves matched.
    ///
    /// # Panics
    /// When the operand counts differ: a hook accepted two operations of
    /// different shape without handling their operands.
    pub fn cmp_operands(&mut self, left: OpSite<'a>, right: OpSite<'a>) -> Ordering {
        let lops = left.operation.operands();
        let rops = right.operation.operands();
        assert_eq!(
            lops.len(),
            rops.len(),
            "operations `{}` and `{}` matched with different operand counts",
            left.operation.opcode(),
            right.operation.opcode()
        );
        for (l, r) in lops.iter().zip(rops.iter()) {
            try_cmp!(self.cmp_values(l, r));
        }
        Ordering::Equal
    }

    pub fn baseline_cmp_basic_blocks(&mut self, left: &'a BasicBlock, right: &'a BasicBlock) -> Ordering {
        let (mut il, mut ir) = (0, 0);
        while let (Some(sl), Some(sr)) = (Self::site(left, il), Self::site(right, ir)) {
            let mut need_operands = true;
            let res = self.cmp_operations(sl, sr, &mut need_operands);
            if res.is_ne() {
                self.report_divergence(sl, sr);
                return res;
            }
            if need_operands {
                let res = self.cmp_operands(sl, sr);
                if res.is_ne() {
                    self.report_divergence(sl, sr);
                    return res;
                }
            }
            il += 1;
            ir += 1;
        }
        (il < left.len()).cmp(&(ir < right.len()))
    }

    /// Number the results of both operations: register results go through
    /// [`Self::cmp_values`], the others are numbered by position.
    fn number_operations(&mut self, left: OpSite<'a>, right: OpSite<'a>) -> Ordering {
        match (left.operation.destination(), right.operation.destination()) {
            (Some(dl), Some(dr)) => self.cmp_values(&Operand::Reg(dl), &Operand::Reg(dr)),
            _ => self.number_keys(left.key(), right.key()),
        }
    }

    pub fn baseline_cmp_operations(
        &mut self,
        left: OpSite<'a>,
        right: OpSite<'a>,
        need_operands: &mut bool,
    ) -> Ordering {
        *need_operands = true;
        try_cmp!(self.number_operations(left, right));
        try_cmp!(left.operation.opcode().cmp(&right.operation.opcode()));

        if let (
            Operation::Instr(Instr::MGetElementPtr(gl)),
            Operation::Instr(Instr::MGetElementPtr(gr)),
        ) = (left.operation, right.operation)
        {
            *need_operands = false;
            try_cmp!(self.cmp_values(&gl.base, &gr.base));
            return self.cmp_geps(gl, gr);
        }

        try_cmp!(left.operation.num_operands().cmp(&right.operation.num_operands()));
        try_cmp!(self.cmp_optional_types(left.operation.result_type(), right.operation.result_type()));
        let (lops, rops) = (left.operation.operands(), right.operation.operands());
        for (l, r) in lops.iter().zip(rops.iter()) {
            try_cmp!(self.cmp_operand_types(l, r));
        }

        self.cmp_special_state(left.operation, right.operation)
    }

    /// Fields of an operation that are not operands.
    fn cmp_special_state(&mut self, left: Operation<'a>, right: Operation<'a>) -> Ordering {
        let (Operation::Instr(left), Operation::Instr(right)) = (left, right) else {
            return Ordering::Equal;
        };
        match (left, right) {
            (Instr::IBinary(l), Instr::IBinary(r)) => l.variant.cmp(&r.variant),
            (Instr::ICmp(l), Instr::ICmp(r)) => l.variant.cmp(&r.variant),
            (Instr::MLoad(l), Instr::MLoad(r)) => l
                .volatile
                .cmp(&r.volatile)
                .then(l.alignment.cmp(&r.alignment))
                .then(l.ordering.cmp(&r.ordering)),
            (Instr::MStore(l), Instr::MStore(r)) => l
                .volatile
                .cmp(&r.volatile)
                .then(l.alignment.cmp(&r.alignment))
                .then(l.ordering.cmp(&r.ordering)),
            (Instr::MAlloca(l), Instr::MAlloca(r)) => {
                try_cmp!(self.cmp_types(l.allocated, r.allocated));
                l.alignment.cmp(&r.alignment)
            }
            (Instr::Invoke(l), Instr::Invoke(r)) => {
                try_cmp!(l.cconv.cmp(&r.cconv));
                self.cmp_attrs(&l.attributes, &r.attributes)
            }
            (Instr::Cast(l), Instr::Cast(r)) => l.variant.cmp(&r.variant),
            (Instr::Phi(l), Instr::Phi(r)) => {
                for ((ll, _), (rl, _)) in l.values.iter().zip(&r.values) {
                    try_cmp!(self.cmp_values(&Operand::Lbl(*ll), &Operand::Lbl(*rl)));
                }
                Ordering::Equal
            }
            _ => Ordering::Equal,
        }
    }

    pub fn baseline_cmp_geps(&mut self, left: &'a MGetElementPtr, right: &'a MGetElementPtr) -> Ordering {
        let las = self.left.type_of(&left.base).and_then(|ty| self.left.addr_space(ty));
        let ras = self.right.type_of(&right.base).and_then(|ty| self.right.addr_space(ty));
        try_cmp!(las.cmp(&ras));

        // With constant indices only the byte offset matters.
        if let (Some(lo), Some(ro)) = (
            self.left.constant_offset(left),
            self.right.constant_offset(right),
        ) {
            let lty = IType::new(self.left.module.layout.pointer_size as u32 * 8).unwrap_or(IType::I64);
            let rty = IType::new(self.right.module.layout.pointer_size as u32 * 8).unwrap_or(IType::I64);
            return self.cmp_ints(&IConst::new(lty, lo), &IConst::new(rty, ro));
        }

        try_cmp!(self.cmp_types(left.source_ty, right.source_ty));
        try_cmp!(left.indices.len().cmp(&right.indices.len()));
        try_cmp!(self.cmp_values(&left.base, &right.base));
        for (l, r) in left.indices.iter().zip(&right.indices) {
            try_cmp!(self.cmp_values(l, r));
        }
        Ordering::Equal
    }

    pub fn baseline_cmp_values(&mut self, left: &Operand, right: &Operand) -> Ordering {
        match (left, right) {
            (Operand::Imm(l), Operand::Imm(r)) => {
                if l == r {
                    Ordering::Equal
                } else {
                    self.cmp_constants(l, r)
                }
            }
            (Operand::Imm(_), _) => Ordering::Greater,
            (_, Operand::Imm(_)) => Ordering::Less,
            (Operand::Func(l), Operand::Func(r)) => {
                match (self.left.symbol_name(l), self.right.symbol_name(r)) {
                    (Some(l), Some(r)) => l.cmp(r),
                    _ => Ordering::Less,
                }
            }
            (Operand::Func(_), _) => Ordering::Greater,
            (_, Operand::Func(_)) => Ordering::Less,
            _ => match (value_key(left), value_key(right)) {
                (Some(l), Some(r)) => self.number_keys(l, r),
                _ => Ordering::Less,
            },
        }
    }

    /// Null-ness first, then kind, then value.
    pub fn cmp_constants(&mut self, left: &AnyConst, right: &AnyConst) -> Ordering {
        match (left, right) {
            (AnyConst::Int(l), AnyConst::Int(r)) => self.cmp_ints(l, r),
            (AnyConst::Null { addr_space: l }, AnyConst::Null { addr_space: r }) => l.cmp(r),
            _ => right
                .is_null_value()
                .cmp(&left.is_null_value())
                .then(left.is_null().cmp(&right.is_null())),
        }
    }

    pub fn baseline_cmp_types(&mut self, left: Typeref, right: Typeref) -> Ordering {
        let (lt, rt) = match (self.left.resolve(left), self.right.resolve(right)) {
            (Some(lt), Some(rt)) => (lt, rt),
            (None, _) => return Ordering::Less,
            (_, None) => return Ordering::Greater,
        };
        try_cmp!(type_rank(&lt).cmp(&type_rank(&rt)));

        match (lt, rt) {
            (AnyType::Primary(PrimaryType::Int(l)), AnyType::Primary(PrimaryType::Int(r))) => {
                l.num_bits().cmp(&r.num_bits())
            }
            (AnyType::Primary(PrimaryType::Float(l)), AnyType::Primary(PrimaryType::Float(r))) => {
                l.cmp(&r)
            }
            (AnyType::Primary(PrimaryType::Ptr(l)), AnyType::Primary(PrimaryType::Ptr(r))) => {
                l.addr_space.cmp(&r.addr_space)
            }
            (AnyType::Array(l), AnyType::Array(r)) => {
                try_cmp!(l.num_elements.cmp(&r.num_elements));
                self.cmp_types(l.ty, r.ty)
            }
            (AnyType::Struct(l), AnyType::Struct(r)) => {
                try_cmp!(l.element_types.len().cmp(&r.element_types.len()));
                try_cmp!(l.packed.cmp(&r.packed));
                for (le, re) in l.element_types.iter().zip(&r.element_types) {
                    try_cmp!(self.cmp_types(*le, *re));
                }
                Ordering::Equal
            }
            _ => Ordering::Equal,
        }
    }

    pub fn baseline_cmp_ints(&mut self, left: &IConst, right: &IConst) -> Ordering {
        left.ty
            .num_bits()
            .cmp(&right.ty.num_bits())
            .then_with(|| left.zext_value().cmp(&right.zext_value()))
    }

    pub fn baseline_cmp_attrs(&mut self, left: &AttributeList, right: &AttributeList) -> Ordering {
        try_cmp!(left.function.bits().cmp(&right.function.bits()));
        try_cmp!(left.ret.bits().cmp(&right.ret.bits()));
        let params = left.params.len().max(right.params.len());
        for i in 0..params {
            try_cmp!(left.param(i).bits().cmp(&right.param(i).bits()));
        }
        Ordering::Equal
    }
}
