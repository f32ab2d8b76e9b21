mod common;

use common::{compare, define, int, named_struct, opaque_ptr, relaxed, strict};
use dfcore::{
    compare::{
        FunctionComparator, InlineRequest, Side, differential::DifferentialHooks,
        serial::ValueKey, view::FunctionView,
    },
    debuginfo::DebugInfo,
};
use dfinstr::{
    consts::{AnyConst, int::IConst},
    modules::{
        Module,
        attributes::{AttributeFlags, AttributeList},
        builder::FunctionBuilder,
        instructions::Instr,
        int::{IBinaryVariant, ICmpVariant},
        misc::CastVariant,
        operand::{Label, Operand},
    },
    types::{
        Typeref,
        aggregate::{ArrayType, StructType},
        primary::{IType, PtrType},
    },
};

fn build_abs(module: &mut Module) {
    let i32_ty = int(module, 32);
    let i1 = int(module, 1);
    define(module, "abs", &[i32_ty], Some(i32_ty), |fb, args| {
        let x = args[0].clone();
        let negative = fb.new_block();
        let exit = fb.new_block();

        let zero = Operand::from(IConst::from(0i32));
        let cond = fb.icmp(ICmpVariant::Slt, i1, x.clone(), zero.clone());
        fb.cond_branch(cond, negative, exit);

        fb.switch_to(negative);
        let neg = fb.binary(IBinaryVariant::Sub, i32_ty, zero, x.clone());
        fb.branch(exit);

        fb.switch_to(exit);
        let result = fb.phi(i32_ty, vec![(Label::NIL, x), (negative, neg)]);
        fb.ret(Some(result));
    });
}

#[test]
fn reflexive_in_both_modes() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_abs(&mut left);
    build_abs(&mut right);
    let debug_info = DebugInfo::default();

    assert!(compare(&strict(), &debug_info, &left, &right, "abs").is_equal());
    assert!(compare(&relaxed(), &debug_info, &left, &right, "abs").is_equal());
    // Same module on both sides.
    assert!(compare(&strict(), &debug_info, &left, &left, "abs").is_equal());
}

#[test]
fn different_operations_differ() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    for (module, variant) in [
        (&mut left, IBinaryVariant::Add),
        (&mut right, IBinaryVariant::Sub),
    ] {
        let i32_ty = int(module, 32);
        define(module, "f", &[i32_ty, i32_ty], Some(i32_ty), |fb, args| {
            let r = fb.binary(variant, i32_ty, args[0].clone(), args[1].clone());
            fb.ret(Some(r));
        });
    }

    let result = compare(&relaxed(), &DebugInfo::default(), &left, &right, "f");
    assert!(!result.is_equal());
    assert!(result.inline_request().is_none());
}

/// `return &p->a;` where `a` moved from index 0 to index 1.
fn build_field_access(module: &mut Module, fields: [&str; 2], debug_info: &mut DebugInfo) {
    let i32_ty = int(module, 32);
    let (st, st_ptr) = named_struct(module, "S", &[32, 32]);
    let field_ptr = module.intern(PtrType::to(i32_ty));
    debug_info.struct_field_names.record_struct(st, fields);

    let index = fields.iter().position(|f| *f == "a").expect("field a") as i32;
    define(module, "get_a", &[st_ptr], Some(i32_ty), |fb, args| {
        let p = fb.gep(
            field_ptr,
            st,
            args[0].clone(),
            vec![IConst::from(0i32).into(), IConst::from(index).into()],
        );
        let v = fb.load(i32_ty, p);
        fb.ret(Some(v));
    });
}

#[test]
fn reordered_fields_match_by_name() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    let mut debug_info = DebugInfo::default();
    build_field_access(&mut left, ["a", "b"], &mut debug_info);
    build_field_access(&mut right, ["b", "a"], &mut debug_info);

    assert!(compare(&strict(), &debug_info, &left, &right, "get_a").is_equal());
    assert!(compare(&relaxed(), &debug_info, &left, &right, "get_a").is_equal());

    // Without field names the byte offsets (0 vs 4) decide.
    let no_names = DebugInfo::default();
    assert!(!compare(&strict(), &no_names, &left, &right, "get_a").is_equal());
}

/// `return &p[i];` over the structure `name`.
fn build_element_access(module: &mut Module, name: &str, field_bits: &[u32]) {
    let i64_ty = int(module, 64);
    let (st, st_ptr) = named_struct(module, name, field_bits);
    define(module, "nth", &[st_ptr, i64_ty], Some(st_ptr), |fb, args| {
        let p = fb.gep(st_ptr, st, args[0].clone(), vec![args[1].clone()]);
        fb.ret(Some(p));
    });
}

#[test]
fn element_access_follows_grown_struct() {
    let debug_info = DebugInfo::default();
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_element_access(&mut left, "S", &[32, 32]);
    build_element_access(&mut right, "S", &[32, 32, 32]);
    assert!(compare(&strict(), &debug_info, &left, &right, "nth").is_equal());

    let mut right = Module::new("right");
    build_element_access(&mut right, "T", &[32, 32, 32]);
    assert!(!compare(&strict(), &debug_info, &left, &right, "nth").is_equal());
}

#[test]
fn field_names_need_same_struct() {
    let mut left = Module::new("left");
    let mut debug_info = DebugInfo::default();
    build_field_access(&mut left, ["a", "b"], &mut debug_info);

    // `T { b, a }` shares the field name but not the structure.
    let mut right = Module::new("right");
    let i32_ty = int(&right, 32);
    let (st, st_ptr) = named_struct(&right, "T", &[32, 32]);
    let field_ptr = right.intern(PtrType::to(i32_ty));
    debug_info.struct_field_names.record_struct(st, ["b", "a"]);
    define(&mut right, "get_a", &[st_ptr], Some(i32_ty), |fb, args| {
        let p = fb.gep(
            field_ptr,
            st,
            args[0].clone(),
            vec![IConst::from(0i32).into(), IConst::from(1i32).into()],
        );
        let v = fb.load(i32_ty, p);
        fb.ret(Some(v));
    });

    assert!(!compare(&strict(), &debug_info, &left, &right, "get_a").is_equal());
}

/// `return &p[-1];` with the index spelled as `value`.
fn build_previous_element(module: &mut Module, value: IConst) {
    let i32_ty = int(module, 32);
    let ptr = opaque_ptr(module);
    define(module, "prev", &[ptr], Some(ptr), |fb, args| {
        let p = fb.gep(ptr, i32_ty, args[0].clone(), vec![value.into()]);
        fb.ret(Some(p));
    });
}

#[test]
fn index_bits_decide_offset() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_previous_element(&mut left, IConst::from(-1i32));
    build_previous_element(&mut right, IConst::from(u32::MAX));
    assert!(compare(&strict(), &DebugInfo::default(), &left, &right, "prev").is_equal());

    let f = right.function_by_name("prev").expect("prev");
    let gep = match &f.body[&Label::NIL].instructions[0] {
        Instr::MGetElementPtr(gep) => gep,
        other => panic!("expected a gep, found {other:?}"),
    };
    assert_eq!(FunctionView::new(&right, f).constant_offset(gep), Some(-4));
}

/// `return &a[0][i];` over `[n x iN]`.
fn build_array_access(module: &mut Module, num_elements: usize, bits: u32) {
    let i64_ty = int(module, 64);
    let ptr = opaque_ptr(module);
    let element = int(module, bits);
    let array = module.intern(ArrayType {
        ty: element,
        num_elements,
    });
    define(module, "at", &[ptr, i64_ty], Some(ptr), |fb, args| {
        let p = fb.gep(
            ptr,
            array,
            args[0].clone(),
            vec![IConst::from(0u64).into(), args[1].clone()],
        );
        fb.ret(Some(p));
    });
}

#[test]
fn relaxed_arrays_compare_by_element_kind() {
    let debug_info = DebugInfo::default();
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_array_access(&mut left, 4, 32);
    build_array_access(&mut right, 8, 64);

    assert!(compare(&relaxed(), &debug_info, &left, &right, "at").is_equal());
    assert!(!compare(&strict(), &debug_info, &left, &right, "at").is_equal());
}

/// `S *s = kmalloc(size); return s;`
fn build_allocation(module: &mut Module, field_bits: &[u32], size: u64) {
    build_allocation_shape(module, "S", field_bits, Some(size), true);
}

/// `kmalloc(size)` with `size` taken from the parameter when `None`, and the
/// result cast to the structure `name` only when `cast` is set.
fn build_allocation_shape(
    module: &mut Module,
    name: &str,
    field_bits: &[u32],
    size: Option<u64>,
    cast: bool,
) {
    let i64_ty = int(module, 64);
    let raw_ptr = opaque_ptr(module);
    let (_, st_ptr) = named_struct(module, name, field_bits);
    let kmalloc = module.declare_external("kmalloc", vec![i64_ty], Some(raw_ptr), false);
    let ret_ty = if cast { st_ptr } else { raw_ptr };

    define(module, "make", &[i64_ty], Some(ret_ty), |fb, args| {
        let size = size.map_or_else(|| args[0].clone(), |size| IConst::from(size).into());
        let raw = fb
            .call(Some(raw_ptr), kmalloc, vec![size])
            .expect("non-void call");
        let result = if cast {
            fb.cast(CastVariant::BitCast, st_ptr, raw)
        } else {
            raw
        };
        fb.ret(Some(result));
    });
}

#[test]
fn allocation_follows_grown_struct() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_allocation(&mut left, &[32, 32], 8);
    build_allocation(&mut right, &[32, 32, 32], 12);

    let debug_info = DebugInfo::default();
    assert!(compare(&strict(), &debug_info, &left, &right, "make").is_equal());
}

#[test]
fn allocation_of_other_size_differs() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_allocation(&mut left, &[32, 32], 8);
    build_allocation(&mut right, &[32, 32, 32], 16);

    let debug_info = DebugInfo::default();
    assert!(!compare(&strict(), &debug_info, &left, &right, "make").is_equal());
}

#[test]
fn allocation_without_sizeof_shape_differs() {
    let debug_info = DebugInfo::default();
    let mut left = Module::new("left");
    build_allocation_shape(&mut left, "S", &[32, 32], Some(8), true);

    // The result is never cast to the structure.
    let mut uncast_left = Module::new("left");
    let mut uncast_right = Module::new("right");
    build_allocation_shape(&mut uncast_left, "S", &[32, 32], Some(8), false);
    build_allocation_shape(&mut uncast_right, "S", &[32, 32, 32], Some(12), false);
    assert!(!compare(&strict(), &debug_info, &uncast_left, &uncast_right, "make").is_equal());

    // The size is not a constant.
    let mut right = Module::new("right");
    build_allocation_shape(&mut right, "S", &[32, 32, 32], None, true);
    assert!(!compare(&strict(), &debug_info, &left, &right, "make").is_equal());

    // The structures are not the same.
    let mut right = Module::new("right");
    build_allocation_shape(&mut right, "T", &[32, 32, 32], Some(12), true);
    assert!(!compare(&strict(), &debug_info, &left, &right, "make").is_equal());
}

/// `memset(p, 0, size);` through the `llvm.memset` intrinsic.
fn build_memset(module: &mut Module, field_bits: &[u32], size: u64) {
    let i8_ty = int(module, 8);
    let i64_ty = int(module, 64);
    let (_, st_ptr) = named_struct(module, "S", field_bits);
    let memset = module.declare_external(
        "llvm.memset.p0.i64",
        vec![st_ptr, i8_ty, i64_ty],
        None,
        false,
    );

    define(module, "clear", &[st_ptr], None, |fb, args| {
        fb.call(
            None,
            memset,
            vec![
                args[0].clone(),
                IConst::from(0u8).into(),
                IConst::from(size).into(),
            ],
        );
        fb.ret(None);
    });
}

#[test]
fn memset_follows_grown_struct() {
    let debug_info = DebugInfo::default();

    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_memset(&mut left, &[32, 32], 8);
    build_memset(&mut right, &[32, 32, 32], 12);
    assert!(compare(&strict(), &debug_info, &left, &right, "clear").is_equal());

    let mut right = Module::new("right");
    build_memset(&mut right, &[32, 32, 32], 16);
    assert!(!compare(&strict(), &debug_info, &left, &right, "clear").is_equal());
}

/// `report(a, b)` or `report(a, b, extra)`.
fn build_report(module: &mut Module, extra: Option<bool>) {
    let i32_ty = int(module, 32);
    let i1 = int(module, 1);
    let mut param_types = vec![i32_ty, i32_ty];
    if extra.is_some() {
        param_types.push(i1);
    }
    let report = module.declare_external("report", param_types, None, false);

    define(module, "f", &[i32_ty, i32_ty], None, |fb, args| {
        let mut call_args = args.clone();
        if let Some(flag) = extra {
            call_args.push(IConst::from(flag).into());
        }
        fb.call(None, report, call_args);
        fb.ret(None);
    });
}

#[test]
fn trailing_default_argument_in_relaxed_mode() {
    let debug_info = DebugInfo::default();
    let mut left = Module::new("left");
    build_report(&mut left, None);

    let mut right = Module::new("right");
    build_report(&mut right, Some(false));
    assert!(compare(&relaxed(), &debug_info, &left, &right, "f").is_equal());
    assert!(!compare(&strict(), &debug_info, &left, &right, "f").is_equal());
    // Argument order does not matter.
    assert!(compare(&relaxed(), &debug_info, &right, &left, "f").is_equal());

    let mut right = Module::new("right");
    build_report(&mut right, Some(true));
    assert!(!compare(&relaxed(), &debug_info, &left, &right, "f").is_equal());
}

fn build_limit_check(module: &mut Module, limit: i32) {
    let i32_ty = int(module, 32);
    let i1 = int(module, 1);
    define(module, "check", &[i32_ty], Some(i1), |fb, args| {
        let c = fb.icmp(
            ICmpVariant::Slt,
            i1,
            args[0].clone(),
            IConst::from(limit).into(),
        );
        fb.ret(Some(c));
    });
}

#[test]
fn macro_constants_compare_by_rendering() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_limit_check(&mut left, 5);
    build_limit_check(&mut right, 7);

    let mut debug_info = DebugInfo::default();
    assert!(!compare(&strict(), &debug_info, &left, &right, "check").is_equal());

    debug_info.macro_constants.insert(IConst::from(5i32), "LIMIT");
    debug_info.macro_constants.insert(IConst::from(7i32), "LIMIT");
    assert!(compare(&strict(), &debug_info, &left, &right, "check").is_equal());

    let mut other = DebugInfo::default();
    other.macro_constants.insert(IConst::from(5i32), "LIMIT");
    other.macro_constants.insert(IConst::from(7i32), "MAX");
    assert!(!compare(&strict(), &other, &left, &right, "check").is_equal());
}

/// `x + (i64)y` on the left, `x + y` with a wider `y` on the right.
#[test]
fn casts_are_transparent_in_relaxed_mode() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");

    let i64_ty = int(&left, 64);
    let i32_ty = int(&left, 32);
    define(&mut left, "sum", &[i64_ty, i32_ty], Some(i64_ty), |fb, args| {
        let wide = fb.cast(CastVariant::SExt, i64_ty, args[1].clone());
        let s = fb.binary(IBinaryVariant::Add, i64_ty, args[0].clone(), wide);
        fb.ret(Some(s));
    });

    let i64_ty = int(&right, 64);
    define(&mut right, "sum", &[i64_ty, i64_ty], Some(i64_ty), |fb, args| {
        let s = fb.binary(IBinaryVariant::Add, i64_ty, args[0].clone(), args[1].clone());
        fb.ret(Some(s));
    });

    let debug_info = DebugInfo::default();
    assert!(compare(&relaxed(), &debug_info, &left, &right, "sum").is_equal());
    assert!(!compare(&strict(), &debug_info, &left, &right, "sum").is_equal());
}

fn build_bound_check(module: &mut Module, bits: u32, variant: ICmpVariant) {
    let ity = int(module, bits);
    let i1 = int(module, 1);
    let bound = IConst::new(IType::new(bits).expect("valid width"), 100);
    define(module, "in_bounds", &[ity], Some(i1), |fb, args| {
        let c = fb.icmp(variant, i1, args[0].clone(), bound.into());
        fb.ret(Some(c));
    });
}

#[test]
fn relaxed_integers_ignore_sign_and_width() {
    let debug_info = DebugInfo::default();

    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_bound_check(&mut left, 32, ICmpVariant::Slt);
    build_bound_check(&mut right, 32, ICmpVariant::Ult);
    assert!(compare(&relaxed(), &debug_info, &left, &right, "in_bounds").is_equal());
    assert!(!compare(&strict(), &debug_info, &left, &right, "in_bounds").is_equal());

    let mut right = Module::new("right");
    build_bound_check(&mut right, 64, ICmpVariant::Slt);
    assert!(compare(&relaxed(), &debug_info, &left, &right, "in_bounds").is_equal());
    assert!(!compare(&strict(), &debug_info, &left, &right, "in_bounds").is_equal());

    let mut right = Module::new("right");
    build_bound_check(&mut right, 32, ICmpVariant::Sgt);
    assert!(!compare(&relaxed(), &debug_info, &left, &right, "in_bounds").is_equal());
}

#[test]
fn inlining_attributes_are_ignored() {
    let debug_info = DebugInfo::default();
    let mut modules = Vec::new();
    for flags in [
        AttributeFlags::ALWAYS_INLINE,
        AttributeFlags::NO_INLINE | AttributeFlags::INLINE_HINT,
        AttributeFlags::COLD,
    ] {
        let mut module = Module::new("m");
        let i32_ty = int(&module, 32);
        let mut fb = FunctionBuilder::new("id", &[i32_ty], Some(i32_ty))
            .with_attributes(AttributeList::function(flags));
        let x = fb.params().remove(0);
        fb.ret(Some(x));
        module.add_function(fb.finish().expect("id"));
        modules.push(module);
    }

    assert!(compare(&strict(), &debug_info, &modules[0], &modules[1], "id").is_equal());
    assert!(!compare(&strict(), &debug_info, &modules[0], &modules[2], "id").is_equal());
}

fn build_stack_struct(module: &mut Module, name: Option<&str>, field_bits: &[u32]) {
    let fields = field_bits.iter().map(|bits| int(module, *bits)).collect();
    let st = module.intern(match name {
        Some(name) => StructType::named(name, fields),
        None => StructType::literal(fields),
    });
    let st_ptr = module.intern(PtrType::to(st));
    define(module, "local", &[], None, |fb, _| {
        fb.alloca(st_ptr, st, 4);
        fb.ret(None);
    });
}

#[test]
fn stack_allocation_of_resized_struct() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_stack_struct(&mut left, Some("S"), &[32, 32]);
    build_stack_struct(&mut right, Some("S"), &[32, 32, 32]);

    assert!(compare(&strict(), &DebugInfo::default(), &left, &right, "local").is_equal());
}

#[test]
fn stack_allocation_of_resized_literal_struct() {
    let debug_info = DebugInfo::default();
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_stack_struct(&mut left, None, &[32, 32]);
    build_stack_struct(&mut right, None, &[32, 32, 32]);
    assert!(compare(&strict(), &debug_info, &left, &right, "local").is_equal());

    let mut right = Module::new("right");
    build_stack_struct(&mut right, Some("S"), &[32, 32, 32]);
    assert!(!compare(&strict(), &debug_info, &left, &right, "local").is_equal());
}

fn build_spill(module: &mut Module, with_slot: bool) {
    let i32_ty = int(module, 32);
    let slot_ptr = module.intern(PtrType::to(i32_ty));
    define(module, "spill", &[i32_ty], Some(i32_ty), |fb, args| {
        if with_slot {
            fb.alloca(slot_ptr, i32_ty, 4);
        }
        fb.ret(Some(args[0].clone()));
    });
}

#[test]
fn skipped_instructions_keep_serial_maps_aligned() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_spill(&mut left, true);
    build_spill(&mut right, false);

    let debug_info = DebugInfo::default();
    assert!(compare(&relaxed(), &debug_info, &left, &right, "spill").is_equal());
    assert!(compare(&relaxed(), &debug_info, &right, &left, "spill").is_equal());
    assert!(!compare(&strict(), &debug_info, &left, &right, "spill").is_equal());

    let config = relaxed();
    let hooks = DifferentialHooks::new(&config, &debug_info);
    let lf = left.function_by_name("spill").expect("left");
    let rf = right.function_by_name("spill").expect("right");
    let mut cmp = FunctionComparator::new(&hooks, (&left, lf), (&right, rf));
    let (lb, rb) = (lf.entry().expect("entry"), rf.entry().expect("entry"));
    assert!(cmp.cmp_basic_blocks(lb, rb).is_eq());
    let (ls, rs) = cmp.serials();
    assert_eq!(ls.len(), rs.len());
}

/// `if (c) { ... } return;` where the right side duplicated the return
/// block instead of branching back into the shared one.
fn build_shared_exit(module: &mut Module, duplicate_exit: bool) -> [Label; 3] {
    let i1 = int(module, 1);
    let mut labels = [Label::NIL; 3];
    define(module, "pick", &[i1], None, |fb, args| {
        let then = fb.new_block();
        let exit = fb.new_block();
        let tail = if duplicate_exit { fb.new_block() } else { exit };
        labels = [then, exit, tail];
        fb.cond_branch(args[0].clone(), then, exit);

        fb.switch_to(then);
        fb.branch(tail);

        fb.switch_to(exit);
        fb.ret(None);
        if duplicate_exit {
            fb.switch_to(tail);
            fb.ret(None);
        }
    });
    labels
}

#[test]
fn block_references_cross_match() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    let [then_l, _, _] = build_shared_exit(&mut left, false);
    let [then_r, _, tail_r] = build_shared_exit(&mut right, true);

    let debug_info = DebugInfo::default();
    assert!(compare(&strict(), &debug_info, &left, &right, "pick").is_equal());

    let config = strict();
    let hooks = DifferentialHooks::new(&config, &debug_info);
    let lf = left.function_by_name("pick").expect("left");
    let rf = right.function_by_name("pick").expect("right");
    let mut cmp = FunctionComparator::new(&hooks, (&left, lf), (&right, rf));
    let (le, re) = (lf.entry().expect("entry"), rf.entry().expect("entry"));
    assert!(cmp.cmp_basic_blocks(le, re).is_eq());
    assert!(cmp.cmp_basic_blocks(&lf.body[&then_l], &rf.body[&then_r]).is_eq());

    let (ls, rs) = cmp.serials();
    assert_eq!(ls.len(), rs.len());
    assert_eq!(rs.get(ValueKey::Lbl(tail_r)), None);
}

/// The left side moved `x + 1` into `helper`.
fn build_extracted(left: &mut Module, right: &mut Module) {
    let i32_ty = int(left, 32);
    let helper = define(left, "helper", &[i32_ty], Some(i32_ty), |fb, args| {
        let r = fb.binary(IBinaryVariant::Add, i32_ty, args[0].clone(), IConst::from(1i32).into());
        fb.ret(Some(r));
    });
    define(left, "f", &[i32_ty], Some(i32_ty), |fb, args| {
        let r = fb
            .call(Some(i32_ty), helper, vec![args[0].clone()])
            .expect("non-void call");
        fb.ret(Some(r));
    });

    let i32_ty = int(right, 32);
    define(right, "f", &[i32_ty], Some(i32_ty), |fb, args| {
        let r = fb.binary(IBinaryVariant::Add, i32_ty, args[0].clone(), IConst::from(1i32).into());
        fb.ret(Some(r));
    });
}

#[test]
fn inline_request_is_drained_once() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    build_extracted(&mut left, &mut right);

    let mut result = compare(&strict(), &DebugInfo::default(), &left, &right, "f");
    assert!(!result.is_equal());

    let request = result.take_inline_request().expect("inline request");
    assert_eq!(
        request,
        InlineRequest {
            callee: "helper".to_string(),
            side: Side::Left,
        }
    );
    assert!(result.inline_request().is_none());
    assert!(result.take_inline_request().is_none());
}

#[test]
fn first_inline_request_wins() {
    let mut module = Module::new("m");
    build_spill(&mut module, false);
    let debug_info = DebugInfo::default();
    let config = strict();
    let hooks = DifferentialHooks::new(&config, &debug_info);
    let f = module.function_by_name("spill").expect("spill");

    let mut cmp = FunctionComparator::new(&hooks, (&module, f), (&module, f));
    assert!(cmp.inline_request().is_none());
    for callee in ["first", "second"] {
        cmp.request_inline(InlineRequest {
            callee: callee.to_string(),
            side: Side::Right,
        });
    }
    assert_eq!(cmp.inline_request().map(|r| r.callee.as_str()), Some("first"));

    let mut result = cmp.compare();
    assert!(result.is_equal());
    assert!(result.take_inline_request().is_some());
    assert!(result.inline_request().is_none());
}

#[test]
fn null_pointer_is_not_zero() {
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    for (module, value) in [
        (&mut left, Operand::Imm(AnyConst::Null { addr_space: 0 })),
        (&mut right, Operand::from(IConst::from(0u64))),
    ] {
        let ptr: Typeref = opaque_ptr(module);
        let store = module.declare_external("store", vec![ptr], None, true);
        define(module, "g", &[], None, |fb, _| {
            fb.call(None, store, vec![value]);
            fb.ret(None);
        });
    }
    assert!(!compare(&relaxed(), &DebugInfo::default(), &left, &right, "g").is_equal());
}
