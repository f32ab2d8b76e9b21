mod common;

use common::{define, init_logger, int, relaxed, strict};
use dfcore::{
    base::config::DiffConfig,
    compare::Side,
    coordinator::{ModuleComparator, ResultKind, recursive_functions},
    debuginfo::DebugInfo,
    utils::error::DiffError,
};
use dfinstr::{
    consts::int::IConst,
    modules::{
        Module,
        builder::FunctionBuilder,
        int::IBinaryVariant,
        operand::{Name, Operand},
        terminator::{Ret, Terminator},
    },
};

/// `f(x) = (x + 1) * 2`, written inline on the left and through `helper` on
/// the right.
fn extracted_pair() -> (Module, Module) {
    let mut left = Module::new("left");
    let i32_ty = int(&left, 32);
    define(&mut left, "f", &[i32_ty], Some(i32_ty), |fb, args| {
        let a = fb.binary(IBinaryVariant::Add, i32_ty, args[0].clone(), IConst::from(1i32).into());
        let b = fb.binary(IBinaryVariant::Mul, i32_ty, a, IConst::from(2i32).into());
        fb.ret(Some(b));
    });

    let mut right = Module::new("right");
    let i32_ty = int(&right, 32);
    let helper = define(&mut right, "helper", &[i32_ty], Some(i32_ty), |fb, args| {
        let a = fb.binary(IBinaryVariant::Add, i32_ty, args[0].clone(), IConst::from(1i32).into());
        fb.ret(Some(a));
    });
    define(&mut right, "f", &[i32_ty], Some(i32_ty), |fb, args| {
        let a = fb
            .call(Some(i32_ty), helper, vec![args[0].clone()])
            .expect("non-void call");
        let b = fb.binary(IBinaryVariant::Mul, i32_ty, a, IConst::from(2i32).into());
        fb.ret(Some(b));
    });

    (left, right)
}

#[test]
fn extracted_logic_is_inlined_and_retried() {
    init_logger();
    let (left, right) = extracted_pair();
    let comparator = ModuleComparator::new(strict(), DebugInfo::default());

    let diff = comparator
        .compare_function_pair(&left, &right, "f", "f")
        .expect("both functions exist");
    assert_eq!(diff.kind, ResultKind::Equal);
    assert_eq!(diff.attempts, 2);
    assert_eq!(diff.inlined, vec!["helper".to_string()]);
    assert_eq!(
        diff.to_string(),
        "f <-> f: Equal after 2 attempt(s) (inlined: helper)"
    );

    // The modules themselves are left untouched.
    let f = right.function_by_name("f").expect("f");
    assert_eq!(f.calls().count(), 1);
}

#[test]
fn exhausted_budget_is_unknown() {
    init_logger();
    let (left, right) = extracted_pair();
    let config = DiffConfig {
        max_inline_attempts: 1,
        ..strict()
    };
    let comparator = ModuleComparator::new(config, DebugInfo::default());

    let diff = comparator
        .compare_function_pair(&left, &right, "f", "f")
        .expect("both functions exist");
    assert_eq!(diff.kind, ResultKind::Unknown);
    assert_eq!(diff.attempts, 1);
    assert_eq!(diff.inlined, vec!["helper".to_string()]);
}

#[test]
fn different_functions_are_not_equal() {
    init_logger();
    let mut left = Module::new("left");
    let mut right = Module::new("right");
    for (module, variant) in [
        (&mut left, IBinaryVariant::Add),
        (&mut right, IBinaryVariant::Xor),
    ] {
        let i32_ty = int(module, 32);
        define(module, "f", &[i32_ty], Some(i32_ty), |fb, args| {
            let r = fb.binary(variant, i32_ty, args[0].clone(), IConst::from(1i32).into());
            fb.ret(Some(r));
        });
    }

    let comparator = ModuleComparator::new(relaxed(), DebugInfo::default());
    let diff = comparator
        .compare_function_pair(&left, &right, "f", "f")
        .expect("both functions exist");
    assert_eq!(diff.kind, ResultKind::NotEqual);
    assert_eq!(diff.attempts, 1);
    assert!(diff.inlined.is_empty());
}

#[test]
fn recursive_callee_is_never_inlined() {
    init_logger();
    let mut left = Module::new("left");
    let i32_ty = int(&left, 32);
    define(&mut left, "f", &[i32_ty], Some(i32_ty), |fb, args| {
        let r = fb.binary(IBinaryVariant::Add, i32_ty, args[0].clone(), IConst::from(1i32).into());
        fb.ret(Some(r));
    });

    let mut right = Module::new("right");
    let i32_ty = int(&right, 32);
    let rec = define(&mut right, "rec", &[i32_ty], Some(i32_ty), |fb, args| {
        let self_ptr = fb.pointer();
        let r = fb
            .call(Some(i32_ty), self_ptr, vec![args[0].clone()])
            .expect("non-void call");
        fb.ret(Some(r));
    });
    define(&mut right, "f", &[i32_ty], Some(i32_ty), |fb, args| {
        let r = fb
            .call(Some(i32_ty), rec, vec![args[0].clone()])
            .expect("non-void call");
        fb.ret(Some(r));
    });

    let cyclic = recursive_functions(&right);
    assert!(cyclic.contains("rec"));
    assert!(!cyclic.contains("f"));

    let comparator = ModuleComparator::new(strict(), DebugInfo::default());
    let diff = comparator
        .compare_function_pair(&left, &right, "f", "f")
        .expect("both functions exist");
    assert_eq!(diff.kind, ResultKind::NotEqual);
    assert_eq!(diff.attempts, 1);
    assert!(diff.inlined.is_empty());
}

#[test]
fn mutual_recursion_is_detected() {
    let mut module = Module::new("m");
    let i32_ty = int(&module, 32);
    let mut ping = FunctionBuilder::new("ping", &[i32_ty], Some(i32_ty));
    let ping_ptr = ping.pointer();
    let pong = define(&mut module, "pong", &[i32_ty], Some(i32_ty), |fb, args| {
        let r = fb
            .call(Some(i32_ty), ping_ptr, vec![args[0].clone()])
            .expect("non-void call");
        fb.ret(Some(r));
    });
    let x = ping.params().remove(0);
    let r = ping.call(Some(i32_ty), pong, vec![x]).expect("non-void call");
    ping.ret(Some(r));
    module.add_function(ping.finish().expect("ping"));
    define(&mut module, "leaf", &[i32_ty], Some(i32_ty), |fb, args| {
        fb.ret(Some(args[0].clone()));
    });

    let cyclic = recursive_functions(&module);
    assert!(cyclic.contains("ping"));
    assert!(cyclic.contains("pong"));
    assert!(!cyclic.contains("leaf"));
}

#[test]
fn missing_function_is_an_error() {
    let (left, right) = extracted_pair();
    let comparator = ModuleComparator::default();

    let err = comparator
        .compare_function_pair(&left, &right, "f", "g")
        .expect_err("g does not exist");
    assert!(matches!(
        err,
        DiffError::FunctionNotFound { ref name, side: Side::Right } if name == "g"
    ));

    let err = comparator
        .compare_function_pair(&left, &right, "helper", "helper")
        .expect_err("helper only exists on the right");
    assert!(matches!(err, DiffError::FunctionNotFound { side: Side::Left, .. }));
}

#[test]
fn malformed_function_is_an_error() {
    let (left, mut right) = extracted_pair();
    let broken = right
        .functions
        .values_mut()
        .find(|f| f.name == "f")
        .expect("f");
    let entry = broken.body.values_mut().next().expect("entry");
    entry.terminator = Terminator::Ret(Ret {
        value: Some(Operand::Reg(Name(99))),
    });

    let comparator = ModuleComparator::default();
    let err = comparator
        .compare_function_pair(&left, &right, "f", "f")
        .expect_err("undefined name");
    assert!(matches!(
        err,
        DiffError::MalformedFunction { side: Side::Right, .. }
    ));
}
