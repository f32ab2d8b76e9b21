#![allow(dead_code)]

use dfcore::{
    base::config::DiffConfig,
    compare::{Comparison, differential::compare_functions},
    debuginfo::DebugInfo,
};
use dfinstr::{
    modules::{Module, builder::FunctionBuilder, operand::Operand, symbol::FunctionPointer},
    types::{
        Typeref,
        aggregate::StructType,
        primary::{IType, PtrType},
    },
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build a function with `body` and add it to `module`.
pub fn define(
    module: &mut Module,
    name: &str,
    params: &[Typeref],
    return_type: Option<Typeref>,
    body: impl FnOnce(&mut FunctionBuilder, Vec<Operand>),
) -> FunctionPointer {
    let mut fb = FunctionBuilder::new(name, params, return_type);
    let args = fb.params();
    body(&mut fb, args);
    module.add_function(fb.finish().expect("fixture function is well formed"))
}

pub fn int(module: &Module, bits: u32) -> Typeref {
    module.intern(IType::new(bits).expect("valid width"))
}

pub fn opaque_ptr(module: &Module) -> Typeref {
    module.intern(PtrType::OPAQUE)
}

/// Named structure of integer fields, and a pointer to it.
pub fn named_struct(module: &Module, name: &str, field_bits: &[u32]) -> (Typeref, Typeref) {
    let fields = field_bits.iter().map(|bits| int(module, *bits)).collect();
    let st = module.intern(StructType::named(name, fields));
    (st, module.intern(PtrType::to(st)))
}

pub fn compare(
    config: &DiffConfig,
    debug_info: &DebugInfo,
    left: &Module,
    right: &Module,
    name: &str,
) -> Comparison {
    init_logger();
    let lf = left.function_by_name(name).expect("left function");
    let rf = right.function_by_name(name).expect("right function");
    compare_functions(config, debug_info, (left, lf), (right, rf))
}

pub fn strict() -> DiffConfig {
    DiffConfig::default()
}

pub fn relaxed() -> DiffConfig {
    DiffConfig::relaxed()
}
