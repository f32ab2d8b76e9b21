//! Call-site inlining on cloned function bodies.
//!
//! Inlining happens inside one module: the callee body is read from the
//! module owning the caller, so every [`Typeref`] copied along stays valid.
//!
//! [`Typeref`]: dfinstr::types::Typeref
use std::collections::HashMap;

use dfinstr::modules::{
    BasicBlock, Function, Instruction, Module,
    instructions::Instr,
    misc::Phi,
    operand::{Label, Name, Operand},
    terminator::{Branch, Terminator},
};
use log::{debug, trace, warn};

/// Inline every direct call to `callee` in `caller` and return how many call
/// sites were replaced. Calls are left untouched when the module holds no
/// body for `callee` or when the body calls itself.
pub fn inline_calls(module: &Module, caller: &mut Function, callee: &str) -> usize {
    let Some(body) = module
        .function_by_name(callee)
        .filter(|function| !function.is_declaration())
    else {
        trace!("No body for `{}` in module `{}`", callee, module.name);
        return 0;
    };

    if body.name == caller.name || body.calls().any(|c| module.callee_name(c) == Some(callee)) {
        warn!("Refusing to inline self-recursive function `{}`", callee);
        return 0;
    }

    let mut inlined = 0;
    while let Some((label, index)) = find_call_site(module, caller, callee) {
        if !inline_call_site(caller, label, index, body) {
            break;
        }
        inlined += 1;
    }

    debug!(
        "Inlined {} call(s) to `{}` into `{}`",
        inlined, callee, caller.name
    );
    inlined
}

fn find_call_site(module: &Module, caller: &Function, callee: &str) -> Option<(Label, usize)> {
    caller.body.iter().find_map(|(label, bb)| {
        bb.instructions
            .iter()
            .position(|instr| match instr {
                Instr::Invoke(call) => module.callee_name(call) == Some(callee),
                _ => false,
            })
            .map(|index| (*label, index))
    })
}

/// Rewrite every use of `name` in `function` into `value`.
fn replace_uses(function: &mut Function, name: Name, value: &Operand) {
    for bb in function.body.values_mut() {
        let operands = bb
            .instructions
            .iter_mut()
            .flat_map(|instr| instr.operands_mut())
            .chain(bb.terminator.operands_mut());
        for operand in operands {
            if *operand == Operand::Reg(name) {
                *operand = value.clone();
            }
        }
    }
}

/// Replace the call at position `index` of block `label` by a copy of
/// `callee`'s body.
///
/// A callee made of a single returning block is spliced in place of the
/// call, and uses of the call result read the returned value instead.
/// Otherwise the calling block is split at the call: it now branches into
/// the copied entry block, and what followed the call moves to a
/// continuation block that every copied return branches to. A leading phi
/// of the continuation defines the call result.
fn inline_call_site(caller: &mut Function, label: Label, index: usize, callee: &Function) -> bool {
    let name_offset = caller.next_available_name().0;
    let label_offset = caller.next_available_label().0;
    let shift = |label: Label| Label(label.0 + label_offset);

    let call = match caller
        .body
        .get(&label)
        .and_then(|bb| bb.instructions.get(index))
    {
        Some(Instr::Invoke(call)) => call.clone(),
        _ => return false,
    };

    if call.args.len() < callee.params.len() {
        warn!(
            "Call to `{}` passes {} argument(s) for {} parameter(s), not inlining",
            callee.name,
            call.args.len(),
            callee.params.len()
        );
        return false;
    }

    let substitutions: HashMap<Name, Operand> = callee
        .params
        .iter()
        .map(|(name, _)| *name)
        .zip(call.args.iter().cloned())
        .collect();

    let remap = |operand: &mut Operand| {
        let replacement = match *operand {
            Operand::Reg(name) => substitutions
                .get(&name)
                .cloned()
                .unwrap_or(Operand::Reg(Name(name.0 + name_offset))),
            Operand::Lbl(target) => Operand::Lbl(shift(target)),
            Operand::Imm(_) | Operand::Func(_) => return,
        };
        *operand = replacement;
    };

    if let (1, Some(entry)) = (callee.body.len(), callee.entry()) {
        if let Terminator::Ret(ret) = &entry.terminator {
            let mut returned = ret.value.clone();
            if call.dest.is_some() && returned.is_none() {
                return false;
            }

            let mut spliced = entry.instructions.clone();
            for instr in &mut spliced {
                for operand in instr.operands_mut() {
                    remap(operand);
                }
                if let Some(dest) = instr.destination() {
                    instr.set_destination(Name(dest.0 + name_offset));
                }
            }
            if let Some(value) = returned.as_mut() {
                remap(value);
            }

            let Some(head) = caller.body.get_mut(&label) else {
                return false;
            };
            let tail = head.instructions.split_off(index + 1);
            head.instructions.truncate(index);
            head.instructions.extend(spliced);
            head.instructions.extend(tail);
            if let (Some(dest), Some(value)) = (call.dest, returned) {
                replace_uses(caller, dest, &value);
            }

            trace!(
                "Spliced `{}` at {}:{} of `{}`",
                callee.name, label, index, caller.name
            );
            return true;
        }
    }

    let continuation = shift(callee.next_available_label());
    let mut returns = Vec::new();
    let mut copied = Vec::with_capacity(callee.body.len());
    for (old_label, bb) in &callee.body {
        let new_label = shift(*old_label);

        let mut instructions = bb.instructions.clone();
        for instr in &mut instructions {
            for operand in instr.operands_mut() {
                remap(operand);
            }
            if let Some(dest) = instr.destination() {
                instr.set_destination(Name(dest.0 + name_offset));
            }
            if let Instr::Phi(phi) = instr {
                for (incoming, _) in &mut phi.values {
                    *incoming = shift(*incoming);
                }
            }
        }

        let terminator = match &bb.terminator {
            Terminator::Ret(ret) => {
                if let Some(mut value) = ret.value.clone() {
                    remap(&mut value);
                    returns.push((new_label, value));
                }
                Terminator::Branch(Branch {
                    target: continuation,
                })
            }
            other => {
                let mut terminator = other.clone();
                for operand in terminator.operands_mut() {
                    remap(operand);
                }
                for target in terminator.successors_mut() {
                    *target = shift(*target);
                }
                terminator
            }
        };

        copied.push(BasicBlock {
            label: new_label,
            instructions,
            terminator,
        });
    }

    let result = match (call.dest, call.ty) {
        (Some(dest), Some(ty)) if !returns.is_empty() => Some(Instr::Phi(Phi {
            dest,
            ty,
            values: returns,
        })),
        (Some(_), _) => {
            warn!("`{}` never returns a value, not inlining", callee.name);
            return false;
        }
        (None, _) => None,
    };

    let Some(head) = caller.body.get_mut(&label) else {
        return false;
    };
    let tail = head.instructions.split_off(index + 1);
    head.instructions.truncate(index);
    let exit = std::mem::replace(
        &mut head.terminator,
        Terminator::Branch(Branch {
            target: shift(Label::NIL),
        }),
    );

    for successor in exit.successors() {
        let Some(bb) = caller.body.get_mut(&successor) else {
            continue;
        };
        for instr in &mut bb.instructions {
            if let Instr::Phi(phi) = instr {
                for (incoming, _) in &mut phi.values {
                    if *incoming == label {
                        *incoming = continuation;
                    }
                }
            }
        }
    }

    let mut instructions = Vec::with_capacity(tail.len() + 1);
    instructions.extend(result);
    instructions.extend(tail);
    caller.body.insert(
        continuation,
        BasicBlock {
            label: continuation,
            instructions,
            terminator: exit,
        },
    );
    for bb in copied {
        caller.body.insert(bb.label, bb);
    }

    trace!(
        "Inlined `{}` at {}:{} of `{}`, continuing at {}",
        callee.name, label, index, caller.name, continuation
    );
    true
}

#[cfg(test)]
mod tests {
    use dfinstr::{
        consts::int::IConst,
        modules::{
            builder::FunctionBuilder,
            int::{IBinaryVariant, ICmpVariant},
        },
        types::primary::IType,
    };

    use super::*;

    #[test]
    fn test_inline_single_return() {
        let mut module = Module::new("m");
        let i32_ty = module.intern(IType::I32);

        let mut helper = FunctionBuilder::new("helper", &[i32_ty], Some(i32_ty));
        let x = helper.params().remove(0);
        let doubled = helper.binary(IBinaryVariant::Add, i32_ty, x.clone(), x);
        helper.ret(Some(doubled));
        let helper_ptr = module.add_function(helper.finish().expect("helper"));

        let mut caller = FunctionBuilder::new("caller", &[i32_ty], Some(i32_ty));
        let a = caller.params().remove(0);
        let r = caller
            .call(Some(i32_ty), helper_ptr, vec![a.clone()])
            .expect("non-void call");
        let out = caller.binary(IBinaryVariant::Add, i32_ty, r, a);
        caller.ret(Some(out));
        let mut caller = caller.finish().expect("caller");

        assert_eq!(inline_calls(&module, &mut caller, "helper"), 1);
        assert_eq!(caller.calls().count(), 0);
        assert_eq!(caller.body.len(), 1);
        assert_eq!(caller.body[&Label::NIL].instructions.len(), 2);
        caller.check_ssa().expect("valid SSA after inlining");
    }

    #[test]
    fn test_inline_splits_on_branching_callee() {
        let mut module = Module::new("m");
        let i32_ty = module.intern(IType::I32);

        // helper(x) = x == 0 ? 1 : x
        let mut helper = FunctionBuilder::new("helper", &[i32_ty], Some(i32_ty));
        let x = helper.params().remove(0);
        let zero_block = helper.new_block();
        let other_block = helper.new_block();
        let i1 = module.intern(IType::I1);
        let is_zero = helper.icmp(
            ICmpVariant::Eq,
            i1,
            x.clone(),
            IConst::from(0i32).into(),
        );
        helper.cond_branch(is_zero, zero_block, other_block);
        helper.switch_to(zero_block);
        helper.ret(Some(IConst::from(1i32).into()));
        helper.switch_to(other_block);
        helper.ret(Some(x));
        let helper_ptr = module.add_function(helper.finish().expect("helper"));

        let mut caller = FunctionBuilder::new("caller", &[i32_ty], Some(i32_ty));
        let a = caller.params().remove(0);
        let r = caller
            .call(Some(i32_ty), helper_ptr, vec![a.clone()])
            .expect("non-void call");
        let out = caller.binary(IBinaryVariant::Add, i32_ty, r, a);
        caller.ret(Some(out));
        let mut caller = caller.finish().expect("caller");

        assert_eq!(inline_calls(&module, &mut caller, "helper"), 1);
        assert_eq!(caller.calls().count(), 0);
        // Split head, three copied blocks and the continuation.
        assert_eq!(caller.body.len(), 5);
        caller.check_ssa().expect("valid SSA after inlining");

        let continuation = caller.body.values().last().expect("continuation");
        match continuation.instructions.first() {
            Some(Instr::Phi(phi)) => assert_eq!(phi.values.len(), 2),
            other => panic!("expected a phi, found {other:?}"),
        }
    }

    #[test]
    fn test_self_recursive_is_refused() {
        let mut module = Module::new("m");
        let i32_ty = module.intern(IType::I32);

        let mut rec = FunctionBuilder::new("rec", &[i32_ty], Some(i32_ty));
        let x = rec.params().remove(0);
        let self_ptr = rec.pointer();
        let r = rec.call(Some(i32_ty), self_ptr, vec![x]).expect("non-void call");
        rec.ret(Some(r));
        let rec_ptr = module.add_function(rec.finish().expect("rec"));

        let mut caller = FunctionBuilder::new("caller", &[i32_ty], Some(i32_ty));
        let a = caller.params().remove(0);
        let r = caller.call(Some(i32_ty), rec_ptr, vec![a]).expect("non-void call");
        caller.ret(Some(r));
        let mut caller = caller.finish().expect("caller");

        assert_eq!(inline_calls(&module, &mut caller, "rec"), 0);
        assert_eq!(caller.calls().count(), 1);
    }
}
