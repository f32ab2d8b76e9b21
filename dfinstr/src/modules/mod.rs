//! Instruction IR modules
//!
//! This module groups all instruction kinds exposed by the IR. Each
//! instruction is represented as a small data structure with public fields,
//! making it easy to construct and inspect. Submodules contain families of
//! operations:
//!
//! - `int`: integer arithmetic, bitwise ops and comparisons
//! - `mem`: loads, stores, stack allocations and address computations
//! - `misc`: calls, phis, selects and casts
//! - `terminator`: block terminators
//! - `operand`: shared operand and SSA name types
//!
//! You typically manipulate instructions via the [`instructions::Instr`] enum
//! which is a tagged union of all concrete instruction forms, or through the
//! [`operation::Operation`] view which also covers terminators.
use std::collections::{BTreeMap, BTreeSet};

use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    modules::{
        attributes::AttributeList,
        instructions::Instr,
        misc::Invoke,
        operand::{Label, Name, Operand},
        operation::Operation,
        symbol::{ExternalFunction, FunctionPointer},
        terminator::Terminator,
    },
    types::{AnyType, TypeRegistry, Typeref, layout::DataLayout},
    utils::Error,
};

pub mod attributes;
pub mod builder;
pub mod fmt;
pub mod instructions;
pub mod int;
pub mod mem;
pub mod misc;
pub mod operand;
pub mod operation;
pub mod symbol;
pub mod terminator;

/// Common interface implemented by every instruction node.
///
/// This trait provides lightweight, zero‑allocation iteration over an
/// instruction's input operands and exposes its optional destination SSA
/// name when present.
pub trait Instruction {
    /// Iterate over all input operands for this instruction.
    fn operands(&self) -> impl Iterator<Item = &Operand>;

    /// Mutably iterate over all input operands for this instruction.
    fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand>;

    /// Return the destination SSA name if the instruction produces a result.
    fn destination(&self) -> Option<Name> {
        None
    }

    /// Update the destination SSA name for this instruction. No-op if the
    /// instruction does not produce a result.
    fn set_destination(&mut self, _name: Name) {}

    /// Type of the destination SSA name if the instruction produces a result.
    fn destination_type(&self) -> Option<Typeref> {
        None
    }

    /// Convenience iterator over referenced SSA names (i.e., register
    /// operands). Immediates, labels and functions are ignored.
    fn dependencies(&self) -> impl Iterator<Item = Name> {
        self.operands().filter_map(|op| match op {
            Operand::Reg(reg) => Some(*reg),
            _ => None,
        })
    }

    /// Remap register operands according to a mapping.
    fn remap_operands(&mut self, mapping: impl Fn(Name) -> Option<Name>) {
        for operand in self.operands_mut() {
            if let Operand::Reg(name) = operand {
                if let Some(new_name) = mapping(*name) {
                    *name = new_name;
                }
            }
        }
    }
}

/// Functions, calls and invokes can all have an optional calling convention
/// specified for the call. The calling convention of any pair of dynamic
/// caller/callee must match, or the behavior of the program is undefined.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CallingConvention {
    /// The C calling convention
    ///
    /// This calling convention (the default if no other calling convention is specified) matches the target C calling conventions.
    #[default]
    C,

    /// The fast calling convention
    ///
    /// This calling convention attempts to make calls as fast as possible (e.g., by passing things in registers).
    FastC,

    /// The cold calling convention
    ///
    /// This calling convention attempts to make code in the caller as efficient as possible under the assumption that the call is not
    /// commonly executed.
    ColdC,

    /// Numbered/target-specific calling convention (cc &lt;n&gt;)
    Numbered(u32),
}

/// A basic block within a function, containing a sequence of instructions
/// and ending with a control flow terminator.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BasicBlock {
    pub label: Label,
    pub instructions: Vec<Instr>,
    pub terminator: Terminator,
}

impl BasicBlock {
    /// Instructions followed by the terminator.
    pub fn operations(&self) -> impl Iterator<Item = Operation<'_>> {
        self.instructions
            .iter()
            .map(Operation::Instr)
            .chain(std::iter::once(Operation::Term(&self.terminator)))
    }

    /// Number of operations, terminator included.
    pub fn len(&self) -> usize {
        self.instructions.len() + 1
    }

    /// A block always holds its terminator.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Operation at `index`, where `instructions.len()` is the terminator.
    pub fn operation(&self, index: usize) -> Option<Operation<'_>> {
        match index.cmp(&self.instructions.len()) {
            std::cmp::Ordering::Less => Some(Operation::Instr(&self.instructions[index])),
            std::cmp::Ordering::Equal => Some(Operation::Term(&self.terminator)),
            std::cmp::Ordering::Greater => None,
        }
    }
}

/// A function made of basic blocks and parameter metadata.
///
/// A `Function` owns its control‑flow graph (`body`). Parameters are
/// represented as a list of `(Name, Typeref)` pairs. A function without any
/// block is a declaration.
///
/// By convention the entrypoint is the basic block labelled [`Label::NIL`].
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Function {
    pub uuid: Uuid,
    pub name: String,
    pub params: Vec<(Name, Typeref)>,
    pub return_type: Option<Typeref>,
    pub body: BTreeMap<Label, BasicBlock>,
    pub attributes: AttributeList,
    pub cconv: CallingConvention,
    pub variadic: bool,
}

impl Function {
    /// True when the function has no body in this module.
    pub fn is_declaration(&self) -> bool {
        self.body.is_empty()
    }

    pub fn entry(&self) -> Option<&BasicBlock> {
        self.body.get(&Label::NIL)
    }

    /// Find next available [`Name`], i.e. one past every name defined or used.
    pub fn next_available_name(&self) -> Name {
        let mut next = 0;
        for (name, _) in &self.params {
            next = next.max(name.0 + 1);
        }

        for bb in self.body.values() {
            for op in bb.operations() {
                if let Some(dest) = op.destination() {
                    next = next.max(dest.0 + 1);
                }
                for operand in op.operands() {
                    if let Operand::Reg(name) = operand.as_ref() {
                        next = next.max(name.0 + 1);
                    }
                }
            }
        }

        Name(next)
    }

    /// Find next available [`Label`].
    pub fn next_available_label(&self) -> Label {
        self.body
            .keys()
            .next_back()
            .map(|label| Label(label.0 + 1))
            .unwrap_or(Label::NIL)
    }

    /// Every call instruction of the body, in block order.
    pub fn calls(&self) -> impl Iterator<Item = &Invoke> {
        self.body
            .values()
            .flat_map(|bb| bb.instructions.iter())
            .filter_map(|instr| instr.try_as_invoke_ref())
    }

    /// Verify SSA form:
    /// 1) The entry block exists.
    /// 2) Each name is defined exactly once.
    /// 3) Each operand refers to a defined name.
    /// 4) Each branch target and phi predecessor is a block of the function.
    pub fn check_ssa(&self) -> Result<(), Error> {
        let mut defined_names = BTreeSet::new();

        if !self.body.contains_key(&Label::NIL) {
            return Err(Error::MissingEntryBlock);
        }

        for (name, _) in self.params.iter() {
            if !defined_names.insert(*name) {
                return Err(Error::DuplicateSSAName { duplicate: *name });
            }
        }

        for bb in self.body.values() {
            for instr in &bb.instructions {
                if let Some(dest) = instr.destination() {
                    if !defined_names.insert(dest) {
                        return Err(Error::DuplicateSSAName { duplicate: dest });
                    }
                }
            }
        }

        let check_label = |label: Label| {
            if self.body.contains_key(&label) {
                Ok(())
            } else {
                Err(Error::UndefinedBasicBlock {
                    function: self.name.clone(),
                    label,
                })
            }
        };

        for bb in self.body.values() {
            for instr in &bb.instructions {
                for name in instr.dependencies() {
                    if !defined_names.contains(&name) {
                        return Err(Error::UndefinedSSAName { undefined: name });
                    }
                }
                if let Instr::Phi(phi) = instr {
                    for (label, _) in &phi.values {
                        check_label(*label)?;
                    }
                }
            }

            for name in bb.terminator.dependencies() {
                if !defined_names.contains(&name) {
                    return Err(Error::UndefinedSSAName { undefined: name });
                }
            }
            for label in bb.terminator.successors() {
                check_label(label)?;
            }
        }

        Ok(())
    }
}

/// A module containing defined functions and references to external ones.
///
/// `Module` is one program snapshot: it owns the type registry every
/// [`Typeref`] of its functions points into, and the data layout used to size
/// those types.
#[derive(Debug, Default)]
pub struct Module {
    pub name: String,
    pub types: TypeRegistry,
    pub layout: DataLayout,
    pub functions: BTreeMap<Uuid, Function>,
    pub external_functions: BTreeMap<Uuid, ExternalFunction>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_layout(mut self, layout: DataLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Register `ty` in the module's type registry.
    pub fn intern(&self, ty: impl Into<AnyType>) -> Typeref {
        self.types.search_or_insert(ty.into())
    }

    /// Add (or replace) a function and return a pointer to it.
    pub fn add_function(&mut self, function: Function) -> FunctionPointer {
        let uuid = function.uuid;
        debug!("Module `{}`: adding function `{}` ({})", self.name, function.name, uuid);
        self.functions.insert(uuid, function);
        FunctionPointer::Internal(uuid)
    }

    /// Declare a function defined outside of the module.
    pub fn declare_external(
        &mut self,
        name: impl Into<String>,
        param_types: Vec<Typeref>,
        return_type: Option<Typeref>,
        variadic: bool,
    ) -> FunctionPointer {
        let uuid = Uuid::new_v4();
        self.external_functions.insert(
            uuid,
            ExternalFunction {
                uuid,
                name: name.into(),
                cconv: CallingConvention::C,
                param_types,
                return_type,
                variadic,
            },
        );
        FunctionPointer::External(uuid)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.values().find(|f| f.name == name)
    }

    /// Name of the symbol behind `fptr`.
    pub fn symbol_name(&self, fptr: &FunctionPointer) -> Option<&str> {
        match fptr {
            FunctionPointer::Internal(uuid) => self.functions.get(uuid).map(|f| f.name.as_str()),
            FunctionPointer::External(uuid) => self
                .external_functions
                .get(uuid)
                .map(|f| f.name.as_str()),
        }
    }

    /// Name of the function a call targets, `None` for indirect calls.
    pub fn callee_name(&self, call: &Invoke) -> Option<&str> {
        self.symbol_name(&call.callee()?)
    }

    /// The callee of a direct call, when the module holds its body.
    pub fn callee_body(&self, call: &Invoke) -> Option<&Function> {
        match call.callee()? {
            FunctionPointer::Internal(uuid) => self
                .functions
                .get(&uuid)
                .filter(|function| !function.is_declaration()),
            FunctionPointer::External(_) => None,
        }
    }
}
