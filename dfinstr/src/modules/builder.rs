//! Incremental construction of well-formed functions.
//!
//! ```rust
//! # use dfinstr::modules::{Module, builder::FunctionBuilder, int::IBinaryVariant};
//! # use dfinstr::types::primary::IType;
//! let mut module = Module::new("demo");
//! let i32 = module.intern(IType::I32);
//! let mut fb = FunctionBuilder::new("add", &[i32, i32], Some(i32));
//! let params = fb.params();
//! let sum = fb.binary(IBinaryVariant::Add, i32, params[0].clone(), params[1].clone());
//! fb.ret(Some(sum));
//! module.add_function(fb.finish().unwrap());
//! ```
use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{
    consts::int::IConst,
    modules::{
        BasicBlock, CallingConvention, Function,
        attributes::AttributeList,
        instructions::Instr,
        int::{IBinary, IBinaryVariant, ICmp, ICmpVariant},
        mem::{MAlloca, MGetElementPtr, MLoad, MStore},
        misc::{Cast, CastVariant, Invoke, Phi, Select},
        operand::{Label, Name, Operand},
        symbol::FunctionPointer,
        terminator::{Branch, CondBranch, Ret, Switch, Terminator, Unreachable},
    },
    types::Typeref,
    utils::Error,
};

/// Builds a [`Function`] block by block. Parameters take the first names;
/// every emitted instruction gets a fresh one.
#[derive(Debug)]
pub struct FunctionBuilder {
    uuid: Uuid,
    name: String,
    params: Vec<(Name, Typeref)>,
    return_type: Option<Typeref>,
    attributes: AttributeList,
    cconv: CallingConvention,
    variadic: bool,
    blocks: BTreeMap<Label, (Vec<Instr>, Option<Terminator>)>,
    current: Label,
    next_name: u32,
    next_label: u32,
}

impl FunctionBuilder {
    /// Start a function whose entry block is current.
    pub fn new(name: impl Into<String>, params: &[Typeref], return_type: Option<Typeref>) -> Self {
        let params: Vec<_> = params
            .iter()
            .enumerate()
            .map(|(i, ty)| (Name(i as u32), *ty))
            .collect();
        let mut blocks = BTreeMap::new();
        blocks.insert(Label::NIL, (Vec::new(), None));
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            next_name: params.len() as u32,
            params,
            return_type,
            attributes: AttributeList::default(),
            cconv: CallingConvention::C,
            variadic: false,
            blocks,
            current: Label::NIL,
            next_label: 1,
        }
    }

    /// Pointer the finished function will be reachable through once added to
    /// a module. Useful for recursive calls.
    pub fn pointer(&self) -> FunctionPointer {
        FunctionPointer::Internal(self.uuid)
    }

    pub fn with_attributes(mut self, attributes: AttributeList) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_cconv(mut self, cconv: CallingConvention) -> Self {
        self.cconv = cconv;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Parameters as register operands.
    pub fn params(&self) -> Vec<Operand> {
        self.params.iter().map(|(name, _)| Operand::Reg(*name)).collect()
    }

    pub fn entry(&self) -> Label {
        Label::NIL
    }

    pub fn current(&self) -> Label {
        self.current
    }

    /// Create an empty block without switching to it.
    pub fn new_block(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        self.blocks.insert(label, (Vec::new(), None));
        label
    }

    pub fn switch_to(&mut self, label: Label) {
        self.current = label;
    }

    fn fresh(&mut self) -> Name {
        let name = Name(self.next_name);
        self.next_name += 1;
        name
    }

    /// Append a raw instruction to the current block.
    pub fn push(&mut self, instr: impl Into<Instr>) {
        if let Some((instructions, _)) = self.blocks.get_mut(&self.current) {
            instructions.push(instr.into());
        }
    }

    pub fn binary(
        &mut self,
        variant: IBinaryVariant,
        ty: Typeref,
        lhs: Operand,
        rhs: Operand,
    ) -> Operand {
        let dest = self.fresh();
        self.push(IBinary {
            dest,
            ty,
            variant,
            lhs,
            rhs,
        });
        Operand::Reg(dest)
    }

    pub fn icmp(&mut self, variant: ICmpVariant, ty: Typeref, lhs: Operand, rhs: Operand) -> Operand {
        let dest = self.fresh();
        self.push(ICmp {
            dest,
            ty,
            variant,
            lhs,
            rhs,
        });
        Operand::Reg(dest)
    }

    pub fn load(&mut self, ty: Typeref, addr: Operand) -> Operand {
        let dest = self.fresh();
        self.push(MLoad {
            dest,
            ty,
            addr,
            alignment: None,
            ordering: None,
            volatile: false,
        });
        Operand::Reg(dest)
    }

    pub fn store(&mut self, value: Operand, addr: Operand) {
        self.push(MStore {
            value,
            addr,
            alignment: None,
            ordering: None,
            volatile: false,
        });
    }

    /// Allocate one `allocated` on the stack; `ty` is the result pointer type.
    pub fn alloca(&mut self, ty: Typeref, allocated: Typeref, alignment: u32) -> Operand {
        let dest = self.fresh();
        self.push(MAlloca {
            dest,
            ty,
            allocated,
            count: Operand::from(IConst::from(1u32)),
            alignment,
        });
        Operand::Reg(dest)
    }

    pub fn gep(
        &mut self,
        ty: Typeref,
        source_ty: Typeref,
        base: Operand,
        indices: Vec<Operand>,
    ) -> Operand {
        let dest = self.fresh();
        self.push(MGetElementPtr {
            dest,
            ty,
            source_ty,
            base,
            indices,
            in_bounds: true,
        });
        Operand::Reg(dest)
    }

    /// Emit a call. Returns the result operand for non-void calls.
    pub fn call(
        &mut self,
        ty: Option<Typeref>,
        function: impl Into<Operand>,
        args: Vec<Operand>,
    ) -> Option<Operand> {
        self.call_with(ty, function, args, AttributeList::default())
    }

    pub fn call_with(
        &mut self,
        ty: Option<Typeref>,
        function: impl Into<Operand>,
        args: Vec<Operand>,
        attributes: AttributeList,
    ) -> Option<Operand> {
        let dest = ty.map(|_| self.fresh());
        self.push(Invoke {
            dest,
            ty,
            function: function.into(),
            args,
            cconv: CallingConvention::C,
            attributes,
        });
        dest.map(Operand::Reg)
    }

    pub fn cast(&mut self, variant: CastVariant, ty: Typeref, value: Operand) -> Operand {
        let dest = self.fresh();
        self.push(Cast {
            dest,
            ty,
            variant,
            value,
        });
        Operand::Reg(dest)
    }

    pub fn phi(&mut self, ty: Typeref, values: Vec<(Label, Operand)>) -> Operand {
        let dest = self.fresh();
        self.push(Phi { dest, ty, values });
        Operand::Reg(dest)
    }

    pub fn select(
        &mut self,
        ty: Typeref,
        condition: Operand,
        true_value: Operand,
        false_value: Operand,
    ) -> Operand {
        let dest = self.fresh();
        self.push(Select {
            dest,
            ty,
            condition,
            true_value,
            false_value,
        });
        Operand::Reg(dest)
    }

    /// Terminate the current block. A second terminator replaces the first.
    pub fn terminate(&mut self, terminator: impl Into<Terminator>) {
        if let Some((_, slot)) = self.blocks.get_mut(&self.current) {
            *slot = Some(terminator.into());
        }
    }

    pub fn ret(&mut self, value: Option<Operand>) {
        self.terminate(Ret { value });
    }

    pub fn branch(&mut self, target: Label) {
        self.terminate(Branch { target });
    }

    pub fn cond_branch(&mut self, cond: Operand, target_true: Label, target_false: Label) {
        self.terminate(CondBranch {
            cond,
            target_true,
            target_false,
        });
    }

    pub fn switch(&mut self, value: Operand, default: Label, cases: Vec<(IConst, Label)>) {
        self.terminate(Switch {
            value,
            default,
            cases,
        });
    }

    pub fn unreachable(&mut self) {
        self.terminate(Unreachable);
    }

    /// Assemble the function and verify it is in SSA form.
    pub fn finish(self) -> Result<Function, Error> {
        let mut body = BTreeMap::new();
        for (label, (instructions, terminator)) in self.blocks {
            let terminator = terminator.ok_or_else(|| Error::MissingTerminator {
                function: self.name.clone(),
                label,
            })?;
            body.insert(
                label,
                BasicBlock {
                    label,
                    instructions,
                    terminator,
                },
            );
        }

        let function = Function {
            uuid: self.uuid,
            name: self.name,
            params: self.params,
            return_type: self.return_type,
            body,
            attributes: self.attributes,
            cconv: self.cconv,
            variadic: self.variadic,
        };
        function.check_ssa()?;
        Ok(function)
    }

    /// A body-less function with the builder's signature.
    pub fn declaration(self) -> Function {
        Function {
            uuid: self.uuid,
            name: self.name,
            params: self.params,
            return_type: self.return_type,
            body: BTreeMap::new(),
            attributes: self.attributes,
            cconv: self.cconv,
            variadic: self.variadic,
        }
    }
}
