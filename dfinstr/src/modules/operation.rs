//! Uniform view over the instructions and terminator of a block.
use std::borrow::Cow;

use smallvec::SmallVec;

use crate::{
    consts::{AnyConst, int::IConst},
    modules::{
        Instruction, Module,
        instructions::{Instr, InstrOp},
        misc::Invoke,
        operand::{Name, Operand},
        terminator::{Terminator, TerminatorOp},
    },
    types::Typeref,
};

/// Opcode of any operation. Instructions order before terminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Opcode {
    Instr(InstrOp),
    Term(TerminatorOp),
}

impl Opcode {
    pub fn opname(&self) -> &'static str {
        match self {
            Opcode::Instr(op) => op.opname(),
            Opcode::Term(op) => op.opname(),
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opname())
    }
}

/// Borrowed operation: either an instruction or a block terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    Instr(&'a Instr),
    Term(&'a Terminator),
}

impl<'a> Operation<'a> {
    pub fn opcode(&self) -> Opcode {
        match self {
            Operation::Instr(instr) => Opcode::Instr(instr.op()),
            Operation::Term(term) => Opcode::Term(term.op()),
        }
    }

    /// Operands in comparison order. Terminator targets are materialized as
    /// [`Operand::Lbl`]; switch cases contribute their value then their target.
    pub fn operands(&self) -> SmallVec<[Cow<'a, Operand>; 4]> {
        match *self {
            Operation::Instr(instr) => instr.operands().map(Cow::Borrowed).collect(),
            Operation::Term(Terminator::Ret(ret)) => {
                ret.value.iter().map(Cow::Borrowed).collect()
            }
            Operation::Term(Terminator::Branch(branch)) => {
                smallvec::smallvec![Cow::Owned(Operand::Lbl(branch.target))]
            }
            Operation::Term(Terminator::CondBranch(cbranch)) => smallvec::smallvec![
                Cow::Borrowed(&cbranch.cond),
                Cow::Owned(Operand::Lbl(cbranch.target_true)),
                Cow::Owned(Operand::Lbl(cbranch.target_false)),
            ],
            Operation::Term(Terminator::Switch(switch)) => {
                let mut operands: SmallVec<[Cow<'a, Operand>; 4]> = smallvec::smallvec![
                    Cow::Borrowed(&switch.value),
                    Cow::Owned(Operand::Lbl(switch.default)),
                ];
                for (value, label) in &switch.cases {
                    operands.push(Cow::Owned(Operand::Imm(AnyConst::Int(IConst::clone(
                        value,
                    )))));
                    operands.push(Cow::Owned(Operand::Lbl(*label)));
                }
                operands
            }
            Operation::Term(Terminator::Unreachable(_)) => SmallVec::new(),
        }
    }

    pub fn num_operands(&self) -> usize {
        match self {
            Operation::Instr(instr) => instr.operands().count(),
            Operation::Term(Terminator::Ret(ret)) => ret.value.iter().count(),
            Operation::Term(Terminator::Branch(_)) => 1,
            Operation::Term(Terminator::CondBranch(_)) => 3,
            Operation::Term(Terminator::Switch(switch)) => 2 + 2 * switch.cases.len(),
            Operation::Term(Terminator::Unreachable(_)) => 0,
        }
    }

    pub fn destination(&self) -> Option<Name> {
        match self {
            Operation::Instr(instr) => instr.destination(),
            Operation::Term(_) => None,
        }
    }

    /// Type of the produced value; `None` for operations without result.
    pub fn result_type(&self) -> Option<Typeref> {
        match self {
            Operation::Instr(instr) => instr.destination_type(),
            Operation::Term(_) => None,
        }
    }

    pub fn as_instr(&self) -> Option<&'a Instr> {
        match *self {
            Operation::Instr(instr) => Some(instr),
            Operation::Term(_) => None,
        }
    }

    pub fn as_call(&self) -> Option<&'a Invoke> {
        match *self {
            Operation::Instr(Instr::Invoke(call)) => Some(call),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        self.as_call().is_some()
    }

    /// See [`Instr::is_ignorable`].
    pub fn is_ignorable(&self) -> bool {
        self.as_instr().is_some_and(Instr::is_ignorable)
    }

    pub fn fmt(&self, module: Option<&'a Module>) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            operation: Operation<'a>,
            module: Option<&'a Module>,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.operation {
                    Operation::Instr(instr) => write!(f, "{}", instr.fmt(self.module)),
                    Operation::Term(term) => write!(f, "{}", term.fmt(self.module)),
                }
            }
        }

        Fmt {
            operation: *self,
            module,
        }
    }
}
