//! Control flow terminators.
//!
//! Every basic block ends with exactly one terminator. Each terminator
//! specifies its target labels and input operands as needed.
use auto_enums::auto_enum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{EnumDiscriminants, EnumIs, EnumIter, EnumTryAs};

use crate::{
    consts::int::IConst,
    modules::{
        Module,
        operand::{Label, Name, Operand},
    },
};

/// Return from function instruction. Optionally returns a value.
///
/// If `value` is `None`, it indicates a `void` return.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ret {
    pub value: Option<Operand>,
}

/// Unconditional branch.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Branch {
    pub target: Label,
}

/// Conditional branch instruction
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CondBranch {
    /// The condition operand; should evaluate to a boolean value.
    pub cond: Operand,
    pub target_true: Label,
    pub target_false: Label,
}

/// Multi-way branch on an integer value.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Switch {
    pub value: Operand,
    pub default: Label,
    pub cases: Vec<(IConst, Label)>,
}

/// Control never reaches the end of the block.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unreachable;

/// Control flow terminator instructions
#[derive(Debug, Clone, Hash, PartialEq, Eq, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(name(TerminatorOp), derive(PartialOrd, Ord, Hash, EnumIter))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Terminator {
    Ret(Ret),
    Branch(Branch),
    CondBranch(CondBranch),
    Switch(Switch),
    Unreachable(Unreachable),
}

impl TerminatorOp {
    pub fn opname(&self) -> &'static str {
        match self {
            TerminatorOp::Ret => "ret",
            TerminatorOp::Branch => "br",
            TerminatorOp::CondBranch => "condbr",
            TerminatorOp::Switch => "switch",
            TerminatorOp::Unreachable => "unreachable",
        }
    }
}

impl Terminator {
    pub fn op(&self) -> TerminatorOp {
        self.into()
    }

    /// Value operands, labels excluded.
    #[auto_enum(Iterator)]
    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        match self {
            Terminator::Ret(ret) => ret.value.iter(),
            Terminator::Branch(_) => std::iter::empty(),
            Terminator::CondBranch(cbranch) => std::iter::once(&cbranch.cond),
            Terminator::Switch(switch) => std::iter::once(&switch.value),
            Terminator::Unreachable(_) => std::iter::empty(),
        }
    }

    #[auto_enum(Iterator)]
    pub fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        match self {
            Terminator::Ret(ret) => ret.value.iter_mut(),
            Terminator::Branch(_) => std::iter::empty(),
            Terminator::CondBranch(cbranch) => std::iter::once(&mut cbranch.cond),
            Terminator::Switch(switch) => std::iter::once(&mut switch.value),
            Terminator::Unreachable(_) => std::iter::empty(),
        }
    }

    pub fn dependencies(&self) -> impl Iterator<Item = Name> {
        self.operands().filter_map(|op| {
            if let Operand::Reg(name) = op {
                Some(*name)
            } else {
                None
            }
        })
    }

    /// Successor labels in operand order. A label may appear more than once.
    pub fn successors(&self) -> SmallVec<[Label; 2]> {
        match self {
            Terminator::Ret(_) | Terminator::Unreachable(_) => SmallVec::new(),
            Terminator::Branch(branch) => smallvec::smallvec![branch.target],
            Terminator::CondBranch(cbranch) => {
                smallvec::smallvec![cbranch.target_true, cbranch.target_false]
            }
            Terminator::Switch(switch) => std::iter::once(switch.default)
                .chain(switch.cases.iter().map(|(_, label)| *label))
                .collect(),
        }
    }

    /// Mutable access to every successor label.
    #[auto_enum(Iterator)]
    pub fn successors_mut(&mut self) -> impl Iterator<Item = &mut Label> {
        match self {
            Terminator::Ret(_) | Terminator::Unreachable(_) => std::iter::empty(),
            Terminator::Branch(branch) => std::iter::once(&mut branch.target),
            Terminator::CondBranch(cbranch) => {
                [&mut cbranch.target_true, &mut cbranch.target_false].into_iter()
            }
            Terminator::Switch(switch) => std::iter::once(&mut switch.default)
                .chain(switch.cases.iter_mut().map(|(_, label)| label)),
        }
    }

    pub fn fmt<'a>(&'a self, module: Option<&'a Module>) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            terminator: &'a Terminator,
            module: Option<&'a Module>,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.terminator {
                    Terminator::Ret(ret) => {
                        if let Some(value) = &ret.value {
                            write!(f, "ret {}", value.fmt(self.module))
                        } else {
                            write!(f, "ret void")
                        }
                    }
                    Terminator::Branch(branch) => write!(f, "br {:#}", branch.target),
                    Terminator::CondBranch(cbranch) => write!(
                        f,
                        "br {}, {:#}, {:#}",
                        cbranch.cond.fmt(self.module),
                        cbranch.target_true,
                        cbranch.target_false
                    ),
                    Terminator::Switch(switch) => {
                        write!(
                            f,
                            "switch {}, {:#} [",
                            switch.value.fmt(self.module),
                            switch.default
                        )?;
                        for (value, label) in &switch.cases {
                            write!(f, " {} {}, {:#}", value.ty, value, label)?;
                        }
                        write!(f, " ]")
                    }
                    Terminator::Unreachable(_) => write!(f, "unreachable"),
                }
            }
        }

        Fmt {
            terminator: self,
            module,
        }
    }
}

macro_rules! define_terminator_from {
    ($typ:ty, $variant:ident) => {
        impl From<$typ> for Terminator {
            fn from(inst: $typ) -> Self {
                Terminator::$variant(inst)
            }
        }
    };
}

define_terminator_from!(Ret, Ret);
define_terminator_from!(Branch, Branch);
define_terminator_from!(CondBranch, CondBranch);
define_terminator_from!(Switch, Switch);
define_terminator_from!(Unreachable, Unreachable);
