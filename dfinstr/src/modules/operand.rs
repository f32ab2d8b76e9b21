//! Shared operand types for instructions.
//!
//! An instruction operand can be a reference to another SSA value (`Reg`),
//! an immediate constant (`Imm`), a code label (`Lbl`) or a function symbol
//! (`Func`).
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumTryAs};

use crate::{
    consts::AnyConst,
    modules::{Module, symbol::FunctionPointer},
};

/// SSA value identifier used to name the destination or reference another
/// instruction's result. Function parameters use the first names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Name(pub u32);

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Represents a code label used as a target for control‑flow instructions.
///
/// Labels may not cross function boundaries. Thus, labels are only valid
/// within the function they are defined in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Label(pub u32);

impl Label {
    pub const NIL: Label = Label(0);

    /// Returns true if this is the "nil" label (i.e., label 0).
    ///
    /// This label is reserved as the 'function entry' label. It should always be present.
    pub fn is_nil(&self) -> bool {
        self == &Label::NIL
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "label %block_{}", self.0)
        } else {
            write!(f, "%block_{}", self.0)
        }
    }
}

/// Instruction operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operand {
    /// Reference to a previously defined SSA value.
    Reg(Name),
    /// Immediate literal (integer or null pointer).
    Imm(AnyConst),
    /// Code label (used for control‑flow).
    Lbl(Label),
    /// Direct reference to a function symbol.
    Func(FunctionPointer),
}

impl From<AnyConst> for Operand {
    fn from(value: AnyConst) -> Self {
        Operand::Imm(value)
    }
}

impl From<crate::consts::int::IConst> for Operand {
    fn from(value: crate::consts::int::IConst) -> Self {
        Operand::Imm(AnyConst::Int(value))
    }
}

impl From<FunctionPointer> for Operand {
    fn from(value: FunctionPointer) -> Self {
        Operand::Func(value)
    }
}

impl Operand {
    pub fn fmt<'a>(&'a self, module: Option<&'a Module>) -> impl std::fmt::Display + 'a {
        pub struct Fmt<'a> {
            operand: &'a Operand,
            module: Option<&'a Module>,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.operand {
                    Operand::Reg(name) => write!(f, "{}", name),
                    Operand::Imm(constant) => write!(f, "{}", constant),
                    Operand::Lbl(label) => write!(f, "{:#}", label),
                    Operand::Func(fptr) => match self.module.and_then(|m| m.symbol_name(fptr)) {
                        Some(name) => write!(f, "@{}", name),
                        None => write!(f, "@{}", fptr.uuid()),
                    },
                }
            }
        }

        Fmt {
            operand: self,
            module,
        }
    }
}
