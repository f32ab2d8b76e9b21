//! Constants
//!
//! Immediate values that may appear as instruction operands.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::EnumIs;

use crate::{consts::int::IConst, types::primary::IType};

pub mod int;

/// Any constant operand.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnyConst {
    Int(IConst),
    /// The null pointer of an address space.
    Null { addr_space: u32 },
}

impl AnyConst {
    /// Integer zero or a null pointer.
    pub fn is_null_value(&self) -> bool {
        match self {
            AnyConst::Int(iconst) => iconst.is_zero(),
            AnyConst::Null { .. } => true,
        }
    }

    /// Integer type of the constant, if any.
    pub fn int_type(&self) -> Option<IType> {
        match self {
            AnyConst::Int(iconst) => Some(iconst.ty),
            AnyConst::Null { .. } => None,
        }
    }
}

impl From<IConst> for AnyConst {
    fn from(value: IConst) -> Self {
        AnyConst::Int(value)
    }
}

impl std::fmt::Display for AnyConst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyConst::Int(iconst) => write!(f, "{}", iconst),
            AnyConst::Null { .. } => write!(f, "null"),
        }
    }
}
