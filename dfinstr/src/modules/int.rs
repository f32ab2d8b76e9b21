//! Integer instructions
//!
//! Arithmetic, shifts, bitwise operations and comparisons over integer
//! values. Each instruction carries its destination `Name`, a `Typeref`, and
//! its input operands.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::{
    modules::{
        Instruction,
        operand::{Name, Operand},
    },
    types::Typeref,
};

/// Binary integer operations
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IBinaryVariant {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
}

impl IBinaryVariant {
    /// Creates an [`IBinaryVariant`] from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        IBinaryVariant::iter().find(|op| op.to_str() == s)
    }

    /// Returns the string representation of the [`IBinaryVariant`].
    pub fn to_str(&self) -> &'static str {
        match self {
            IBinaryVariant::Add => "add",
            IBinaryVariant::Sub => "sub",
            IBinaryVariant::Mul => "mul",
            IBinaryVariant::UDiv => "udiv",
            IBinaryVariant::SDiv => "sdiv",
            IBinaryVariant::URem => "urem",
            IBinaryVariant::SRem => "srem",
            IBinaryVariant::Shl => "shl",
            IBinaryVariant::LShr => "lshr",
            IBinaryVariant::AShr => "ashr",
            IBinaryVariant::And => "and",
            IBinaryVariant::Or => "or",
            IBinaryVariant::Xor => "xor",
        }
    }
}

/// Integer comparison operations
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ICmpVariant {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Unsigned greater than
    Ugt,
    /// Unsigned greater than or equal
    Uge,
    /// Unsigned less than
    Ult,
    /// Unsigned less than or equal
    Ule,
    /// Signed greater than
    Sgt,
    /// Signed greater than or equal
    Sge,
    /// Signed less than
    Slt,
    /// Signed less than or equal
    Sle,
}

impl ICmpVariant {
    /// Creates an [`ICmpVariant`] from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        ICmpVariant::iter().find(|op| op.to_str() == s)
    }

    /// Returns the string representation of the [`ICmpVariant`].
    pub fn to_str(&self) -> &'static str {
        match self {
            ICmpVariant::Eq => "eq",
            ICmpVariant::Ne => "ne",
            ICmpVariant::Ugt => "ugt",
            ICmpVariant::Uge => "uge",
            ICmpVariant::Ult => "ult",
            ICmpVariant::Ule => "ule",
            ICmpVariant::Sgt => "sgt",
            ICmpVariant::Sge => "sge",
            ICmpVariant::Slt => "slt",
            ICmpVariant::Sle => "sle",
        }
    }

    /// Returns true if the comparison is signed
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            ICmpVariant::Sgt | ICmpVariant::Sge | ICmpVariant::Slt | ICmpVariant::Sle
        )
    }

    /// The same predicate with signedness dropped: signed orderings become
    /// their unsigned counterpart, the rest is left untouched.
    pub fn to_unsigned(&self) -> Self {
        match self {
            ICmpVariant::Sgt => ICmpVariant::Ugt,
            ICmpVariant::Sge => ICmpVariant::Uge,
            ICmpVariant::Slt => ICmpVariant::Ult,
            ICmpVariant::Sle => ICmpVariant::Ule,
            other => *other,
        }
    }
}

/// Binary integer instruction (`dest = lhs <variant> rhs`).
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IBinary {
    pub dest: Name,
    pub ty: Typeref,
    pub variant: IBinaryVariant,
    pub lhs: Operand,
    pub rhs: Operand,
}

impl Instruction for IBinary {
    fn operands(&self) -> impl Iterator<Item = &Operand> {
        [&self.lhs, &self.rhs].into_iter()
    }

    fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        [&mut self.lhs, &mut self.rhs].into_iter()
    }

    fn destination(&self) -> Option<Name> {
        Some(self.dest)
    }

    fn set_destination(&mut self, name: Name) {
        self.dest = name;
    }

    fn destination_type(&self) -> Option<Typeref> {
        Some(self.ty)
    }
}

/// Integer comparison instruction. `ty` is the (boolean) result type.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ICmp {
    pub dest: Name,
    pub ty: Typeref,
    pub variant: ICmpVariant,
    pub lhs: Operand,
    pub rhs: Operand,
}

impl Instruction for ICmp {
    fn operands(&self) -> impl Iterator<Item = &Operand> {
        [&self.lhs, &self.rhs].into_iter()
    }

    fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        [&mut self.lhs, &mut self.rhs].into_iter()
    }

    fn destination(&self) -> Option<Name> {
        Some(self.dest)
    }

    fn set_destination(&mut self, name: Name) {
        self.dest = name;
    }

    fn destination_type(&self) -> Option<Typeref> {
        Some(self.ty)
    }
}
