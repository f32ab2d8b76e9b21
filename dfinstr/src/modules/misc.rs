#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::{
    modules::{
        CallingConvention, Instruction,
        attributes::AttributeList,
        operand::{Label, Name, Operand},
        symbol::FunctionPointer,
    },
    types::Typeref,
};

/// Function call instruction
///
/// Operands are ordered `[args..., function]`: the callee always comes last.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Invoke {
    /// The destination SSA name for the return value, if any.
    pub dest: Option<Name>,

    /// The return type of the function being called. `None` for `void` functions.
    pub ty: Option<Typeref>,

    /// Should be a reference to a function pointer (either internal or external). We
    /// describe it as an `Operand` to allow indirect calls through registers.
    pub function: Operand,

    /// The argument operands to pass to the function.
    pub args: Vec<Operand>,

    pub cconv: CallingConvention,

    /// Call-site attributes.
    pub attributes: AttributeList,
}

impl Invoke {
    /// Direct callee, if the call is not indirect.
    pub fn callee(&self) -> Option<FunctionPointer> {
        match &self.function {
            Operand::Func(fptr) => Some(*fptr),
            _ => None,
        }
    }
}

impl Instruction for Invoke {
    fn operands(&self) -> impl Iterator<Item = &Operand> {
        self.args.iter().chain(std::iter::once(&self.function))
    }

    fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        self.args
            .iter_mut()
            .chain(std::iter::once(&mut self.function))
    }

    fn destination(&self) -> Option<Name> {
        self.dest
    }

    fn set_destination(&mut self, name: Name) {
        // Cannot change a void return to a non-void return
        if self.dest.is_some() {
            self.dest = Some(name);
        }
    }

    fn destination_type(&self) -> Option<Typeref> {
        self.ty
    }
}

/// Phi instruction
///
/// This instruction selects a value based on control flow. It is used to merge
/// values coming from different basic blocks. It should always be placed at the
/// beginning of a basic block.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Phi {
    pub dest: Name,
    pub ty: Typeref,

    /// The incoming values and their corresponding predecessor basic blocks.
    pub values: Vec<(Label, Operand)>,
}

impl Instruction for Phi {
    fn operands(&self) -> impl Iterator<Item = &Operand> {
        self.values.iter().map(|(_, op)| op)
    }

    fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        self.values.iter_mut().map(|(_, op)| op)
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

/// Select instruction
///
/// This instruction selects one of two values based on a condition.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Select {
    pub dest: Name,
    pub ty: Typeref,
    /// The condition operand. Should evaluate to a boolean value.
    pub condition: Operand,
    pub true_value: Operand,
    pub false_value: Operand,
}

impl Instruction for Select {
    fn operands(&self) -> impl Iterator<Item = &Operand> {
        [&self.condition, &self.true_value, &self.false_value].into_iter()
    }

    fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        [
            &mut self.condition,
            &mut self.true_value,
            &mut self.false_value,
        ]
        .into_iter()
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

/// Value conversions
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CastVariant {
    /// Drop the high bits of an integer.
    Trunc,
    /// Widen an integer, filling with zeros.
    ZExt,
    /// Widen an integer, replicating the sign bit.
    SExt,
    /// Reinterpret the bits as another type of the same size.
    BitCast,
    PtrToInt,
    IntToPtr,
}

impl CastVariant {
    /// Creates a [`CastVariant`] from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        CastVariant::iter().find(|op| op.to_str() == s)
    }

    /// Returns the string representation of the [`CastVariant`].
    pub fn to_str(&self) -> &'static str {
        match self {
            CastVariant::Trunc => "trunc",
            CastVariant::ZExt => "zext",
            CastVariant::SExt => "sext",
            CastVariant::BitCast => "bitcast",
            CastVariant::PtrToInt => "ptrtoint",
            CastVariant::IntToPtr => "inttoptr",
        }
    }
}

/// Cast instruction converting `value` to `ty`.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cast {
    pub dest: Name,
    pub ty: Typeref,
    pub variant: CastVariant,
    pub value: Operand,
}

impl Instruction for Cast {
    fn operands(&self) -> impl Iterator<Item = &Operand> {
        std::iter::once(&self.value)
    }

    fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        std::iter::once(&mut self.value)
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
