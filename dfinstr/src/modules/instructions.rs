use auto_enums::auto_enum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIs, EnumIter, EnumTryAs, IntoEnumIterator};

use crate::{
    modules::{
        Instruction, int, mem, misc,
        operand::{Name, Operand},
    },
    types::Typeref,
};

/// Discriminated union covering all public instruction kinds.
///
/// Use this enum to store heterogeneous instruction streams and to pattern‑match
/// on specific operations. The generated [`InstrOp`] discriminant (via
/// `strum`) is what two instructions are first compared on.
#[derive(Debug, Clone, Hash, PartialEq, Eq, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(name(InstrOp), derive(PartialOrd, Ord, Hash, EnumIter))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Instr {
    IBinary(int::IBinary),
    ICmp(int::ICmp),

    MLoad(mem::MLoad),
    MStore(mem::MStore),
    MAlloca(mem::MAlloca),
    MGetElementPtr(mem::MGetElementPtr),

    Invoke(misc::Invoke),
    Phi(misc::Phi),
    Select(misc::Select),
    Cast(misc::Cast),
}

impl InstrOp {
    /// Return the canonical mnemonic used when printing this instruction.
    pub fn opname(&self) -> &'static str {
        match self {
            InstrOp::IBinary => "ibinary",
            InstrOp::ICmp => "icmp",
            InstrOp::MLoad => "load",
            InstrOp::MStore => "store",
            InstrOp::MAlloca => "alloca",
            InstrOp::MGetElementPtr => "getelementptr",
            InstrOp::Invoke => "call",
            InstrOp::Phi => "phi",
            InstrOp::Select => "select",
            InstrOp::Cast => "cast",
        }
    }

    /// Parse a mnemonic into its corresponding discriminator.
    pub fn from_str(s: &str) -> Option<Self> {
        InstrOp::iter().find(|op| op.opname() == s)
    }
}

impl Instr {
    /// Return the discriminant for this instruction value.
    pub fn op(&self) -> InstrOp {
        self.into()
    }

    /// Stack allocations and casts only shape storage or reinterpret a value.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Instr::MAlloca(_) | Instr::Cast(_))
    }
}

macro_rules! define_instr_any_instr {
    (
        $($variant:ident),* $(,)?
    ) => {
        impl Instruction for Instr {
            #[auto_enum(Iterator)]
            fn operands(&self) -> impl Iterator<Item = &Operand> {
                match self {
                    $(
                        Instr::$variant(instr) => instr.operands(),
                    )*
                }
            }

            #[auto_enum(Iterator)]
            fn operands_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
                match self {
                    $(
                        Instr::$variant(instr) => instr.operands_mut(),
                    )*
                }
            }

            fn destination(&self) -> Option<Name> {
                match self {
                    $(
                        Instr::$variant(instr) => instr.destination(),
                    )*
                }
            }

            fn set_destination(&mut self, name: Name) {
                match self {
                    $(
                        Instr::$variant(instr) => instr.set_destination(name),
                    )*
                }
            }

            fn destination_type(&self) -> Option<Typeref> {
                match self {
                    $(
                        Instr::$variant(instr) => instr.destination_type(),
                    )*
                }
            }
        }
    };
}

define_instr_any_instr! {
    IBinary,
    ICmp,
    MLoad,
    MStore,
    MAlloca,
    MGetElementPtr,
    Invoke,
    Phi,
    Select,
    Cast,
}

macro_rules! define_instr_from {
    ($typ:ty, $variant:ident) => {
        impl From<$typ> for Instr {
            fn from(inst: $typ) -> Self {
                Instr::$variant(inst)
            }
        }
    };
}

define_instr_from!(int::IBinary, IBinary);
define_instr_from!(int::ICmp, ICmp);

define_instr_from!(mem::MLoad, MLoad);
define_instr_from!(mem::MStore, MStore);
define_instr_from!(mem::MAlloca, MAlloca);
define_instr_from!(mem::MGetElementPtr, MGetElementPtr);

define_instr_from!(misc::Invoke, Invoke);
define_instr_from!(misc::Phi, Phi);
define_instr_from!(misc::Select, Select);
define_instr_from!(misc::Cast, Cast);
