#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumTryAs};

use crate::types::Typeref;

/// Represents an integer type with a specific bit width.
///
/// Signedness is not represented here; all integer types are treated as unsigned.
/// Instructions that operate on signed integers will interpret the bits accordingly.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct IType {
    num_bits: u32,
}

impl IType {
    pub const I1: Self = Self { num_bits: 1 };
    pub const I8: Self = Self { num_bits: 8 };
    pub const I16: Self = Self { num_bits: 16 };
    pub const I32: Self = Self { num_bits: 32 };
    pub const I64: Self = Self { num_bits: 64 };
    pub const I128: Self = Self { num_bits: 128 };
    pub const MIN_BITS: u32 = 1;
    pub const MAX_BITS: u32 = (1 << 23) - 1;

    #[inline]
    const fn check_validity(num_bits: u32) -> bool {
        num_bits >= Self::MIN_BITS && num_bits <= Self::MAX_BITS
    }

    /// Creates a new `IType` with the specified number of bits.
    #[inline]
    pub const fn new(num_bits: u32) -> Option<Self> {
        if Self::check_validity(num_bits) {
            Some(Self { num_bits })
        } else {
            None
        }
    }

    /// Returns the number of bits of the integer type.
    #[inline]
    pub const fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// Returns the number of bytes required to store the integer type.
    #[inline]
    pub const fn byte_size(&self) -> u32 {
        (self.num_bits + 7) / 8
    }

    /// Returns `true` if the integer type is byte-aligned (i.e., its number of bits is a multiple of 8).
    #[inline]
    pub const fn byte_aligned(&self) -> bool {
        self.num_bits % 8 == 0
    }
}

impl std::fmt::Display for IType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.num_bits)
    }
}

/// Represents a floating-point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FType {
    /// 16-bit floating point value (IEEE-754 binary16)
    Fp16,
    /// 32-bit floating point value (IEEE-754 binary32)
    Fp32,
    /// 64-bit floating point value (IEEE-754 binary64)
    Fp64,
    /// 80-bit floating point value (X87 extended precision)
    X86Fp80,
    /// 128-bit floating point value (IEEE-754 binary128)
    Fp128,
}

impl FType {
    /// Number of bits actually holding the value.
    pub const fn num_bits(&self) -> u32 {
        match self {
            FType::Fp16 => 16,
            FType::Fp32 => 32,
            FType::Fp64 => 64,
            FType::X86Fp80 => 80,
            FType::Fp128 => 128,
        }
    }
}

impl std::fmt::Display for FType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FType::Fp16 => "half",
            FType::Fp32 => "float",
            FType::Fp64 => "double",
            FType::X86Fp80 => "x86_fp80",
            FType::Fp128 => "fp128",
        };
        write!(f, "{}", s)
    }
}

/// Pointer type is represented as a primary basic type.
///
/// Unlike fully opaque pointers, a pointer may remember the type it was
/// created to address (`pointee`). This is what lets the comparator recognize
/// "pointer to structure `S`" after a cast. Pointers without pointee behave as
/// opaque pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PtrType {
    pub pointee: Option<Typeref>,
    pub addr_space: u32,
}

impl PtrType {
    /// Opaque pointer in the default address space.
    pub const OPAQUE: Self = Self {
        pointee: None,
        addr_space: 0,
    };

    /// Pointer to `pointee` in the default address space.
    pub const fn to(pointee: Typeref) -> Self {
        Self {
            pointee: Some(pointee),
            addr_space: 0,
        }
    }
}

/// The label type represents code labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LblType;

impl std::fmt::Display for LblType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "label")
    }
}

/// Represents any primitive type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrimaryType {
    Int(IType),
    Float(FType),
    Ptr(PtrType),
    Lbl(LblType),
}

macro_rules! primary_type_from {
    ($typ:ty, $lbl:ident) => {
        impl From<$typ> for PrimaryType {
            fn from(value: $typ) -> Self {
                PrimaryType::$lbl(value)
            }
        }
    };
}

primary_type_from! { IType, Int }
primary_type_from! { FType, Float }
primary_type_from! { PtrType, Ptr }
primary_type_from! { LblType, Lbl }
