use num_bigint::{BigInt, Sign};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::primary::IType;

/// Integer constant of a given width.
///
/// Constructors store `value` reduced to the unsigned range of the width, so
/// one bit pattern has exactly one representation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IConst {
    pub ty: IType,
    pub value: BigInt,
}

impl IConst {
    pub fn new(ty: IType, value: impl Into<BigInt>) -> Self {
        let value = Self::wrap(ty, value.into());
        Self { ty, value }
    }

    fn wrap(ty: IType, value: BigInt) -> BigInt {
        let modulus = BigInt::from(1u8) << ty.num_bits();
        let reduced = value % &modulus;
        if reduced.sign() == Sign::Minus {
            reduced + modulus
        } else {
            reduced
        }
    }

    /// The value reduced to the unsigned range of the constant's width, i.e.
    /// the value one gets when zero-extending the bits.
    pub fn zext_value(&self) -> BigInt {
        Self::wrap(self.ty, self.value.clone())
    }

    /// The bits read as a two's complement integer.
    pub fn sext_value(&self) -> BigInt {
        let bits = self.ty.num_bits();
        let value = self.zext_value();
        if bits > 0 && value.bit(u64::from(bits) - 1) {
            value - (BigInt::from(1u8) << bits)
        } else {
            value
        }
    }

    /// Whether every bit of the constant is zero.
    pub fn is_zero(&self) -> bool {
        self.zext_value().sign() == Sign::NoSign
    }
}

impl std::fmt::Display for IConst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sext_value())
    }
}

impl From<bool> for IConst {
    fn from(value: bool) -> Self {
        Self::new(IType::I1, value as u8)
    }
}

macro_rules! iconst_from {
    ($typ:ty, $ity:expr) => {
        impl From<$typ> for IConst {
            fn from(value: $typ) -> Self {
                Self::new($ity, value)
            }
        }
    };
}

iconst_from! { u8, IType::I8 }
iconst_from! { u16, IType::I16 }
iconst_from! { u32, IType::I32 }
iconst_from! { u64, IType::I64 }
iconst_from! { i32, IType::I32 }
iconst_from! { i64, IType::I64 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zext_value() {
        let minus_one = IConst::new(IType::I8, -1);
        assert_eq!(minus_one.zext_value(), BigInt::from(255));
        assert!(!minus_one.is_zero());

        let wrapped = IConst::new(IType::I8, 256);
        assert!(wrapped.is_zero());
        assert_eq!(IConst::from(7u32).zext_value(), BigInt::from(7));
    }

    #[test]
    fn test_one_representation_per_bit_pattern() {
        let signed = IConst::from(-1i32);
        let unsigned = IConst::from(u32::MAX);
        assert_eq!(signed, unsigned);
        assert_eq!(signed.value, BigInt::from(u32::MAX));
        assert_eq!(signed.sext_value(), BigInt::from(-1));
        assert_eq!(signed.to_string(), "-1");
        assert_eq!(IConst::from(7i64).sext_value(), BigInt::from(7));
    }
}
