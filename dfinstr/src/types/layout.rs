//! Data layout
//!
//! Size and alignment rules for a target. Structures follow the C layout
//! rules: each field is placed at the next multiple of its ABI alignment and
//! the whole structure is padded up to its own alignment. Packed structures
//! have alignment 1 and no padding at all.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{
    AnyType, TypeRegistry, Typeref,
    aggregate::StructType,
    primary::{FType, PrimaryType},
};

/// Target description used to size types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataLayout {
    /// Size of a pointer in bytes.
    pub pointer_size: u64,
    /// ABI alignment of a pointer in bytes.
    pub pointer_align: u64,
    /// Largest ABI alignment an integer can get, in bytes.
    pub max_int_align: u64,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            pointer_size: 8,
            pointer_align: 8,
            max_int_align: 8,
        }
    }
}

#[inline]
fn align_to(value: u64, align: u64) -> u64 {
    if align <= 1 {
        value
    } else {
        (value + align - 1) / align * align
    }
}

impl DataLayout {
    fn float_store_size(ty: FType) -> u64 {
        match ty {
            FType::X86Fp80 => 10,
            other => other.num_bits() as u64 / 8,
        }
    }

    fn float_align(ty: FType) -> u64 {
        match ty {
            FType::Fp16 => 2,
            FType::Fp32 => 4,
            FType::Fp64 => 8,
            FType::X86Fp80 | FType::Fp128 => 16,
        }
    }

    /// ABI alignment of `ty`, in bytes.
    pub fn abi_align(&self, registry: &TypeRegistry, ty: Typeref) -> Option<u64> {
        let resolved = registry.resolve(ty)?;
        self.abi_align_of(registry, &resolved)
    }

    /// ABI alignment of an already resolved type.
    pub fn abi_align_of(&self, registry: &TypeRegistry, ty: &AnyType) -> Option<u64> {
        match ty {
            AnyType::Primary(PrimaryType::Int(ity)) => Some(
                (ity.byte_size() as u64)
                    .next_power_of_two()
                    .min(self.max_int_align),
            ),
            AnyType::Primary(PrimaryType::Float(fty)) => Some(Self::float_align(*fty)),
            AnyType::Primary(PrimaryType::Ptr(_)) => Some(self.pointer_align),
            AnyType::Primary(PrimaryType::Lbl(_)) => None,
            AnyType::Array(array) => self.abi_align(registry, array.ty),
            AnyType::Struct(st) if st.packed => Some(1),
            AnyType::Struct(st) => st
                .element_types
                .iter()
                .try_fold(1u64, |acc, elem| Some(acc.max(self.abi_align(registry, *elem)?))),
        }
    }

    /// Number of bytes written when storing a value of type `ty`. Structures
    /// include their tail padding.
    pub fn store_size(&self, registry: &TypeRegistry, ty: Typeref) -> Option<u64> {
        let resolved = registry.resolve(ty)?;
        self.store_size_of(registry, &resolved)
    }

    /// Store size of an already resolved type.
    pub fn store_size_of(&self, registry: &TypeRegistry, ty: &AnyType) -> Option<u64> {
        match ty {
            AnyType::Primary(PrimaryType::Int(ity)) => Some(ity.byte_size() as u64),
            AnyType::Primary(PrimaryType::Float(fty)) => Some(Self::float_store_size(*fty)),
            AnyType::Primary(PrimaryType::Ptr(_)) => Some(self.pointer_size),
            AnyType::Primary(PrimaryType::Lbl(_)) => None,
            AnyType::Array(array) => {
                Some(self.alloc_size(registry, array.ty)? * array.num_elements as u64)
            }
            AnyType::Struct(st) => self.struct_layout(registry, st).map(|(size, _)| size),
        }
    }

    /// Distance in bytes between two consecutive values of type `ty` in an
    /// array.
    pub fn alloc_size(&self, registry: &TypeRegistry, ty: Typeref) -> Option<u64> {
        let resolved = registry.resolve(ty)?;
        let size = self.store_size_of(registry, &resolved)?;
        Some(align_to(size, self.abi_align_of(registry, &resolved)?))
    }

    /// Byte offset of field `index` inside `st`.
    pub fn field_offset(
        &self,
        registry: &TypeRegistry,
        st: &StructType,
        index: usize,
    ) -> Option<u64> {
        if index >= st.element_types.len() {
            return None;
        }
        let mut offset = 0;
        for (i, elem) in st.element_types.iter().enumerate() {
            if !st.packed {
                offset = align_to(offset, self.abi_align(registry, *elem)?);
            }
            if i == index {
                return Some(offset);
            }
            offset += self.alloc_size(registry, *elem)?;
        }
        None
    }

    /// Returns `(size, align)` of a structure.
    fn struct_layout(&self, registry: &TypeRegistry, st: &StructType) -> Option<(u64, u64)> {
        let mut offset = 0;
        let mut max_align = 1;
        for elem in &st.element_types {
            let align = if st.packed {
                1
            } else {
                self.abi_align(registry, *elem)?
            };
            offset = align_to(offset, align);
            offset += self.alloc_size(registry, *elem)?;
            max_align = max_align.max(align);
        }
        Some((align_to(offset, max_align), max_align))
    }
}
