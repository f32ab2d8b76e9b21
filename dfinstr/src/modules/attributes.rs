//! Function, return and parameter attributes.
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Attributes attached to a function, its return value or one of its
    /// parameters. Call sites carry their own copy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct AttributeFlags: u32 {
        /// Always inline the function, regardless of heuristics.
        const ALWAYS_INLINE = 1 << 0;
        /// Source-level hint that inlining is desirable.
        const INLINE_HINT = 1 << 1;
        /// Never inline the function.
        const NO_INLINE = 1 << 2;
        /// The function never unwinds.
        const NO_UNWIND = 1 << 3;
        /// The function only reads memory.
        const READ_ONLY = 1 << 4;
        /// The function neither reads nor writes memory.
        const READ_NONE = 1 << 5;
        /// The pointer is never null.
        const NON_NULL = 1 << 6;
        /// The pointer does not alias any other pointer visible to the callee.
        const NO_ALIAS = 1 << 7;
        /// The function never returns.
        const NO_RETURN = 1 << 8;
        /// The function is rarely called.
        const COLD = 1 << 9;
        /// The value is zero-extended by the caller or callee.
        const ZERO_EXT = 1 << 10;
        /// The value is sign-extended by the caller or callee.
        const SIGN_EXT = 1 << 11;

        /// Attributes that only steer the inliner.
        const INLINING = Self::ALWAYS_INLINE.bits() | Self::INLINE_HINT.bits() | Self::NO_INLINE.bits();
    }
}

impl AttributeFlags {
    /// Render the flags using their LLVM spelling.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        const NAMES: [(AttributeFlags, &str); 12] = [
            (AttributeFlags::ALWAYS_INLINE, "alwaysinline"),
            (AttributeFlags::INLINE_HINT, "inlinehint"),
            (AttributeFlags::NO_INLINE, "noinline"),
            (AttributeFlags::NO_UNWIND, "nounwind"),
            (AttributeFlags::READ_ONLY, "readonly"),
            (AttributeFlags::READ_NONE, "readnone"),
            (AttributeFlags::NON_NULL, "nonnull"),
            (AttributeFlags::NO_ALIAS, "noalias"),
            (AttributeFlags::NO_RETURN, "noreturn"),
            (AttributeFlags::COLD, "cold"),
            (AttributeFlags::ZERO_EXT, "zeroext"),
            (AttributeFlags::SIGN_EXT, "signext"),
        ];
        NAMES
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

/// Positional attribute sets: one for the function itself, one for the return
/// value and one per parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttributeList {
    pub function: AttributeFlags,
    pub ret: AttributeFlags,
    pub params: Vec<AttributeFlags>,
}

impl AttributeList {
    /// Function-level attributes only.
    pub fn function(flags: AttributeFlags) -> Self {
        Self {
            function: flags,
            ..Default::default()
        }
    }

    /// Copy of the list with every flag of `mask` removed from every position.
    pub fn without(&self, mask: AttributeFlags) -> Self {
        Self {
            function: self.function.difference(mask),
            ret: self.ret.difference(mask),
            params: self.params.iter().map(|p| p.difference(mask)).collect(),
        }
    }

    /// Flags at parameter `index`, empty when the position was never set.
    pub fn param(&self, index: usize) -> AttributeFlags {
        self.params.get(index).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.function.is_empty() && self.ret.is_empty() && self.params.iter().all(|p| p.is_empty())
    }
}
