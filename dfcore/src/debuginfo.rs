//! Debug metadata tables
//!
//! Lookups derived from the debug information of both snapshots. The tables
//! are filled before a comparison starts and only read afterwards, so a single
//! [`DebugInfo`] can be shared by concurrently compared pairs.
use std::collections::HashMap;

use dfinstr::{consts::AnyConst, types::Typeref};

/// Declared field names of structure types, keyed by `(type, field index)`.
///
/// Both modules register their own [`Typeref`]s in the same table; handles of
/// distinct registries never collide.
#[derive(Debug, Default, Clone)]
pub struct StructFieldNames {
    names: HashMap<(Typeref, u64), String>,
}

impl StructFieldNames {
    pub fn insert(&mut self, ty: Typeref, index: u64, name: impl Into<String>) {
        self.names.insert((ty, index), name.into());
    }

    /// Register every field of `ty` at once, in declaration order.
    pub fn record_struct<S: Into<String>>(
        &mut self,
        ty: Typeref,
        names: impl IntoIterator<Item = S>,
    ) {
        for (index, name) in names.into_iter().enumerate() {
            self.insert(ty, index as u64, name);
        }
    }

    pub fn get(&self, ty: Typeref, index: u64) -> Option<&str> {
        self.names.get(&(ty, index)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Textual rendering of constants that originate from a macro or an
/// enumerator (e.g. `5` rendered as `LIMIT`).
#[derive(Debug, Default, Clone)]
pub struct MacroConstantMap {
    renderings: HashMap<AnyConst, String>,
}

impl MacroConstantMap {
    pub fn insert(&mut self, constant: impl Into<AnyConst>, rendering: impl Into<String>) {
        self.renderings.insert(constant.into(), rendering.into());
    }

    pub fn get(&self, constant: &AnyConst) -> Option<&str> {
        self.renderings.get(constant).map(String::as_str)
    }

    /// The left constant has a rendering, and it equals either the right
    /// constant's rendering or the right constant's plain value.
    pub fn equivalent(&self, left: &AnyConst, right: &AnyConst) -> bool {
        let Some(rendering) = self.get(left) else {
            return false;
        };
        self.get(right) == Some(rendering) || right.to_string() == rendering
    }

    pub fn len(&self) -> usize {
        self.renderings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderings.is_empty()
    }
}

/// Every debug-derived table the differential rules consult.
#[derive(Debug, Default, Clone)]
pub struct DebugInfo {
    pub struct_field_names: StructFieldNames,
    pub macro_constants: MacroConstantMap,
}
