//! Types module
//!
//! This module contains the canonical representation of types used by the
//! `dfinstr` crate. It exposes a small type system built on three layers:
//!
//! - Primary types: integers, floats, pointers and labels (see `primary.rs`).
//! - Aggregate types: arrays and structures (see `aggregate.rs`).
//! - A registry-backed [`AnyType`] wrapper and [`TypeRegistry`] which deduplicates
//!   types and provides stable [`Typeref`] identifiers (UUID-based).
//!
//! Every module owns one registry. Identifiers are unique across registries,
//! so a [`Typeref`] taken from one snapshot never aliases a type of the other.
use std::{
    collections::BTreeMap,
    hash::{DefaultHasher, Hash, Hasher},
};

use log::{debug, info};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use strum::{EnumIs, EnumTryAs};
use uuid::{Timestamp, Uuid};

use crate::types::{
    aggregate::{ArrayType, StructType},
    primary::PrimaryType,
};
pub mod aggregate;
pub mod layout;
pub mod primary;

/// A stable reference to a type stored inside a `TypeRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Typeref(Uuid);

impl Typeref {
    /// Underlying identifier.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

/// A sum-type representing any type that can be stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnyType {
    /// Integers, floats, pointers and labels.
    Primary(PrimaryType),

    /// An array type: element typeref + element count.
    Array(ArrayType),

    /// A structure type: an ordered list of element typerefs.
    Struct(StructType),
}

impl<S: Into<PrimaryType>> From<S> for AnyType {
    fn from(value: S) -> Self {
        AnyType::Primary(value.into())
    }
}

impl From<ArrayType> for AnyType {
    fn from(value: ArrayType) -> Self {
        AnyType::Array(value)
    }
}

impl From<StructType> for AnyType {
    fn from(value: StructType) -> Self {
        AnyType::Struct(value)
    }
}

fn fmt_uuid(
    map: &BTreeMap<Uuid, AnyType>,
    uuid: &Uuid,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    match map.get(uuid) {
        Some(ty) => fmt_any(map, ty, f),
        None => write!(f, "<unknown type {}>", uuid),
    }
}

fn fmt_any(
    map: &BTreeMap<Uuid, AnyType>,
    ty: &AnyType,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    match ty {
        AnyType::Primary(PrimaryType::Int(ity)) => write!(f, "{}", ity),
        AnyType::Primary(PrimaryType::Float(fty)) => write!(f, "{}", fty),
        AnyType::Primary(PrimaryType::Lbl(lbl)) => write!(f, "{}", lbl),
        AnyType::Primary(PrimaryType::Ptr(ptr)) => {
            match ptr.pointee {
                Some(pointee) => {
                    fmt_uuid(map, &pointee.0, f)?;
                    write!(f, "*")?;
                }
                None => write!(f, "ptr")?,
            }
            if ptr.addr_space != 0 {
                write!(f, " addrspace({})", ptr.addr_space)?;
            }
            Ok(())
        }
        AnyType::Array(array) => {
            write!(f, "[{} x ", array.num_elements)?;
            fmt_uuid(map, &array.ty.0, f)?;
            write!(f, "]")
        }
        AnyType::Struct(StructType { name: Some(name), .. }) => write!(f, "%{}", name),
        AnyType::Struct(StructType {
            name: None,
            element_types,
            packed,
        }) => {
            write!(f, "{}", if *packed { "<{ " } else { "{ " })?;
            for (i, elem) in element_types.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_uuid(map, &elem.0, f)?;
            }
            write!(f, "{}", if *packed { " }>" } else { " }" })
        }
    }
}

impl AnyType {
    /// Build a formatting helper that renders this type using the provided
    /// registry to resolve referenced element types.
    ///
    /// Example:
    /// ```rust
    /// # use dfinstr::types::{AnyType, TypeRegistry, primary::IType};
    /// let reg = TypeRegistry::new([0; 6]);
    /// let t = AnyType::from(IType::I32);
    /// assert_eq!(format!("{}", t.fmt(&reg)), "i32");
    /// ```
    pub fn fmt<'a>(&'a self, registry: &'a TypeRegistry) -> impl std::fmt::Display + 'a {
        struct AnyTypeFmt<'a> {
            ty: &'a AnyType,
            registry: &'a TypeRegistry,
        }

        impl std::fmt::Display for AnyTypeFmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let map = self.registry.array.read_recursive();
                fmt_any(&map, self.ty, f)
            }
        }

        AnyTypeFmt { ty: self, registry }
    }
}

/// A central registry that stores and deduplicates `AnyType` values.
///
/// The registry provides fast lookup by `Typeref` and ensures identical type
/// descriptions map to the same stable identifier.
///
/// Example:
///
/// ```rust
/// # use dfinstr::types::{TypeRegistry, primary::IType};
/// let reg = TypeRegistry::new([0u8; 6]);
/// let typeref = reg.search_or_insert(IType::I8.into());
/// assert_eq!(reg.search_or_insert(IType::I8.into()), typeref);
/// assert_eq!(reg.get(typeref).as_deref(), Some(&IType::I8.into()));
/// ```
pub struct TypeRegistry {
    array: RwLock<BTreeMap<Uuid, AnyType>>,
    inverse_lookup: RwLock<BTreeMap<u64, SmallVec<[Uuid; 1]>>>,
    context: uuid::timestamp::context::ContextV1,
    node_id: [u8; 6],
}

impl Default for TypeRegistry {
    /// A registry with a random node id.
    fn default() -> Self {
        let random = Uuid::new_v4();
        let mut node_id = [0u8; 6];
        node_id.copy_from_slice(&random.as_bytes()[10..16]);
        Self::new(node_id)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("len", &self.array.read_recursive().len())
            .field("node_id", &self.node_id)
            .finish()
    }
}

impl TypeRegistry {
    fn hash_ty(ty: &AnyType) -> u64 {
        let mut hasher = DefaultHasher::new();
        ty.hash(&mut hasher);
        hasher.finish()
    }

    fn next_uuid(&self) -> Uuid {
        let ts = Timestamp::now(&self.context);
        Uuid::new_v6(ts, &self.node_id)
    }

    /// Create a new [`TypeRegistry`] instance.
    ///
    /// `node_id` is used when allocating UUIDs for newly inserted types. Two
    /// registries built with the same node id may hand out colliding
    /// [`Typeref`]s; prefer [`TypeRegistry::default`] when that matters.
    pub fn new(node_id: [u8; 6]) -> Self {
        Self {
            array: Default::default(),
            inverse_lookup: Default::default(), // INFO: Always lock array before inverse_lookup to avoid deadlock
            context: uuid::timestamp::context::ContextV1::new(0),
            node_id,
        }
    }

    /// Number of distinct types in the registry.
    pub fn len(&self) -> usize {
        self.array.read_recursive().len()
    }

    /// Whether the registry holds no type.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve a borrowed [`AnyType`] for the given `typeref`. Returns
    /// [`None`] if the given `typeref` is not present in the registry.
    ///
    /// # A note on concurrency
    /// The returned guard keeps a read lock held for its lifetime. You mustn't
    /// hold it while calling [`Self::search_or_insert`], as that may attempt
    /// to upgrade to a write lock, leading to a deadlock.
    pub fn get(&self, typeref: Typeref) -> Option<MappedRwLockReadGuard<'_, AnyType>> {
        let array_lock = self.array.read_recursive();
        RwLockReadGuard::try_map(array_lock, |map| map.get(&typeref.0)).ok()
    }

    /// Owned copy of the type behind `typeref`. Does not hold any lock once it
    /// returns, which makes it the preferred accessor for long computations.
    pub fn resolve(&self, typeref: Typeref) -> Option<AnyType> {
        self.array.read_recursive().get(&typeref.0).cloned()
    }

    /// Insert `ty` into the registry if an equivalent type doesn't already
    /// exist and return the [`Typeref`] for it.
    ///
    /// # A note on concurrency
    /// This method acquires upgradable read locks on the type storage and
    /// upgrades them only when a new type must be inserted. You **MUST NOT**
    /// hold a guard returned by [`Self::get`] while calling it.
    ///
    /// # About hash collisions
    /// Candidates are found through a 64-bit hash and then compared for
    /// equality, so collisions only cost performance and are logged.
    pub fn search_or_insert(&self, ty: AnyType) -> Typeref {
        let h = Self::hash_ty(&ty);

        // Lock, notice that the order is critical, always lock first database first
        let mut array_lock = self.array.upgradable_read();
        let mut inverse_lookup_lock = self.inverse_lookup.upgradable_read();

        if let Some(typerefs) = inverse_lookup_lock.get(&h) {
            for typeref in typerefs {
                if array_lock.get(typeref) == Some(&ty) {
                    return Typeref(*typeref);
                }
            }
        }

        // NOTE: Ordering of upgrade is paramount to avoid deadlock
        array_lock.with_upgraded(|array_lock| {
            inverse_lookup_lock.with_upgraded(|inverse_lookup_lock| {
                let new_typeref = self.next_uuid();

                if let Some(list) = inverse_lookup_lock.get_mut(&h) {
                    info!(
                        "Detected an hash collision on hash 0x{:016x} ({} candidates)",
                        h,
                        list.len() + 1
                    );
                    list.push(new_typeref);
                } else {
                    inverse_lookup_lock.insert(h, smallvec![new_typeref]);
                }

                array_lock.insert(new_typeref, ty);
                debug!(
                    "New type encountered {}. Registered with UUID {}.",
                    TypeFmt {
                        map: &*array_lock,
                        uuid: new_typeref
                    },
                    new_typeref
                );
                Typeref(new_typeref)
            })
        })
    }

    /// Format a given `Typeref` using this registry.
    pub fn fmt(&self, typeref: Typeref) -> impl std::fmt::Display + '_ {
        struct Fmt<'a> {
            registry: &'a TypeRegistry,
            typeref: Typeref,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let map = self.registry.array.read_recursive();
                fmt_uuid(&map, &self.typeref.0, f)
            }
        }

        Fmt {
            registry: self,
            typeref,
        }
    }
}

struct TypeFmt<'a> {
    map: &'a BTreeMap<Uuid, AnyType>,
    uuid: Uuid,
}

impl std::fmt::Display for TypeFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_uuid(self.map, &self.uuid, f)
    }
}
