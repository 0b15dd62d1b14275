use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use indexmap::IndexSet;

use crate::error::Result;
use crate::types::enums::PgEnumBinding;

/// The PostgreSQL [`OID`] type stores an object identifier,
/// used internally by PostgreSQL as primary keys for various system tables.
///
/// [`OID`]: https://www.postgresql.org/docs/current/datatype-oid.html
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Oid(
    /// The raw unsigned integer value sent over the wire
    pub u32,
);

impl Oid {
    /// Wrap a `u32` as an OID.
    pub const fn from_u32(oid: u32) -> Self {
        Self(oid)
    }

    /// Get the corresponding `u32` from the OID.
    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.to_u32().fmt(f)
    }
}

/// The kind of a type in the PostgreSQL catalog, from `pg_type.typtype`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PgTypeKind {
    Base,
    Composite,
    Domain,
    Enum,
    Pseudo,
    Range,
}

impl PgTypeKind {
    pub(crate) fn from_typtype(typtype: &str) -> Result<Self> {
        Ok(match typtype {
            "b" => PgTypeKind::Base,
            "c" => PgTypeKind::Composite,
            "d" => PgTypeKind::Domain,
            "e" => PgTypeKind::Enum,
            "p" => PgTypeKind::Pseudo,
            "r" | "m" => PgTypeKind::Range,
            other => {
                return Err(err_protocol!("unknown value {:?} for pg_type.typtype", other));
            }
        })
    }
}

impl Display for PgTypeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PgTypeKind::Base => "base type",
            PgTypeKind::Composite => "composite type",
            PgTypeKind::Domain => "domain",
            PgTypeKind::Enum => "enum type",
            PgTypeKind::Pseudo => "pseudo-type",
            PgTypeKind::Range => "range type",
        })
    }
}

/// Type information for a PostgreSQL type, as resolved from the server catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgTypeInfo {
    pub(crate) name: String,
    pub(crate) oid: Oid,
    pub(crate) array_oid: Oid,
    pub(crate) kind: PgTypeKind,
}

impl PgTypeInfo {
    /// Name of the type as stored in `pg_type.typname`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Object id of the type.
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// Object id of the array type whose elements are this type, or `Oid(0)`
    /// if the type has no array form.
    pub fn array_oid(&self) -> Oid {
        self.array_oid
    }

    pub fn kind(&self) -> PgTypeKind {
        self.kind
    }

    /// Does this type get adapter support from this crate?
    pub fn is_enum(&self) -> bool {
        self.kind == PgTypeKind::Enum
    }
}

impl Display for PgTypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Shared, immutable metadata for one server enum type.
#[derive(Debug, PartialEq, Eq)]
pub struct PgEnumMeta {
    pub(crate) name: String,
    pub(crate) oid: Oid,
    pub(crate) array_oid: Oid,
    pub(crate) labels: IndexSet<String>,
}

/// Metadata for a server enum type: the ordered label list, plus the native
/// binding once one has been registered.
#[derive(Debug, Clone)]
pub struct PgEnumInfo {
    pub(crate) meta: Arc<PgEnumMeta>,
    pub(crate) binding: Option<PgEnumBinding>,
}

impl PgEnumInfo {
    pub(crate) fn from_parts(
        name: String,
        oid: Oid,
        array_oid: Oid,
        labels: Vec<String>,
    ) -> Result<Self> {
        if oid.to_u32() == 0 {
            return Err(err_protocol!("enum type {:?} reported with oid 0", name));
        }

        if array_oid == oid {
            return Err(err_protocol!(
                "enum type {:?} reported its own oid {} as its array oid",
                name,
                oid
            ));
        }

        let mut set = IndexSet::with_capacity(labels.len());

        for label in labels {
            if !set.insert(label) {
                return Err(err_protocol!("enum type {:?} reported duplicate labels", name));
            }
        }

        Ok(Self {
            meta: Arc::new(PgEnumMeta {
                name,
                oid,
                array_oid,
                labels: set,
            }),
            binding: None,
        })
    }

    /// Name of the enum type as stored in `pg_type.typname`.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Object id of the enum type.
    pub fn oid(&self) -> Oid {
        self.meta.oid
    }

    /// Object id of the array type whose elements are this enum, or `Oid(0)`
    /// if the server reported no array form.
    pub fn array_oid(&self) -> Oid {
        self.meta.array_oid
    }

    /// Labels in server order (`pg_enum.enumsortorder`).
    pub fn labels(&self) -> impl ExactSizeIterator<Item = &str> {
        self.meta.labels.iter().map(|s| s.as_str())
    }

    /// The installed native binding, if [`register_enum`][crate::register_enum]
    /// has been called for this type.
    pub fn binding(&self) -> Option<&PgEnumBinding> {
        self.binding.as_ref()
    }
}
