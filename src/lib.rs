//! Runtime adaptation of PostgreSQL enum types.
//!
//! Fetch a user-defined enum type's metadata from the server catalog, bind
//! it to a native Rust enum (or fall back to a generic adapter), and obtain
//! format-aware converters for the type and its array type, honoring the
//! connection's client encoding.

#[macro_use]
pub mod error;

pub mod arguments;
mod catalog;
pub mod connection;
pub mod encoding;
pub mod registry;
mod type_info;
pub mod types;
mod value;

#[doc(inline)]
pub use self::{
    arguments::PgArgumentBuffer,
    connection::{BlockingCatalogExecutor, CatalogExecutor, CatalogRow},
    encoding::PgClientEncoding,
    error::{Error, Result},
    registry::{PgAdaptContext, PgAdapterRegistry, PgConverterKind, PgDump, PgLoad},
    type_info::{Oid, PgEnumInfo, PgTypeInfo, PgTypeKind},
    types::enums::{
        register_enum, register_enum_generic, PgEnum, PgEnumBinding, PgEnumDumper, PgEnumLoader,
        PgEnumMember, PgEnumPayload,
    },
    value::{PgFormat, PgLoaded, PgMemberRef, PgParam},
};
