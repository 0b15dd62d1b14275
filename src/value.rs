use std::fmt::{self, Debug, Formatter};

use crate::types::enums::{PgEnumBinding, PgEnumMember};

/// The format of a value on the wire, negotiated per bind parameter or
/// result column in the protocol.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum PgFormat {
    Text = 0,
    Binary = 1,
}

impl PgFormat {
    /// The format code carried in `Bind` and `RowDescription` messages.
    pub fn code(self) -> i16 {
        self as i16
    }
}

/// A borrowed value handed to a dumper.
///
/// Array dumpers take a `Slice`; a `None` element dumps as SQL NULL.
#[derive(Copy, Clone)]
pub enum PgParam<'a> {
    Member(&'a dyn PgEnumMember),
    Slice(&'a [Option<&'a dyn PgEnumMember>]),
}

impl Debug for PgParam<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PgParam::Member(member) => f.debug_tuple("Member").field(&member.name()).finish(),
            PgParam::Slice(members) => f
                .debug_list()
                .entries(members.iter().map(|m| m.map(|m| m.name())))
                .finish(),
        }
    }
}

/// A value produced by a loader.
#[derive(Debug, Clone, PartialEq)]
pub enum PgLoaded {
    /// A label resolved through an installed binding.
    Member(PgMemberRef),

    /// Decoded label text from a generic (unbound) loader.
    Text(String),

    /// Raw label bytes from a generic loader: binary format, or any format
    /// under `SQL_ASCII`.
    Bytes(Vec<u8>),

    Null,

    Array(Vec<PgLoaded>),
}

impl PgLoaded {
    /// The member, if this value resolved through a binding.
    pub fn as_member(&self) -> Option<&PgMemberRef> {
        match self {
            PgLoaded::Member(member) => Some(member),
            _ => None,
        }
    }
}

/// A reference to one member of a bound native enum, resolved from a label.
#[derive(Clone)]
pub struct PgMemberRef {
    pub(crate) binding: PgEnumBinding,
    pub(crate) index: usize,
}

impl PgMemberRef {
    /// The member's declared name (equal to the server label it was
    /// resolved from).
    pub fn name(&self) -> &'static str {
        self.binding.member_name(self.index)
    }

    /// Recover the native enum value; `None` if `E` is not the bound type.
    pub fn get<E: crate::types::enums::PgEnum>(&self) -> Option<E> {
        self.binding.member::<E>(self.index)
    }
}

impl Debug for PgMemberRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgMemberRef")
            .field("type", &self.binding.native_type_name())
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for PgMemberRef {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.binding.native_type_id() == other.binding.native_type_id()
    }
}
