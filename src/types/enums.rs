use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::arguments::PgArgumentBuffer;
use crate::encoding::PgClientEncoding;
use crate::error::{Error, Result};
use crate::registry::{PgAdaptContext, PgConverterKind, PgDump, PgLoad};
use crate::type_info::{PgEnumInfo, PgEnumMeta};
use crate::types::array;
use crate::value::{PgFormat, PgLoaded, PgMemberRef, PgParam};

/// The declared backing value of a native enum member, consulted only by
/// the generic dumper.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PgEnumPayload {
    Str(&'static str),
    Int(i64),
}

/// One member of a native enum, as seen through a trait object.
pub trait PgEnumMember: Send + Sync + 'static {
    /// The member's declared name. For a bound enum this must equal the
    /// server label.
    fn name(&self) -> &'static str;

    /// The member's backing value, if it has one beyond its name.
    fn payload(&self) -> Option<PgEnumPayload> {
        None
    }
}

/// A native enum that can be bound to a server enum type.
pub trait PgEnum: PgEnumMember + Copy + Eq {
    /// All members, in declaration order.
    fn members() -> &'static [Self];
}

trait ErasedEnumBinding: Send + Sync {
    fn native_type_name(&self) -> &'static str;

    fn native_type_id(&self) -> TypeId;

    fn member_names(&self) -> Vec<&'static str>;

    fn member_name(&self, index: usize) -> &'static str;

    fn index_of(&self, name: &str) -> Option<usize>;

    fn as_any(&self) -> &dyn Any;
}

struct TypedEnumBinding<E: PgEnum> {
    members: &'static [E],
    by_name: IndexMap<&'static str, usize>,
}

impl<E: PgEnum> TypedEnumBinding<E> {
    fn new() -> Result<Self> {
        let members = E::members();
        let mut by_name = IndexMap::with_capacity(members.len());

        for (index, member) in members.iter().enumerate() {
            if by_name.insert(member.name(), index).is_some() {
                return Err(err_protocol!(
                    "native enum {} declares duplicate member name {:?}",
                    type_name::<E>(),
                    member.name()
                ));
            }
        }

        Ok(Self { members, by_name })
    }
}

impl<E: PgEnum> ErasedEnumBinding for TypedEnumBinding<E> {
    fn native_type_name(&self) -> &'static str {
        type_name::<E>()
    }

    fn native_type_id(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn member_names(&self) -> Vec<&'static str> {
        self.by_name.keys().copied().collect()
    }

    fn member_name(&self, index: usize) -> &'static str {
        self.members[index].name()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A validated association between a server enum type and a native enum:
/// the member table that labels resolve through.
///
/// Cheap to clone; all clones share one table.
#[derive(Clone)]
pub struct PgEnumBinding(Arc<dyn ErasedEnumBinding>);

impl PgEnumBinding {
    /// The fully-qualified name of the bound native type.
    pub fn native_type_name(&self) -> &'static str {
        self.0.native_type_name()
    }

    pub(crate) fn native_type_id(&self) -> TypeId {
        self.0.native_type_id()
    }

    pub(crate) fn member_name(&self, index: usize) -> &'static str {
        self.0.member_name(index)
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.0.index_of(name)
    }

    pub(crate) fn member<E: PgEnum>(&self, index: usize) -> Option<E> {
        self.0
            .as_any()
            .downcast_ref::<TypedEnumBinding<E>>()
            .and_then(|binding| binding.members.get(index).copied())
    }
}

impl Debug for PgEnumBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgEnumBinding")
            .field("native_type", &self.0.native_type_name())
            .field("members", &self.0.member_names())
            .finish()
    }
}

/// Bind the native enum `E` to the fetched server enum type and register
/// bound converters for the type and its array type, in both wire formats.
///
/// Fails with [`Error::BindingMismatch`] when the set of member names of
/// `E` is not exactly the set of server labels; declaration order and
/// server order may differ. On failure the registry is untouched.
pub fn register_enum<E: PgEnum>(info: &mut PgEnumInfo, context: &mut PgAdaptContext) -> Result<()> {
    let binding = PgEnumBinding(Arc::new(TypedEnumBinding::<E>::new()?));

    let missing: Vec<String> = info
        .meta
        .labels
        .iter()
        .filter(|label| binding.index_of(label).is_none())
        .cloned()
        .collect();

    let extra: Vec<String> = binding
        .0
        .member_names()
        .into_iter()
        .filter(|name| !info.meta.labels.contains(*name))
        .map(str::to_owned)
        .collect();

    if !missing.is_empty() || !extra.is_empty() {
        return Err(Error::BindingMismatch {
            type_name: info.meta.name.clone(),
            missing,
            extra,
        });
    }

    tracing::debug!(
        pg_type = info.meta.name.as_str(),
        native = binding.native_type_name(),
        "binding enum type"
    );

    info.binding = Some(binding.clone());

    install_converters(context, &info.meta, Some(binding));

    Ok(())
}

/// Register generic (unbound) converters for the fetched enum type and its
/// array type: values dump their declared payloads and load as label text
/// or raw bytes.
pub fn register_enum_generic(info: &PgEnumInfo, context: &mut PgAdaptContext) -> Result<()> {
    tracing::debug!(
        pg_type = info.meta.name.as_str(),
        "registering generic enum converters"
    );

    install_converters(context, &info.meta, None);

    Ok(())
}

fn install_converters(
    context: &mut PgAdaptContext,
    meta: &Arc<PgEnumMeta>,
    binding: Option<PgEnumBinding>,
) {
    let (scalar_kind, array_kind) = match binding {
        Some(_) => (PgConverterKind::ScalarBound, PgConverterKind::ArrayBound),
        None => (PgConverterKind::ScalarGeneric, PgConverterKind::ArrayGeneric),
    };

    let registry = context.registry_mut();

    for format in [PgFormat::Text, PgFormat::Binary] {
        registry.insert_dumper(
            meta.oid,
            format,
            Arc::new(PgEnumDumper {
                kind: scalar_kind,
                format,
                meta: Arc::clone(meta),
                binding: binding.clone(),
            }),
        );
        registry.insert_loader(
            meta.oid,
            format,
            Arc::new(PgEnumLoader {
                kind: scalar_kind,
                format,
                meta: Arc::clone(meta),
                binding: binding.clone(),
            }),
        );

        // a type without an array form gets scalar converters only
        if meta.array_oid.to_u32() != 0 {
            registry.insert_dumper(
                meta.array_oid,
                format,
                Arc::new(PgEnumDumper {
                    kind: array_kind,
                    format,
                    meta: Arc::clone(meta),
                    binding: binding.clone(),
                }),
            );
            registry.insert_loader(
                meta.array_oid,
                format,
                Arc::new(PgEnumLoader {
                    kind: array_kind,
                    format,
                    meta: Arc::clone(meta),
                    binding: binding.clone(),
                }),
            );
        }
    }
}

/// Encodes enum values (or arrays of them) into their wire image.
pub struct PgEnumDumper {
    kind: PgConverterKind,
    format: PgFormat,
    meta: Arc<PgEnumMeta>,
    binding: Option<PgEnumBinding>,
}

impl PgEnumDumper {
    // The label bytes a member dumps, before character encoding.
    fn label_for(&self, member: &dyn PgEnumMember) -> Result<&'static str> {
        match &self.binding {
            Some(binding) => {
                if binding.index_of(member.name()).is_none() {
                    return Err(err_protocol!(
                        "value {:?} is not a member of the enum bound to {:?}",
                        member.name(),
                        self.meta.name
                    ));
                }

                Ok(member.name())
            }

            None => Ok(match member.payload() {
                Some(PgEnumPayload::Str(value)) => value,
                Some(PgEnumPayload::Int(_)) | None => member.name(),
            }),
        }
    }

    fn image_for(
        &self,
        member: &dyn PgEnumMember,
        encoding: PgClientEncoding,
    ) -> Result<Cow<'static, [u8]>> {
        // int payloads have no 'static text; render them here
        if self.binding.is_none() {
            if let Some(PgEnumPayload::Int(value)) = member.payload() {
                return Ok(Cow::Owned(value.to_string().into_bytes()));
            }
        }

        encoding.encode_label(self.label_for(member)?)
    }
}

impl PgDump for PgEnumDumper {
    fn kind(&self) -> PgConverterKind {
        self.kind
    }

    fn dump(
        &self,
        value: PgParam<'_>,
        encoding: PgClientEncoding,
        buf: &mut PgArgumentBuffer,
    ) -> Result<()> {
        match (self.kind, value) {
            // the scalar image is the label bytes in both wire formats
            (PgConverterKind::ScalarBound | PgConverterKind::ScalarGeneric, PgParam::Member(member)) => {
                let image = self.image_for(member, encoding)?;
                buf.extend_from_slice(&image);

                Ok(())
            }

            (PgConverterKind::ArrayBound | PgConverterKind::ArrayGeneric, PgParam::Slice(members)) => {
                let mut images = Vec::with_capacity(members.len());

                for member in members {
                    images.push(match member {
                        Some(member) => Some(self.image_for(*member, encoding)?),
                        None => None,
                    });
                }

                match self.format {
                    PgFormat::Text => array::write_text_array(buf, &images),
                    PgFormat::Binary => array::write_binary_array(buf, self.meta.oid, &images),
                }
            }

            (_, value) => Err(err_protocol!(
                "cannot dump {:?} with a {:?} converter for {:?}",
                value,
                self.kind,
                self.meta.name
            )),
        }
    }
}

/// Decodes enum wire images (or arrays of them) into [`PgLoaded`] values.
pub struct PgEnumLoader {
    kind: PgConverterKind,
    format: PgFormat,
    meta: Arc<PgEnumMeta>,
    binding: Option<PgEnumBinding>,
}

impl PgEnumLoader {
    fn load_scalar(&self, raw: &[u8], encoding: PgClientEncoding) -> Result<PgLoaded> {
        match &self.binding {
            Some(binding) => {
                let label = match encoding.decode_label(raw)? {
                    Some(label) => label,

                    // pass-through mode; labels still compare byte-wise
                    None => match std::str::from_utf8(raw) {
                        Ok(label) => Cow::Borrowed(label),
                        Err(_) => {
                            return Err(self.unknown_label(String::from_utf8_lossy(raw)));
                        }
                    },
                };

                match binding.index_of(&label) {
                    Some(index) => Ok(PgLoaded::Member(PgMemberRef {
                        binding: binding.clone(),
                        index,
                    })),
                    None => Err(self.unknown_label(label)),
                }
            }

            None => match self.format {
                PgFormat::Text => match encoding.decode_label(raw)? {
                    Some(label) => Ok(PgLoaded::Text(label.into_owned())),
                    None => Ok(PgLoaded::Bytes(raw.to_vec())),
                },

                PgFormat::Binary => Ok(PgLoaded::Bytes(raw.to_vec())),
            },
        }
    }

    fn unknown_label(&self, label: impl Into<String>) -> Error {
        Error::UnknownLabel {
            type_name: self.meta.name.clone(),
            label: label.into(),
        }
    }
}

impl PgLoad for PgEnumLoader {
    fn kind(&self) -> PgConverterKind {
        self.kind
    }

    fn load(&self, raw: &[u8], encoding: PgClientEncoding) -> Result<PgLoaded> {
        match self.kind {
            PgConverterKind::ScalarBound | PgConverterKind::ScalarGeneric => {
                self.load_scalar(raw, encoding)
            }

            PgConverterKind::ArrayBound | PgConverterKind::ArrayGeneric => {
                let elements = match self.format {
                    PgFormat::Text => array::parse_text_array(raw)?,
                    PgFormat::Binary => array::parse_binary_array(raw, self.meta.oid)?,
                };

                let mut loaded = Vec::with_capacity(elements.len());

                for element in elements {
                    loaded.push(match element {
                        Some(image) => self.load_scalar(&image, encoding)?,
                        None => PgLoaded::Null,
                    });
                }

                Ok(PgLoaded::Array(loaded))
            }
        }
    }
}
