use std::sync::Arc;

use ahash::AHashMap;

use crate::arguments::PgArgumentBuffer;
use crate::encoding::PgClientEncoding;
use crate::error::Result;
use crate::type_info::Oid;
use crate::types::enums::{PgEnum, PgEnumMember};
use crate::value::{PgFormat, PgLoaded, PgParam};

/// The shape of a converter, fixed when it is registered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PgConverterKind {
    /// Scalar converter backed by a native enum binding.
    ScalarBound,

    /// Scalar converter with no binding; dumps declared values, loads text
    /// or raw bytes.
    ScalarGeneric,

    /// Array-of-enum converter backed by a binding.
    ArrayBound,

    /// Array-of-enum converter with no binding.
    ArrayGeneric,
}

/// Encodes values into the bind-parameter wire image for one `(OID, format)`
/// key.
pub trait PgDump: Send + Sync {
    fn kind(&self) -> PgConverterKind;

    fn dump(
        &self,
        value: PgParam<'_>,
        encoding: PgClientEncoding,
        buf: &mut PgArgumentBuffer,
    ) -> Result<()>;
}

/// Decodes result-column wire images for one `(OID, format)` key.
pub trait PgLoad: Send + Sync {
    fn kind(&self) -> PgConverterKind;

    fn load(&self, raw: &[u8], encoding: PgClientEncoding) -> Result<PgLoaded>;
}

/// Converter lookup tables keyed by `(OID, format)`.
///
/// Dumpers and loaders are registered and looked up independently; the
/// protocol negotiates parameter and result formats separately.
#[derive(Default, Clone)]
pub struct PgAdapterRegistry {
    dumpers: AHashMap<(Oid, PgFormat), Arc<dyn PgDump>>,
    loaders: AHashMap<(Oid, PgFormat), Arc<dyn PgLoad>>,
}

impl PgAdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dumper, replacing any previous one for the same key.
    pub fn insert_dumper(&mut self, oid: Oid, format: PgFormat, dumper: Arc<dyn PgDump>) {
        self.dumpers.insert((oid, format), dumper);
    }

    /// Register a loader, replacing any previous one for the same key.
    pub fn insert_loader(&mut self, oid: Oid, format: PgFormat, loader: Arc<dyn PgLoad>) {
        self.loaders.insert((oid, format), loader);
    }

    pub fn dumper_for(&self, oid: Oid, format: PgFormat) -> Option<&Arc<dyn PgDump>> {
        self.dumpers.get(&(oid, format))
    }

    pub fn loader_for(&self, oid: Oid, format: PgFormat) -> Option<&Arc<dyn PgLoad>> {
        self.loaders.get(&(oid, format))
    }
}

/// Everything a connection needs to adapt enum values: the converter
/// registry and the client encoding.
///
/// Contexts are plain values passed explicitly; two connections never share
/// one unless the caller arranges it.
#[derive(Default, Clone)]
pub struct PgAdaptContext {
    pub(crate) registry: PgAdapterRegistry,
    pub(crate) client_encoding: PgClientEncoding,
}

impl PgAdaptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_encoding(client_encoding: PgClientEncoding) -> Self {
        Self {
            registry: PgAdapterRegistry::new(),
            client_encoding,
        }
    }

    pub fn registry(&self) -> &PgAdapterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PgAdapterRegistry {
        &mut self.registry
    }

    pub fn client_encoding(&self) -> PgClientEncoding {
        self.client_encoding
    }

    /// Mirror a change of the server's `client_encoding` parameter.
    ///
    /// Converters read the encoding at conversion time, so this affects
    /// converters that are already registered.
    pub fn set_client_encoding(&mut self, client_encoding: PgClientEncoding) {
        self.client_encoding = client_encoding;
    }

    /// Dump `value` for the bind parameter `(oid, format)`, appending the
    /// value image to `buf`.
    pub fn dump(
        &self,
        oid: Oid,
        format: PgFormat,
        value: PgParam<'_>,
        buf: &mut PgArgumentBuffer,
    ) -> Result<()> {
        let dumper = self
            .registry
            .dumper_for(oid, format)
            .ok_or_else(|| err_protocol!("no dumper registered for oid {} ({:?})", oid, format))?;

        dumper.dump(value, self.client_encoding, buf)
    }

    /// Dump a single native enum value.
    pub fn dump_member<E: PgEnum>(
        &self,
        oid: Oid,
        format: PgFormat,
        value: &E,
        buf: &mut PgArgumentBuffer,
    ) -> Result<()> {
        self.dump(oid, format, PgParam::Member(value), buf)
    }

    /// Dump a slice of native enum values as an array.
    pub fn dump_slice<E: PgEnum>(
        &self,
        oid: Oid,
        format: PgFormat,
        values: &[E],
        buf: &mut PgArgumentBuffer,
    ) -> Result<()> {
        let members: Vec<Option<&dyn PgEnumMember>> = values
            .iter()
            .map(|value| Some(value as &dyn PgEnumMember))
            .collect();

        self.dump(oid, format, PgParam::Slice(&members), buf)
    }

    /// Load the result-column wire image `raw` for `(oid, format)`.
    pub fn load(&self, oid: Oid, format: PgFormat, raw: &[u8]) -> Result<PgLoaded> {
        let loader = self
            .registry
            .loader_for(oid, format)
            .ok_or_else(|| err_protocol!("no loader registered for oid {} ({:?})", oid, format))?;

        loader.load(raw, self.client_encoding)
    }
}
