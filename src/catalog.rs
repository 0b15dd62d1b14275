use crate::connection::{BlockingCatalogExecutor, CatalogExecutor, CatalogRow};
use crate::error::Result;
use crate::type_info::{Oid, PgEnumInfo, PgTypeInfo, PgTypeKind};
use crate::types::array::parse_text_array;

// `to_regtype` applies the server's own case folding, quoting, and
// search-path rules to the name, so schema-qualified and mixed-case names
// resolve exactly as they would in a query.
const TYPE_BY_NAME: &str = "\
SELECT t.typname, t.oid, t.typarray, t.typtype \
FROM pg_catalog.pg_type t \
WHERE t.oid = to_regtype($1)";

const ENUM_BY_NAME: &str = "\
SELECT t.typname, t.oid, t.typarray, t.typtype, \
(SELECT array_agg(e.enumlabel ORDER BY e.enumsortorder) \
FROM pg_catalog.pg_enum e WHERE e.enumtypid = t.oid) \
FROM pg_catalog.pg_type t \
WHERE t.oid = to_regtype($1)";

impl PgTypeInfo {
    /// Look up a type by name in the server catalog.
    ///
    /// Returns `Ok(None)` if the name does not resolve to a type. One
    /// catalog round trip.
    pub async fn fetch<E>(executor: &mut E, name: &str) -> Result<Option<Self>>
    where
        E: CatalogExecutor + ?Sized,
    {
        let rows = executor.query(TYPE_BY_NAME, &[name]).await?;

        type_info_from_rows(rows)
    }

    /// Blocking flavor of [`fetch`][Self::fetch].
    pub fn fetch_blocking<E>(executor: &mut E, name: &str) -> Result<Option<Self>>
    where
        E: BlockingCatalogExecutor + ?Sized,
    {
        let rows = executor.query(TYPE_BY_NAME, &[name])?;

        type_info_from_rows(rows)
    }
}

impl PgEnumInfo {
    /// Look up an enum type by name in the server catalog, including its
    /// ordered label list.
    ///
    /// Returns `Ok(None)` if the name does not resolve to a type, and
    /// [`Error::UnsupportedType`][crate::Error::UnsupportedType] if it
    /// resolves to a type that is not an enum. One catalog round trip.
    pub async fn fetch<E>(executor: &mut E, name: &str) -> Result<Option<Self>>
    where
        E: CatalogExecutor + ?Sized,
    {
        let rows = executor.query(ENUM_BY_NAME, &[name]).await?;

        enum_info_from_rows(rows)
    }

    /// Blocking flavor of [`fetch`][Self::fetch].
    pub fn fetch_blocking<E>(executor: &mut E, name: &str) -> Result<Option<Self>>
    where
        E: BlockingCatalogExecutor + ?Sized,
    {
        let rows = executor.query(ENUM_BY_NAME, &[name])?;

        enum_info_from_rows(rows)
    }
}

fn type_info_from_rows(rows: Vec<CatalogRow>) -> Result<Option<PgTypeInfo>> {
    let row = match rows.into_iter().next() {
        Some(row) => row,
        None => return Ok(None),
    };

    let (name, oid, array_oid, kind) = interpret_type_columns(&row)?;

    tracing::debug!(
        name,
        oid = oid.to_u32(),
        array_oid = array_oid.to_u32(),
        %kind,
        "resolved type"
    );

    Ok(Some(PgTypeInfo {
        name: name.to_owned(),
        oid,
        array_oid,
        kind,
    }))
}

fn enum_info_from_rows(rows: Vec<CatalogRow>) -> Result<Option<PgEnumInfo>> {
    let row = match rows.into_iter().next() {
        Some(row) => row,
        None => return Ok(None),
    };

    let (name, oid, array_oid, kind) = interpret_type_columns(&row)?;

    if kind != PgTypeKind::Enum {
        return Err(crate::Error::UnsupportedType {
            name: name.to_owned(),
            kind,
        });
    }

    // a just-created enum with no values yet has a NULL label array
    let labels = match column(&row, 4)? {
        Some(literal) => labels_from_literal(literal)?,
        None => Vec::new(),
    };

    tracing::debug!(
        name,
        oid = oid.to_u32(),
        labels = labels.len(),
        "resolved enum type"
    );

    PgEnumInfo::from_parts(name.to_owned(), oid, array_oid, labels).map(Some)
}

fn interpret_type_columns(row: &CatalogRow) -> Result<(&str, Oid, Oid, PgTypeKind)> {
    let name = required_column(row, 0)?;
    let oid = parse_oid(required_column(row, 1)?)?;
    let array_oid = parse_oid(required_column(row, 2)?)?;
    let kind = PgTypeKind::from_typtype(required_column(row, 3)?)?;

    Ok((name, oid, array_oid, kind))
}

fn column(row: &CatalogRow, index: usize) -> Result<Option<&str>> {
    match row.get(index) {
        Some(value) => Ok(value.as_deref()),
        None => Err(err_protocol!(
            "catalog reply is missing column {} (got {} columns)",
            index,
            row.len()
        )),
    }
}

fn required_column(row: &CatalogRow, index: usize) -> Result<&str> {
    column(row, index)?
        .ok_or_else(|| err_protocol!("catalog reply has unexpected NULL in column {}", index))
}

fn parse_oid(text: &str) -> Result<Oid> {
    text.parse::<u32>()
        .map(Oid)
        .map_err(|_| err_protocol!("invalid oid in catalog reply: {:?}", text))
}

// The label list arrives as an `array_agg` text literal; split it back into
// the individual labels.
fn labels_from_literal(literal: &str) -> Result<Vec<String>> {
    let mut labels = Vec::new();

    for element in parse_text_array(literal.as_bytes())? {
        let raw = element
            .ok_or_else(|| err_protocol!("catalog reply contained a NULL enum label"))?;

        labels.push(String::from_utf8(raw).map_err(crate::Error::decode)?);
    }

    Ok(labels)
}
