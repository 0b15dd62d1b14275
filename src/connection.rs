use futures_core::future::BoxFuture;

use crate::error::Result;

/// One text-format result row: a value per column, `None` for SQL NULL.
pub type CatalogRow = Vec<Option<String>>;

/// A connection-like object that can run the crate's catalog queries.
///
/// This crate does not own a connection; the driver embedding it implements
/// this for whatever connection type it has. Queries are always issued with
/// text parameters and text results, so no type adaptation is needed to
/// bootstrap type adaptation.
pub trait CatalogExecutor {
    fn query<'e>(
        &'e mut self,
        sql: &'static str,
        params: &'e [&'e str],
    ) -> BoxFuture<'e, Result<Vec<CatalogRow>>>;
}

/// Blocking flavor of [`CatalogExecutor`], for drivers without an async
/// runtime.
pub trait BlockingCatalogExecutor {
    fn query(&mut self, sql: &'static str, params: &[&str]) -> Result<Vec<CatalogRow>>;
}
