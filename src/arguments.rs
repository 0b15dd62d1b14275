use std::ops::{Deref, DerefMut};

use crate::error::Result;

/// A specialized buffer that dumpers encode bind arguments into.
///
/// The caller owns the surrounding protocol message; dumpers only append the
/// value image itself.
#[derive(Debug, Default)]
pub struct PgArgumentBuffer {
    inner: Vec<u8>,
}

impl PgArgumentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.inner
    }

    /// Append a value image produced by `write`, prefixed with its length as
    /// a big-endian `i32` (the element framing used inside binary arrays).
    ///
    /// The length is patched in after `write` runs, since the image size is
    /// not generally known up front.
    pub(crate) fn put_length_prefixed<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let offset = self.inner.len();
        self.inner.extend_from_slice(&[0; 4]);

        write(self)?;

        let len = (self.inner.len() - offset - 4) as i32;
        self.inner[offset..(offset + 4)].copy_from_slice(&len.to_be_bytes());

        Ok(())
    }

    /// Append the `-1` length marker that stands for a NULL element inside a
    /// binary array.
    pub(crate) fn put_null_element(&mut self) {
        self.inner.extend_from_slice(&(-1_i32).to_be_bytes());
    }
}

impl Deref for PgArgumentBuffer {
    type Target = Vec<u8>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PgArgumentBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
