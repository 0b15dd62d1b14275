use std::borrow::Cow;

use bytes::Buf;

use crate::arguments::PgArgumentBuffer;
use crate::error::Result;
use crate::type_info::Oid;

// https://github.com/postgres/postgres/blob/a995b371ae29de2d38c4b7881cf414b1560e9746/src/backend/utils/adt/arrayfuncs.c#L1548

/// Write the binary wire image of a one-dimensional array whose element
/// images are already encoded.
pub(crate) fn write_binary_array(
    buf: &mut PgArgumentBuffer,
    element_oid: Oid,
    elements: &[Option<Cow<'_, [u8]>>],
) -> Result<()> {
    buf.extend_from_slice(&1_i32.to_be_bytes()); // number of dimensions
    buf.extend_from_slice(&0_i32.to_be_bytes()); // flags
    buf.extend_from_slice(&element_oid.to_u32().to_be_bytes());
    buf.extend_from_slice(&(elements.len() as i32).to_be_bytes()); // len
    buf.extend_from_slice(&1_i32.to_be_bytes()); // lower bound

    for element in elements {
        match element {
            Some(image) => buf.put_length_prefixed(|buf| {
                buf.extend_from_slice(image);
                Ok(())
            })?,

            None => buf.put_null_element(),
        }
    }

    Ok(())
}

/// Parse the binary wire image of an array into its raw element images.
///
/// Only one-dimensional arrays with a lower bound of one are supported,
/// which is everything the server produces for a plain array value.
pub(crate) fn parse_binary_array(raw: &[u8], expected_oid: Oid) -> Result<Vec<Option<Vec<u8>>>> {
    let mut buf = raw;

    let ndim = get_i32(&mut buf)?;

    if ndim == 0 {
        // zero dimensions is an empty array
        return Ok(Vec::new());
    }

    if ndim != 1 {
        return Err(err_protocol!(
            "encountered an array of {} dimensions; only one-dimensional arrays are supported",
            ndim
        ));
    }

    // historically communicated potential NULLs; never load-bearing
    let _flags = get_i32(&mut buf)?;

    let element_oid = Oid(get_i32(&mut buf)? as u32);

    if element_oid != expected_oid {
        return Err(err_protocol!(
            "array element type oid {} does not match the registered element type oid {}",
            element_oid,
            expected_oid
        ));
    }

    let len = get_i32(&mut buf)?;
    let lower = get_i32(&mut buf)?;

    if lower != 1 {
        return Err(err_protocol!(
            "encountered an array with a lower bound of {} in the first dimension; \
             only arrays starting at one are supported",
            lower
        ));
    }

    let mut elements = Vec::with_capacity(len.max(0) as usize);

    for _ in 0..len {
        let element_len = get_i32(&mut buf)?;

        if element_len < 0 {
            elements.push(None);
            continue;
        }

        let element_len = element_len as usize;

        if buf.remaining() < element_len {
            return Err(err_protocol!("array element image is truncated"));
        }

        elements.push(Some(buf[..element_len].to_vec()));
        buf.advance(element_len);
    }

    Ok(elements)
}

fn get_i32(buf: &mut &[u8]) -> Result<i32> {
    if buf.remaining() < 4 {
        return Err(err_protocol!("array wire image is truncated"));
    }

    Ok(buf.get_i32())
}

// https://github.com/postgres/postgres/blob/a995b371ae29de2d38c4b7881cf414b1560e9746/src/backend/utils/adt/arrayfuncs.c#L718

/// Write the text literal of a one-dimensional array (`{a,"b c",NULL}`).
pub(crate) fn write_text_array(
    buf: &mut PgArgumentBuffer,
    elements: &[Option<Cow<'_, [u8]>>],
) -> Result<()> {
    buf.extend_from_slice(b"{");

    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            buf.extend_from_slice(b",");
        }

        match element {
            Some(image) if needs_quotes(image) => {
                buf.extend_from_slice(b"\"");

                for &byte in image.iter() {
                    if byte == b'"' || byte == b'\\' {
                        buf.extend_from_slice(b"\\");
                    }

                    buf.extend_from_slice(&[byte]);
                }

                buf.extend_from_slice(b"\"");
            }

            Some(image) => buf.extend_from_slice(image),

            None => buf.extend_from_slice(b"NULL"),
        }
    }

    buf.extend_from_slice(b"}");

    Ok(())
}

fn needs_quotes(image: &[u8]) -> bool {
    image.is_empty()
        || image.eq_ignore_ascii_case(b"null")
        || image
            .iter()
            .any(|b| matches!(b, b'{' | b'}' | b',' | b'"' | b'\\') || b.is_ascii_whitespace())
}

/// Parse the text literal of a one-dimensional array into its raw element
/// images. A bare `NULL` is SQL NULL; a quoted `"NULL"` is the string.
pub(crate) fn parse_text_array(raw: &[u8]) -> Result<Vec<Option<Vec<u8>>>> {
    let inner = raw
        .strip_prefix(b"{")
        .and_then(|s| s.strip_suffix(b"}"))
        .ok_or_else(|| err_protocol!("array literal is not wrapped in braces"))?;

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let mut elements = Vec::new();
    let mut value = Vec::new();
    let mut was_quoted = false;
    let mut in_quotes = false;
    let mut in_escape = false;

    for &byte in inner {
        if in_escape {
            value.push(byte);
            in_escape = false;
            continue;
        }

        match byte {
            b'"' => {
                in_quotes = !in_quotes;
                was_quoted = true;
            }

            b'\\' => {
                in_escape = true;
            }

            b',' if !in_quotes => {
                elements.push(finish_element(&mut value, &mut was_quoted));
            }

            _ => {
                value.push(byte);
            }
        }
    }

    if in_quotes || in_escape {
        return Err(err_protocol!("array literal ends inside a quoted element"));
    }

    elements.push(finish_element(&mut value, &mut was_quoted));

    Ok(elements)
}

fn finish_element(value: &mut Vec<u8>, was_quoted: &mut bool) -> Option<Vec<u8>> {
    let element = if !*was_quoted && value.as_slice() == b"NULL" {
        None
    } else {
        Some(value.clone())
    };

    value.clear();
    *was_quoted = false;

    element
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images<'a>(elements: &[Option<&'a [u8]>]) -> Vec<Option<Cow<'a, [u8]>>> {
        elements.iter().map(|e| e.map(Cow::Borrowed)).collect()
    }

    #[test]
    fn it_writes_text_literals() {
        let mut buf = PgArgumentBuffer::new();

        write_text_array(
            &mut buf,
            &images(&[
                Some(b"sad"),
                Some(b"foo,bar"),
                Some(b""),
                Some(b"NULL"),
                None,
                Some(b"say \"hi\""),
            ]),
        )
        .unwrap();

        assert_eq!(
            &buf[..],
            br#"{sad,"foo,bar","","NULL",NULL,"say \"hi\""}"#
        );
    }

    #[test]
    fn it_parses_text_literals() {
        let elements = parse_text_array(br#"{sad,"foo,bar","","NULL",NULL,"say \"hi\""}"#).unwrap();

        assert_eq!(
            elements,
            vec![
                Some(b"sad".to_vec()),
                Some(b"foo,bar".to_vec()),
                Some(Vec::new()),
                Some(b"NULL".to_vec()),
                None,
                Some(b"say \"hi\"".to_vec()),
            ]
        );
    }

    #[test]
    fn it_parses_empty_literals() {
        assert_eq!(parse_text_array(b"{}").unwrap(), Vec::new());
    }

    #[test]
    fn it_rejects_malformed_literals() {
        assert!(parse_text_array(b"sad,ok").is_err());
        assert!(parse_text_array(br#"{"unterminated}"#).is_err());
    }

    #[test]
    fn it_writes_binary_images() {
        let mut buf = PgArgumentBuffer::new();

        write_binary_array(
            &mut buf,
            Oid(16385),
            &images(&[Some(b"ok"), None, Some(b"happy")]),
        )
        .unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&1_i32.to_be_bytes());
        expected.extend_from_slice(&0_i32.to_be_bytes());
        expected.extend_from_slice(&16385_u32.to_be_bytes());
        expected.extend_from_slice(&3_i32.to_be_bytes());
        expected.extend_from_slice(&1_i32.to_be_bytes());
        expected.extend_from_slice(&2_i32.to_be_bytes());
        expected.extend_from_slice(b"ok");
        expected.extend_from_slice(&(-1_i32).to_be_bytes());
        expected.extend_from_slice(&5_i32.to_be_bytes());
        expected.extend_from_slice(b"happy");

        assert_eq!(&buf[..], &expected[..]);
    }

    #[test]
    fn it_parses_binary_images() {
        let mut buf = PgArgumentBuffer::new();

        write_binary_array(
            &mut buf,
            Oid(16385),
            &images(&[Some(b"ok"), None, Some(b"happy")]),
        )
        .unwrap();

        let elements = parse_binary_array(&buf, Oid(16385)).unwrap();

        assert_eq!(
            elements,
            vec![Some(b"ok".to_vec()), None, Some(b"happy".to_vec())]
        );
    }

    #[test]
    fn zero_dimensions_is_an_empty_array() {
        let raw = 0_i32.to_be_bytes();

        assert_eq!(parse_binary_array(&raw, Oid(16385)).unwrap(), Vec::new());
    }

    #[test]
    fn it_rejects_multidimensional_images() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&2_i32.to_be_bytes());
        raw.extend_from_slice(&[0; 16]);

        assert!(parse_binary_array(&raw, Oid(16385)).is_err());
    }

    #[test]
    fn it_rejects_element_oid_mismatches() {
        let mut buf = PgArgumentBuffer::new();

        write_binary_array(&mut buf, Oid(16385), &images(&[Some(b"ok")])).unwrap();

        assert!(parse_binary_array(&buf, Oid(999)).is_err());
    }

    #[test]
    fn it_rejects_truncated_images() {
        let mut buf = PgArgumentBuffer::new();

        write_binary_array(&mut buf, Oid(16385), &images(&[Some(b"happy")])).unwrap();

        assert!(parse_binary_array(&buf[..buf.len() - 2], Oid(16385)).is_err());
    }
}
