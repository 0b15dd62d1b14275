use std::borrow::Cow;

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// The client character encoding of a connection, mirroring the server's
/// `client_encoding` parameter.
///
/// `SQL_ASCII` is not a real character set: the server performs no
/// conversion for it, so labels pass through as raw bytes in both
/// directions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PgClientEncoding {
    Charset(&'static Encoding),
    SqlAscii,
}

impl PgClientEncoding {
    /// Resolve a PostgreSQL encoding name (`UTF8`, `LATIN1`, `WIN1252`,
    /// `SQL_ASCII`, ...) to a client encoding.
    ///
    /// Matching is case-insensitive and ignores `-` and `_`, the same
    /// liberties the server takes with the parameter value.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let label = match normalized.as_str() {
            "sqlascii" => return Some(PgClientEncoding::SqlAscii),

            "utf8" | "unicode" => "utf-8",
            "latin1" | "iso88591" => "iso-8859-1",
            "latin2" | "iso88592" => "iso-8859-2",
            "latin3" | "iso88593" => "iso-8859-3",
            "latin4" | "iso88594" => "iso-8859-4",
            "latin5" | "iso88599" => "iso-8859-9",
            "iso88595" => "iso-8859-5",
            "iso88596" => "iso-8859-6",
            "iso88597" => "iso-8859-7",
            "iso88598" => "iso-8859-8",
            "win1250" => "windows-1250",
            "win1251" => "windows-1251",
            "win1252" => "windows-1252",
            "win1253" => "windows-1253",
            "win1254" => "windows-1254",
            "win1255" => "windows-1255",
            "win1256" => "windows-1256",
            "win1257" => "windows-1257",
            "win1258" => "windows-1258",
            "win866" => "ibm866",
            "koi8r" | "koi8" => "koi8-r",
            "koi8u" => "koi8-u",
            "eucjp" => "euc-jp",
            "euckr" => "euc-kr",
            "gbk" => "gbk",
            "gb18030" => "gb18030",
            "big5" => "big5",
            "sjis" | "shiftjis" => "shift_jis",

            _ => return None,
        };

        Encoding::for_label(label.as_bytes()).map(PgClientEncoding::Charset)
    }

    /// Encode a label for the wire.
    ///
    /// Under `SQL_ASCII` the label's UTF-8 bytes pass through unchanged; the
    /// server will not inspect them. Under a real charset, a character with
    /// no representation is an encode error rather than a replacement
    /// character on the server.
    pub fn encode_label<'a>(&self, label: &'a str) -> Result<Cow<'a, [u8]>> {
        match self {
            PgClientEncoding::SqlAscii => Ok(Cow::Borrowed(label.as_bytes())),

            PgClientEncoding::Charset(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(label);

                if had_errors {
                    return Err(Error::encode(format!(
                        "label {:?} cannot be represented in client encoding {}",
                        label,
                        encoding.name()
                    )));
                }

                Ok(bytes)
            }
        }
    }

    /// Decode label bytes from the wire.
    ///
    /// Returns `None` under `SQL_ASCII`: there is no charset to decode with,
    /// and callers are expected to hand the raw bytes on.
    pub fn decode_label<'a>(&self, raw: &'a [u8]) -> Result<Option<Cow<'a, str>>> {
        match self {
            PgClientEncoding::SqlAscii => Ok(None),

            PgClientEncoding::Charset(encoding) => {
                let (text, had_errors) = encoding.decode_without_bom_handling(raw);

                if had_errors {
                    return Err(Error::decode(format!(
                        "malformed {} bytes in label: {:?}",
                        encoding.name(),
                        raw
                    )));
                }

                Ok(Some(text))
            }
        }
    }
}

impl Default for PgClientEncoding {
    fn default() -> Self {
        PgClientEncoding::Charset(encoding_rs::UTF_8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_resolves_postgres_names() {
        assert_eq!(
            PgClientEncoding::from_name("UTF8"),
            Some(PgClientEncoding::Charset(encoding_rs::UTF_8))
        );
        assert_eq!(
            PgClientEncoding::from_name("utf-8"),
            Some(PgClientEncoding::Charset(encoding_rs::UTF_8))
        );
        // encoding_rs resolves the iso-8859-1 label to windows-1252, a
        // superset; round trips below pin the actual byte behavior
        assert_eq!(
            PgClientEncoding::from_name("LATIN1"),
            Some(PgClientEncoding::Charset(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(
            PgClientEncoding::from_name("WIN1252"),
            Some(PgClientEncoding::Charset(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(
            PgClientEncoding::from_name("SQL_ASCII"),
            Some(PgClientEncoding::SqlAscii)
        );
        assert_eq!(PgClientEncoding::from_name("klingon"), None);
    }

    #[test]
    fn it_round_trips_utf8() {
        let enc = PgClientEncoding::from_name("utf8").unwrap();

        let bytes = enc.encode_label("Xà").unwrap();
        assert_eq!(&*bytes, "Xà".as_bytes());

        let text = enc.decode_label(&bytes).unwrap().unwrap();
        assert_eq!(text, "Xà");
    }

    #[test]
    fn it_round_trips_latin1() {
        let enc = PgClientEncoding::from_name("latin1").unwrap();

        let bytes = enc.encode_label("Xà").unwrap();
        assert_eq!(&*bytes, &[b'X', 0xE0]);

        let text = enc.decode_label(&bytes).unwrap().unwrap();
        assert_eq!(text, "Xà");
    }

    #[test]
    fn it_rejects_unmappable_characters() {
        let enc = PgClientEncoding::from_name("latin1").unwrap();

        assert!(matches!(enc.encode_label("日本語"), Err(Error::Encode(_))));
    }

    #[test]
    fn sql_ascii_passes_bytes_through() {
        let enc = PgClientEncoding::from_name("sql_ascii").unwrap();

        let bytes = enc.encode_label("FOO").unwrap();
        assert_eq!(&*bytes, b"FOO");

        assert!(enc.decode_label(b"FOO").unwrap().is_none());
    }
}
