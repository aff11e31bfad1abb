//! Turning driver rows into gateway results.

use crate::TableDescriptor;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, Type};
use tracing::{debug, warn};

/// Version byte the server prefixes to binary jsonb values.
const JSONB_FORMAT_VERSION: u8 = 1;

/// A json or jsonb cell kept as the text the server produced.
///
/// Numbers keep every digit and object keys keep the server's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonText(String);

impl JsonText {
    pub fn into_string(self) -> String {
        self.0
    }
}

impl<'a> FromSql<'a> for JsonText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let text = if *ty == Type::JSONB {
            match raw.split_first() {
                Some((&JSONB_FORMAT_VERSION, rest)) => rest,
                Some((version, _)) => {
                    return Err(format!("unsupported jsonb format version {version}").into())
                }
                None => return Err("empty jsonb value".into()),
            }
        } else {
            raw
        };
        Ok(Self(std::str::from_utf8(text)?.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::JSON || *ty == Type::JSONB
    }
}

/// Collect one JSON fragment per readable, non-NULL cell, in row order.
pub(crate) fn json_fragments<I, E>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = Result<Option<JsonText>, E>>,
    E: fmt::Display,
{
    let mut fragments = Vec::new();
    for (index, cell) in cells.into_iter().enumerate() {
        match cell {
            Ok(Some(text)) => fragments.push(text.into_string()),
            Ok(None) => debug!(index, "skipping NULL row"),
            Err(e) => warn!(index, error = %e, "skipping unreadable row"),
        }
    }
    fragments
}

/// Keep only tables in the default schema, preserving catalog order.
pub(crate) fn default_schema_tables(tables: Vec<TableDescriptor>) -> Vec<TableDescriptor> {
    let total = tables.len();
    let kept: Vec<_> = tables
        .into_iter()
        .filter(TableDescriptor::is_default_schema)
        .collect();
    debug!(total, public = kept.len(), "filtered tables to default schema");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    type Cell = Result<Option<JsonText>, Box<dyn Error + Sync + Send>>;

    fn jsonb(text: &str) -> Vec<u8> {
        let mut raw = vec![JSONB_FORMAT_VERSION];
        raw.extend_from_slice(text.as_bytes());
        raw
    }

    fn jsonb_cell(raw: Option<&[u8]>) -> Cell {
        <Option<JsonText> as FromSql>::from_sql_nullable(&Type::JSONB, raw)
    }

    fn table(schema: &str, name: &str) -> TableDescriptor {
        TableDescriptor {
            schema_name: schema.to_string(),
            table_name: name.to_string(),
        }
    }

    #[test]
    fn test_jsonb_numbers_keep_their_digits() {
        let text = r#"{"price": 12345678901234567890.123456789, "rate": 1.10, "id": 123456789012345678901234}"#;

        let decoded = JsonText::from_sql(&Type::JSONB, &jsonb(text)).unwrap();

        assert_eq!(decoded.into_string(), text);
    }

    #[test]
    fn test_json_text_is_taken_verbatim() {
        let text = r#"{"b": 1, "a": 2}"#;
        let decoded = JsonText::from_sql(&Type::JSON, text.as_bytes()).unwrap();
        assert_eq!(decoded.into_string(), text);
    }

    #[test]
    fn test_jsonb_rejects_unknown_version_and_bad_utf8() {
        assert!(JsonText::from_sql(&Type::JSONB, b"\x02{}").is_err());
        assert!(JsonText::from_sql(&Type::JSONB, b"").is_err());
        assert!(JsonText::from_sql(&Type::JSONB, b"\x01\"\xff\"").is_err());
    }

    #[test]
    fn test_accepts_only_json_types() {
        assert!(<JsonText as FromSql>::accepts(&Type::JSONB));
        assert!(<JsonText as FromSql>::accepts(&Type::JSON));
        assert!(!<JsonText as FromSql>::accepts(&Type::TEXT));
    }

    #[test]
    fn test_fragments_skip_null_and_unreadable_rows() {
        let first = jsonb(r#"{"id": 1}"#);
        let third = jsonb(r#"{"id": 3}"#);
        let cells = vec![
            jsonb_cell(Some(first.as_slice())),
            jsonb_cell(None),
            jsonb_cell(Some(&b"\x01\xff"[..])),
            jsonb_cell(Some(third.as_slice())),
        ];

        assert_eq!(
            json_fragments(cells),
            vec![r#"{"id": 1}"#.to_string(), r#"{"id": 3}"#.to_string()]
        );
    }

    #[test]
    fn test_fragments_of_no_rows() {
        assert!(json_fragments(Vec::<Cell>::new()).is_empty());
    }

    #[test]
    fn test_default_schema_tables_drop_other_schemas_in_order() {
        let tables = vec![
            table("public", "users"),
            table("pg_catalog", "pg_class"),
            table("public", "accounts"),
            table("information_schema", "sql_features"),
            table("audit", "events"),
            table("public", "orders"),
        ];

        let names: Vec<_> = default_schema_tables(tables)
            .into_iter()
            .map(|t| t.table_name)
            .collect();

        assert_eq!(names, vec!["users", "accounts", "orders"]);
    }
}
