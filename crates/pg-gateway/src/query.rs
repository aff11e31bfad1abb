//! JSON query compilation.
//!
//! Table names, field names and the WHERE clause are spliced into the SQL
//! text as given. Nothing is quoted or escaped.

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// Caller description of which rows to fetch as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub table_name: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl QuerySpec {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_where(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.table_name.trim().is_empty() {
            return Err(ValidationError::missing("tableName"));
        }
        Ok(())
    }
}

/// Build the single SQL statement for `spec`.
///
/// - no fields: `SELECT to_jsonb(T) FROM T` (one object per row)
/// - fields: `SELECT jsonb_agg(jsonb_build_object('f', f, ...)) FROM T`
///   (one array for all rows)
///
/// followed by ` WHERE <clause>` when the clause is non-empty and
/// ` LIMIT <n>` when the limit is positive, in that order.
pub fn compile_query(spec: &QuerySpec) -> String {
    let table = spec.table_name.as_str();

    let mut query = if spec.fields.is_empty() {
        format!("SELECT to_jsonb({table}) FROM {table}")
    } else {
        let pairs = spec
            .fields
            .iter()
            .map(|field| format!("'{field}', {field}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT jsonb_agg(jsonb_build_object({pairs})) FROM {table}")
    };

    if let Some(clause) = spec.where_clause.as_deref().filter(|c| !c.is_empty()) {
        query.push_str(" WHERE ");
        query.push_str(clause);
    }

    if let Some(limit) = spec.limit.filter(|l| *l > 0) {
        query.push_str(&format!(" LIMIT {limit}"));
    }

    query
}
