//! Match conditions: a typed expression tree rendered to parameterized SQL
//!
//! Callers build a [`Condition`] explicitly (or translate one from an
//! untyped constraint mapping with [`Condition::from_map`]) and the store
//! renders it against a column whitelist. A condition referencing a column
//! the schema does not have renders to
//! [`SqliteError::UnrecognizedColumn`] instead of reaching SQLite.

use std::collections::BTreeMap;

use rusqlite::types::ToSqlOutput;
use rusqlite::ToSql;

use crate::error::{SqliteError, SqliteResult};

/// A scalar parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Text(s) => s.to_sql(),
            Value::Integer(i) => i.to_sql(),
            Value::Real(r) => r.to_sql(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl Value {
    /// Convert a scalar JSON value. Non-scalar values have no SQL parameter
    /// representation.
    fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Integer(*b as i64)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Integer(i))
                } else {
                    n.as_f64().map(Value::Real)
                }
            }
            _ => None,
        }
    }
}

/// A match condition over store columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column equals value
    Eq(String, Value),
    /// Column greater than or equal to value
    Ge(String, Value),
    /// Column is one of the values; an empty list matches nothing
    In(String, Vec<Value>),
    /// Column matches a SQL LIKE pattern
    Like(String, String),
    /// Every sub-condition holds; the empty conjunction always holds
    And(Vec<Condition>),
    /// Some sub-condition holds; the empty disjunction never holds
    Or(Vec<Condition>),
}

/// The reserved grouping key combining sub-mappings with OR.
const OR_KEY: &str = "$or";

impl Condition {
    /// Translate an untyped constraint mapping into a condition tree.
    ///
    /// Top-level keys combine with AND. A scalar value means equality, a list
    /// means membership, and an object holds a structured comparison
    /// (`{"$ge": v}` or `{"$in": [..]}`). The reserved `$or` key takes a list
    /// of sub-mappings combined with OR. Values with no scalar representation
    /// are mapped onto an impossible condition rather than rejected; the
    /// schema whitelist is what decides whether a *column* is acceptable.
    pub fn from_map(map: &BTreeMap<String, serde_json::Value>) -> Condition {
        let mut clauses = Vec::new();
        for (key, value) in map {
            if key == OR_KEY {
                let arms = value
                    .as_array()
                    .map(|sub_maps| {
                        sub_maps
                            .iter()
                            .filter_map(|sub| sub.as_object())
                            .map(|sub| {
                                Condition::from_map(
                                    &sub.iter()
                                        .map(|(k, v)| (k.clone(), v.clone()))
                                        .collect(),
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                clauses.push(Condition::Or(arms));
                continue;
            }
            clauses.push(Condition::from_entry(key, value));
        }
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Condition::And(clauses)
        }
    }

    fn from_entry(column: &str, value: &serde_json::Value) -> Condition {
        match value {
            serde_json::Value::Array(values) => Condition::In(
                column.to_string(),
                values.iter().filter_map(Value::from_json).collect(),
            ),
            serde_json::Value::Object(cmp) => {
                if let Some(bound) = cmp.get("$ge").and_then(Value::from_json) {
                    Condition::Ge(column.to_string(), bound)
                } else if let Some(serde_json::Value::Array(values)) = cmp.get("$in") {
                    Condition::In(
                        column.to_string(),
                        values.iter().filter_map(Value::from_json).collect(),
                    )
                } else {
                    // unknown comparison operator: matches nothing
                    Condition::Or(vec![])
                }
            }
            scalar => match Value::from_json(scalar) {
                Some(value) => Condition::Eq(column.to_string(), value),
                None => Condition::Or(vec![]),
            },
        }
    }

    /// Render to a SQL predicate and its ordered parameter list, validating
    /// every referenced column against `allowed`.
    pub fn to_sql(&self, allowed: &[&str]) -> SqliteResult<(String, Vec<Value>)> {
        let mut params = Vec::new();
        let sql = self.render(allowed, &mut params)?;
        Ok((sql, params))
    }

    fn render(&self, allowed: &[&str], params: &mut Vec<Value>) -> SqliteResult<String> {
        match self {
            Condition::Eq(column, value) => {
                check_column(column, allowed)?;
                params.push(value.clone());
                Ok(format!("{} == ?", column))
            }
            Condition::Ge(column, value) => {
                check_column(column, allowed)?;
                params.push(value.clone());
                Ok(format!("{} >= ?", column))
            }
            Condition::In(column, values) => {
                check_column(column, allowed)?;
                if values.is_empty() {
                    return Ok("1 = 0".to_string());
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                params.extend(values.iter().cloned());
                Ok(format!("{} in ({})", column, placeholders))
            }
            Condition::Like(column, pattern) => {
                check_column(column, allowed)?;
                params.push(Value::Text(pattern.clone()));
                Ok(format!("{} LIKE ?", column))
            }
            Condition::And(clauses) => {
                if clauses.is_empty() {
                    return Ok("1 = 1".to_string());
                }
                Self::render_grouped(clauses, " AND ", allowed, params)
            }
            Condition::Or(clauses) => {
                if clauses.is_empty() {
                    return Ok("1 = 0".to_string());
                }
                Self::render_grouped(clauses, " OR ", allowed, params)
            }
        }
    }

    fn render_grouped(
        clauses: &[Condition],
        separator: &str,
        allowed: &[&str],
        params: &mut Vec<Value>,
    ) -> SqliteResult<String> {
        let rendered = clauses
            .iter()
            .map(|clause| Ok(format!("({})", clause.render(allowed, params)?)))
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rendered.join(separator))
    }
}

fn check_column(column: &str, allowed: &[&str]) -> SqliteResult<()> {
    if allowed.contains(&column) {
        Ok(())
    } else {
        Err(SqliteError::UnrecognizedColumn(column.to_string()))
    }
}
