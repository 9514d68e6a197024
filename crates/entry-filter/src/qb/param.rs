//! Bind parameters derived from filter values.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

/// A bind parameter holding the JSON value it came from.
///
/// Filter values are untyped JSON, so the Postgres type is whatever the
/// server inferred for the placeholder. The value is converted when it is
/// bound: an `int4` column gets an `i32`, a `timestamptz` column gets a
/// parsed timestamp, a text column gets the string form. `null` binds NULL
/// for any type. A value that does not fit the inferred type fails the query
/// with a conversion error instead of a silent mismatch.
#[derive(Clone, PartialEq)]
pub struct Param {
    json: Value,
}

impl Param {
    pub fn from_json(value: &Value) -> Self {
        Param {
            json: value.clone(),
        }
    }

    /// The source value.
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// The value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        self
    }

    fn text(&self) -> String {
        match &self.json {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn int(&self) -> Result<i64, BoxError> {
        match &self.json {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| format!("{n} is not an integer").into()),
            Value::String(s) => Ok(s.trim().parse()?),
            other => Err(mismatch(other, "an integer")),
        }
    }

    fn float(&self) -> Result<f64, BoxError> {
        match &self.json {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| format!("{n} is not a float").into()),
            Value::String(s) => Ok(s.trim().parse()?),
            other => Err(mismatch(other, "a float")),
        }
    }

    fn decimal(&self) -> Result<Decimal, BoxError> {
        let raw = match &self.json {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            other => return Err(mismatch(other, "a number")),
        };
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(Into::into)
    }

    fn bool(&self) -> Result<bool, BoxError> {
        match &self.json {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(mismatch(&self.json, "a boolean")),
            },
            other => Err(mismatch(other, "a boolean")),
        }
    }

    fn timestamp(&self) -> Result<NaiveDateTime, BoxError> {
        let Value::String(s) = &self.json else {
            return Err(mismatch(&self.json, "a timestamp string"));
        };
        parse_timestamp(s.trim())
    }

    fn timestamptz(&self) -> Result<DateTime<Utc>, BoxError> {
        let Value::String(s) = &self.json else {
            return Err(mismatch(&self.json, "a timestamp string"));
        };
        let s = s.trim();
        match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => Ok(ts.with_timezone(&Utc)),
            // No offset given: read as UTC.
            Err(_) => Ok(parse_timestamp(s)?.and_utc()),
        }
    }

    fn date(&self) -> Result<NaiveDate, BoxError> {
        let Value::String(s) = &self.json else {
            return Err(mismatch(&self.json, "a date string"));
        };
        let s = s.trim();
        match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Ok(date),
            Err(_) => Ok(parse_timestamp(s)?.date()),
        }
    }
}

fn mismatch(value: &Value, expected: &str) -> BoxError {
    format!("cannot bind {value} as {expected}").into()
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ts);
        }
    }
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?.and_time(NaiveTime::MIN))
}

impl ToSql for Param {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if self.json.is_null() {
            return Ok(IsNull::Yes);
        }
        match *ty {
            Type::BOOL => self.bool()?.to_sql(ty, out),
            Type::INT2 => i16::try_from(self.int()?)?.to_sql(ty, out),
            Type::INT4 => i32::try_from(self.int()?)?.to_sql(ty, out),
            Type::INT8 => self.int()?.to_sql(ty, out),
            Type::FLOAT4 => (self.float()? as f32).to_sql(ty, out),
            Type::FLOAT8 => self.float()?.to_sql(ty, out),
            Type::NUMERIC => self.decimal()?.to_sql(ty, out),
            Type::JSON | Type::JSONB => self.json.to_sql(ty, out),
            Type::TIMESTAMP => self.timestamp()?.to_sql(ty, out),
            Type::TIMESTAMPTZ => self.timestamptz()?.to_sql(ty, out),
            Type::DATE => self.date()?.to_sql(ty, out),
            _ => self.text().as_str().to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::JSON
                | Type::JSONB
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
        )
    }

    tokio_postgres::types::to_sql_checked!();
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Param").field(&self.json).finish()
    }
}

/// Ordered parameters; position `i` binds placeholder `$i+1`.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a value and return its 1-based index.
    pub fn push_json(&mut self, value: &Value) -> usize {
        self.params.push(Param::from_json(value));
        self.params.len()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Source values, in placeholder order.
    pub fn values(&self) -> Vec<&Value> {
        self.params.iter().map(Param::json).collect()
    }

    /// All parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
