//! Date functions backed by chrono. Epoch timestamps are interpreted as UTC.

use std::fmt::Write as _;

use chrono::{DateTime, Datelike, NaiveDate};
use indexmap::IndexMap;

use crate::errors::RuntimeError;
use crate::stdlib::{integer_arg, string_arg, Caller, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::{Hashable, Value};

pub(super) fn register(builder: &mut RegistryBuilder) {
    builder.register(
        "to_date_metadata",
        Signature::new(vec![Type::String], ReturnType::Fixed(Type::Map)),
        to_date_metadata,
    );
    builder.register(
        "datetime_strftime",
        Signature::new(
            vec![Type::Integer, Type::String],
            ReturnType::Fixed(Type::String),
        ),
        strftime,
    );
}

fn days_in_month(date: NaiveDate) -> i64 {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
        Some(first_of_next) => first_of_next
            .signed_duration_since(date.with_day(1).unwrap_or(date))
            .num_days(),
        None => 31,
    }
}

fn days_in_year(date: NaiveDate) -> i64 {
    match NaiveDate::from_ymd_opt(date.year(), 12, 31) {
        Some(last) => last.ordinal() as i64,
        None => 365,
    }
}

/// Expand a `YYYYMMDD` date string into its component fields, including the
/// reversed counterparts used for reverse-chronological sort keys.
fn to_date_metadata(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = string_arg(&args[0])?;
    let date = NaiveDate::parse_from_str(text, "%Y%m%d").map_err(|err| RuntimeError::Date {
        message: format!("cannot parse {text:?} as a YYYYMMDD date: {err}"),
    })?;

    let mut out = IndexMap::new();
    let mut put = |key: &str, value: Value| {
        out.insert(Hashable::String(key.to_string()), value);
    };
    put("date", Value::String(text.to_string()));
    put("year", Value::Integer(date.year() as i64));
    put("month", Value::Integer(date.month() as i64));
    put("day", Value::Integer(date.day() as i64));
    put("month_reversed", Value::Integer(13 - date.month() as i64));
    put(
        "day_reversed",
        Value::Integer(days_in_month(date) - date.day() as i64 + 1),
    );
    put("day_of_year", Value::Integer(date.ordinal() as i64));
    put(
        "day_of_year_reversed",
        Value::Integer(days_in_year(date) - date.ordinal() as i64 + 1),
    );
    Ok(Value::Map(out))
}

fn strftime(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let epoch = integer_arg(&args[0])?;
    let format = string_arg(&args[1])?;
    let datetime = DateTime::from_timestamp(epoch, 0).ok_or_else(|| RuntimeError::Date {
        message: format!("epoch timestamp {epoch} is out of range"),
    })?;

    // Formatting is deferred, so invalid specifiers only surface as a write
    // error here.
    let mut out = String::new();
    write!(out, "{}", datetime.format(format)).map_err(|_| RuntimeError::Date {
        message: format!("invalid strftime format {format:?}"),
    })?;
    Ok(Value::String(out))
}

#[cfg(test)]
mod tests {
    use crate::stdlib::test_support::run;
    use crate::values::{Hashable, Value};
    use pretty_assertions::assert_eq;

    fn field(metadata: &Value, key: &str) -> Value {
        match metadata {
            Value::Map(entries) => entries[&Hashable::String(key.to_string())].clone(),
            other => panic!("expected a map, got {other:?}"),
        }
    }

    #[test]
    fn leap_day_metadata() {
        let metadata = run("to_date_metadata", &[Value::String("20240229".into())]).unwrap();
        assert_eq!(field(&metadata, "date"), Value::String("20240229".into()));
        assert_eq!(field(&metadata, "year"), Value::Integer(2024));
        assert_eq!(field(&metadata, "month"), Value::Integer(2));
        assert_eq!(field(&metadata, "day"), Value::Integer(29));
        assert_eq!(field(&metadata, "month_reversed"), Value::Integer(11));
        assert_eq!(field(&metadata, "day_reversed"), Value::Integer(1));
        assert_eq!(field(&metadata, "day_of_year"), Value::Integer(60));
        assert_eq!(field(&metadata, "day_of_year_reversed"), Value::Integer(307));
    }

    #[test]
    fn metadata_keys_are_in_declaration_order() {
        let metadata = run("to_date_metadata", &[Value::String("20231231".into())]).unwrap();
        let Value::Map(entries) = metadata else {
            panic!("expected a map");
        };
        let keys: Vec<String> = entries.keys().map(|key| key.output()).collect();
        assert_eq!(
            keys,
            vec![
                "date",
                "year",
                "month",
                "day",
                "month_reversed",
                "day_reversed",
                "day_of_year",
                "day_of_year_reversed",
            ]
        );
    }

    #[test]
    fn invalid_date_reports_the_input() {
        let err = run("to_date_metadata", &[Value::String("2024-02-29".into())]).unwrap_err();
        assert!(err.to_string().contains("2024-02-29"));
    }

    #[test]
    fn strftime_formats_in_utc() {
        assert_eq!(
            run(
                "datetime_strftime",
                &[
                    Value::Integer(0),
                    Value::String("%Y-%m-%d %H:%M:%S".into())
                ]
            ),
            Ok(Value::String("1970-01-01 00:00:00".into()))
        );
    }
}
