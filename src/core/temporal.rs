//! Temporal logical types
//!
//! Time-of-day, calendar-date and combined date-time converters. Textual
//! representations follow the patterns registered on the [`Platform`].
//!
//! A time-only literal carries no date, so conversion back to the domain
//! anchors it to 1970-01-01. The anchor is fixed rather than "today" to keep
//! round trips stable: converting a value to the backend and back yields an
//! equal time component regardless of when the conversion runs.

use super::error::{Error, Result};
use super::platform::Platform;
use super::types::LogicalType;
use super::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Time-of-day type, stored as text under the platform time pattern
#[derive(Debug)]
pub struct TimeType;

impl LogicalType for TimeType {
    fn name(&self) -> &str {
        "time"
    }

    fn to_database_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            // Text that already matches the backend shape passes through
            // unchanged. This is an identity contract, not an optimization:
            // callers re-pass already-converted values.
            Value::Text(s) if NaiveTime::parse_from_str(s, platform.time_format()).is_ok() => {
                Ok(value.clone())
            }
            Value::DateTime(dt) => Ok(Value::Text(dt.format(platform.time_format()).to_string())),
            other => Err(Error::conversion(other, self.name())),
        }
    }

    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::DateTime(_) => Ok(value.clone()),
            Value::Text(s) => NaiveTime::parse_from_str(s, platform.time_format())
                // NaiveDate::default is the 1970-01-01 anchor.
                .map(|time| Value::DateTime(NaiveDateTime::new(NaiveDate::default(), time)))
                .map_err(|_| Error::conversion(value, self.name())),
            other => Err(Error::conversion(other, self.name())),
        }
    }
}

/// Calendar-date type, stored as text under the platform date pattern
///
/// The time component of converted values is anchored to midnight.
#[derive(Debug)]
pub struct DateType;

impl LogicalType for DateType {
    fn name(&self) -> &str {
        "date"
    }

    fn to_database_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(s) if NaiveDate::parse_from_str(s, platform.date_format()).is_ok() => {
                Ok(value.clone())
            }
            Value::DateTime(dt) => Ok(Value::Text(dt.format(platform.date_format()).to_string())),
            other => Err(Error::conversion(other, self.name())),
        }
    }

    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::DateTime(_) => Ok(value.clone()),
            Value::Text(s) => NaiveDate::parse_from_str(s, platform.date_format())
                .map(|date| Value::DateTime(date.and_time(NaiveTime::default())))
                .map_err(|_| Error::conversion(value, self.name())),
            other => Err(Error::conversion(other, self.name())),
        }
    }
}

/// Combined date-and-time type
#[derive(Debug)]
pub struct DateTimeType;

impl LogicalType for DateTimeType {
    fn name(&self) -> &str {
        "datetime"
    }

    fn to_database_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(s)
                if NaiveDateTime::parse_from_str(s, platform.datetime_format()).is_ok() =>
            {
                Ok(value.clone())
            }
            Value::DateTime(dt) => {
                Ok(Value::Text(dt.format(platform.datetime_format()).to_string()))
            }
            other => Err(Error::conversion(other, self.name())),
        }
    }

    fn to_domain_value(&self, value: &Value, platform: &Platform) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::DateTime(_) => Ok(value.clone()),
            Value::Text(s) => NaiveDateTime::parse_from_str(s, platform.datetime_format())
                .map(Value::DateTime)
                .map_err(|_| Error::conversion(value, self.name())),
            other => Err(Error::conversion(other, self.name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn platform() -> Platform {
        Platform::default()
    }

    #[test]
    fn test_time_converts_datetime_to_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(5, 30, 55).unwrap());
        let out = TimeType
            .to_database_value(&Value::DateTime(dt), &platform())
            .unwrap();
        assert_eq!(out, Value::Text("05:30:55".to_string()));
    }

    #[test]
    fn test_time_text_passthrough() {
        let text = Value::Text("05:30:55".to_string());
        let out = TimeType.to_database_value(&text, &platform()).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_time_null_identity_both_directions() {
        assert_eq!(
            TimeType
                .to_database_value(&Value::Null, &platform())
                .unwrap(),
            Value::Null
        );
        assert_eq!(
            TimeType.to_domain_value(&Value::Null, &platform()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_time_invalid_database_inputs() {
        let invalid = [
            Value::Int(0),
            Value::Text(String::new()),
            Value::Text("foo".to_string()),
            Value::Text("10:11".to_string()),
            Value::Text("10:11:12:13".to_string()),
            Value::Bytes(vec![]),
            Value::Bytes(b"an array".to_vec()),
            Value::Int(27),
            Value::Int(-1),
            Value::Double(1.2),
            Value::Bool(true),
            Value::Long(-100),
        ];
        for value in invalid {
            let err = TimeType
                .to_database_value(&value, &platform())
                .expect_err(&format!("expected failure for {value:?}"));
            assert!(matches!(err, Error::Conversion { .. }));
        }
    }

    #[test]
    fn test_time_anchors_date_to_epoch() {
        let out = TimeType
            .to_domain_value(&Value::Text("01:23:34".to_string()), &platform())
            .unwrap();
        let dt = out.as_datetime().unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "01:23:34");
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "1970-01-01");
    }

    #[test]
    fn test_time_round_trip() {
        let domain = TimeType
            .to_domain_value(&Value::Text("23:59:59".to_string()), &platform())
            .unwrap();
        let backend = TimeType.to_database_value(&domain, &platform()).unwrap();
        assert_eq!(backend, Value::Text("23:59:59".to_string()));
    }

    #[test]
    fn test_time_datetime_passes_through_to_domain() {
        let dt = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        let value = Value::DateTime(dt);
        let out = TimeType.to_domain_value(&value, &platform()).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn test_time_unparseable_text_to_domain() {
        let err = TimeType
            .to_domain_value(&Value::Text("abcdefg".to_string()), &platform())
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn test_date_anchors_time_to_midnight() {
        let out = DateType
            .to_domain_value(&Value::Text("2024-02-29".to_string()), &platform())
            .unwrap();
        let dt = out.as_datetime().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-02-29 00:00:00");
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_date_rejects_time_text() {
        let err = DateType
            .to_database_value(&Value::Text("10:11:12".to_string()), &platform())
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
    }

    #[test]
    fn test_datetime_round_trip() {
        let text = Value::Text("2024-06-01 05:30:55".to_string());
        let domain = DateTimeType.to_domain_value(&text, &platform()).unwrap();
        let backend = DateTimeType
            .to_database_value(&domain, &platform())
            .unwrap();
        assert_eq!(backend, text);
    }
}
