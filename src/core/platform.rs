//! Platform formatting hints
//!
//! A platform carries the textual patterns a backend expects for temporal
//! values. Logical types consult it instead of hardcoding formats, so one
//! converter serves backends with different literal conventions.

/// Formatting hints handed to logical type converters
#[derive(Debug, Clone)]
pub struct Platform {
    time_format: String,
    date_format: String,
    datetime_format: String,
}

impl Platform {
    /// Create a platform with explicit format patterns (chrono strftime syntax)
    pub fn new(
        time_format: impl Into<String>,
        date_format: impl Into<String>,
        datetime_format: impl Into<String>,
    ) -> Self {
        Self {
            time_format: time_format.into(),
            date_format: date_format.into(),
            datetime_format: datetime_format.into(),
        }
    }

    /// Pattern for time-of-day literals
    pub fn time_format(&self) -> &str {
        &self.time_format
    }

    /// Pattern for calendar-date literals
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Pattern for combined date-and-time literals
    pub fn datetime_format(&self) -> &str {
        &self.datetime_format
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new("%H:%M:%S", "%Y-%m-%d", "%Y-%m-%d %H:%M:%S")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        let platform = Platform::default();
        assert_eq!(platform.time_format(), "%H:%M:%S");
        assert_eq!(platform.date_format(), "%Y-%m-%d");
        assert_eq!(platform.datetime_format(), "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn test_custom_patterns() {
        let platform = Platform::new("%H.%M.%S", "%d/%m/%Y", "%d/%m/%Y %H.%M.%S");
        assert_eq!(platform.time_format(), "%H.%M.%S");
    }
}
