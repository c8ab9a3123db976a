#[derive(Debug)]
pub enum PrepError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    JsonError(serde_json::Error),
    InvalidConfiguration(String),
    /// A cost triple whose range collapses, so no finite beta shape fits it.
    DegenerateRange {
        year: u32,
        min: f64,
        mean: f64,
        max: f64,
    },
    LookupFailure(String),
    ZeroDiscountRate,
    ZeroCapacityGroup(String),
    DuplicateLabel(String),
}

pub type PrepResult<T> = Result<T, PrepError>;

impl From<std::io::Error> for PrepError {
    fn from(err: std::io::Error) -> Self {
        PrepError::IoError(err)
    }
}

impl From<csv::Error> for PrepError {
    fn from(err: csv::Error) -> Self {
        PrepError::CsvError(err)
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        PrepError::JsonError(err)
    }
}

impl std::fmt::Display for PrepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrepError::IoError(e) => write!(f, "IO error: {}", e),
            PrepError::CsvError(e) => write!(f, "CSV error: {}", e),
            PrepError::JsonError(e) => write!(f, "JSON error: {}", e),
            PrepError::InvalidConfiguration(s) => write!(f, "Invalid configuration: {}", s),
            PrepError::DegenerateRange { year, min, mean, max } => write!(
                f,
                "Degenerate cost range in {}: min={}, mean={}, max={}",
                year, min, mean, max
            ),
            PrepError::LookupFailure(s) => write!(f, "Lookup failed: {}", s),
            PrepError::ZeroDiscountRate => write!(f, "Annuity factor undefined for a discount rate of zero"),
            PrepError::ZeroCapacityGroup(s) => write!(f, "Group has zero total capacity: {}", s),
            PrepError::DuplicateLabel(s) => write!(f, "Duplicate record label: {}", s),
        }
    }
}

impl std::error::Error for PrepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrepError::IoError(e) => Some(e),
            PrepError::CsvError(e) => Some(e),
            PrepError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_offending_key() {
        let err = PrepError::LookupFailure("column 'capacity' in row 'pp_1'".to_string());
        assert_eq!(err.to_string(), "Lookup failed: column 'capacity' in row 'pp_1'");

        let err = PrepError::DegenerateRange { year: 2025, min: 40.0, mean: 40.0, max: 40.0 };
        assert!(err.to_string().contains("2025"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: PrepError = io.into();
        assert!(matches!(err, PrepError::IoError(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
