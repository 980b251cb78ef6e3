use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Lookup \"{lookup}\" is not supported for {field}")]
    UnsupportedLookup { param: String, field: String, lookup: String },

    #[error("{message}")]
    InvalidValue { param: String, message: String },
}

impl FilterError {
    pub fn invalid_value(param: &str, message: impl Into<String>) -> Self {
        FilterError::InvalidValue {
            param: param.to_string(),
            message: message.into(),
        }
    }

    /// The query parameter the error refers to.
    pub fn param(&self) -> &str {
        match self {
            FilterError::UnsupportedLookup { param, .. } => param,
            FilterError::InvalidValue { param, .. } => param,
        }
    }
}
