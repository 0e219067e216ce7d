use thiserror::Error;

/// Offer contract violations. These are hard errors: they mean the extraction
/// collaborator broke its contract, and they propagate instead of degrading.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("offer contract violation: required field `{field}` is missing or blank")]
    MissingRequiredField { field: &'static str },
    #[error("offer contract violation: `{field}` must be non-negative")]
    NegativeNumeric { field: &'static str },
    #[error("offer contract violation: `min_quantity` must be positive when present")]
    NonPositiveQuantity,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn contract_violation_maps_to_bad_request() {
        let interface =
            ApplicationError::from(DomainError::MissingRequiredField { field: "supplier" })
                .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, .. } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn integration_failure_maps_to_service_unavailable() {
        let interface = ApplicationError::Integration("language model unreachable".to_owned())
            .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn configuration_failure_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("missing api key".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
