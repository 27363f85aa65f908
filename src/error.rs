use thiserror::Error;

/// Reason a setup run stopped.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to connect to Vault")]
    Connection(#[source] anyhow::Error),

    #[error("failed to set up PKI backend for cluster '{cluster_id}'")]
    BackendSetup {
        cluster_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to generate tokens for cluster '{cluster_id}'")]
    TokenGeneration {
        cluster_id: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupErrorKind {
    InvalidConfiguration,
    Connection,
    BackendSetup,
    TokenGeneration,
}

impl SetupError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    #[must_use]
    pub fn kind(&self) -> SetupErrorKind {
        match self {
            Self::InvalidConfiguration(_) => SetupErrorKind::InvalidConfiguration,
            Self::Connection(_) => SetupErrorKind::Connection,
            Self::BackendSetup { .. } => SetupErrorKind::BackendSetup,
            Self::TokenGeneration { .. } => SetupErrorKind::TokenGeneration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_failed_step() {
        let err = SetupError::BackendSetup {
            cluster_id: "c1".to_string(),
            source: anyhow::anyhow!("Vault API error (500): boom"),
        };
        assert_eq!(err.kind(), SetupErrorKind::BackendSetup);
        assert_eq!(err.to_string(), "failed to set up PKI backend for cluster 'c1'");
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.contains("boom"));
    }

    #[test]
    fn test_invalid_configuration_message() {
        let err = SetupError::invalid("cluster ID must not be empty");
        assert_eq!(err.kind(), SetupErrorKind::InvalidConfiguration);
        assert_eq!(
            err.to_string(),
            "invalid configuration: cluster ID must not be empty"
        );
    }
}
