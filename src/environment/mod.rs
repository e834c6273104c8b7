use serde::Deserialize;
use thiserror::Error;

/// A named deployment of the backend. The session core only ever reads the
/// orchestrator endpoint; everything else about a deployment lives with
/// whoever owns the environment list.
#[derive(Debug, Clone, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub orchestrator_endpoint: String,
}

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("no environments are configured")]
    NoneConfigured,
    #[error("no active environment is selected")]
    NoneActive,
    #[error("environment '{0}' is not configured")]
    Unknown(String),
    #[error("environment '{0}' has no orchestrator endpoint")]
    MissingEndpoint(String),
}

impl Environment {
    /// The base URL for this environment's orchestrator. Fails closed when the
    /// endpoint is empty so callers never reach the network with a bad base.
    pub fn endpoint(&self) -> Result<&str, EnvironmentError> {
        let endpoint = self.orchestrator_endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(EnvironmentError::MissingEndpoint(self.id.clone()));
        }
        Ok(endpoint)
    }
}

/// Pick the environment all calls of this session will be scoped to: the
/// selected id when one is given, otherwise the sole configured entry.
pub fn resolve_active<'a>(
    environments: &'a [Environment],
    selection: Option<&str>,
) -> Result<&'a Environment, EnvironmentError> {
    if environments.is_empty() {
        return Err(EnvironmentError::NoneConfigured);
    }

    match selection {
        Some(id) => environments
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| EnvironmentError::Unknown(id.to_string())),
        None if environments.len() == 1 => Ok(&environments[0]),
        None => Err(EnvironmentError::NoneActive),
    }
}
