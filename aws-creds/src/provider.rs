use crate::credentials::Credentials;
use crate::error::CredentialsError;
use std::path::PathBuf;
use std::sync::Arc;

/// Scope used when a caller has no opinion, matches the `[default]` profile.
pub const DEFAULT_SCOPE: &str = "default";

/// Source of [`Credentials`], consulted once per signing call.
///
/// The `scope` identifies which set of credentials to resolve. File backed
/// providers read it as a profile name, static and environment providers
/// ignore it.
pub trait CredentialsProvider {
    fn credentials(&self, scope: &str) -> Result<Credentials, CredentialsError>;
}

impl CredentialsProvider for Credentials {
    fn credentials(&self, _scope: &str) -> Result<Credentials, CredentialsError> {
        Ok(self.clone())
    }
}

impl<T: CredentialsProvider + ?Sized> CredentialsProvider for &T {
    fn credentials(&self, scope: &str) -> Result<Credentials, CredentialsError> {
        (**self).credentials(scope)
    }
}

impl<T: CredentialsProvider + ?Sized> CredentialsProvider for Arc<T> {
    fn credentials(&self, scope: &str) -> Result<Credentials, CredentialsError> {
        (**self).credentials(scope)
    }
}

/// Reads `AWS_*` variables on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvProvider;

impl CredentialsProvider for EnvProvider {
    fn credentials(&self, _scope: &str) -> Result<Credentials, CredentialsError> {
        Credentials::from_env()
    }
}

/// Reads the profile named by the scope from a shared credentials file,
/// `~/.aws/credentials` unless a path is given.
#[derive(Clone, Debug, Default)]
pub struct ProfileProvider {
    path: Option<PathBuf>,
}

impl ProfileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl CredentialsProvider for ProfileProvider {
    fn credentials(&self, scope: &str) -> Result<Credentials, CredentialsError> {
        match &self.path {
            Some(path) => Credentials::from_credentials_file(path, Some(scope)),
            None => Credentials::from_profile(Some(scope)),
        }
    }
}

/// Environment first, then the profile named by the scope.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultProvider;

impl CredentialsProvider for DefaultProvider {
    fn credentials(&self, scope: &str) -> Result<Credentials, CredentialsError> {
        Credentials::new(None, None, None, None, Some(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn static_credentials() -> Credentials {
        Credentials::new(Some("AKIDSTATIC"), Some("static-secret"), None, None, None).unwrap()
    }

    #[test]
    fn static_credentials_ignore_scope() {
        let credentials = static_credentials();

        assert_eq!(credentials.credentials("anything").unwrap(), credentials);
        assert_eq!(credentials.credentials(DEFAULT_SCOPE).unwrap(), credentials);
    }

    fn access_key_of<P: CredentialsProvider>(provider: P) -> Option<String> {
        provider.credentials(DEFAULT_SCOPE).unwrap().access_key
    }

    #[test]
    fn shared_providers_delegate() {
        let shared: Arc<dyn CredentialsProvider + Send + Sync> = Arc::new(static_credentials());

        assert_eq!(access_key_of(&shared).as_deref(), Some("AKIDSTATIC"));
        assert_eq!(access_key_of(shared).as_deref(), Some("AKIDSTATIC"));
    }

    #[test]
    fn profile_provider_reads_scope_as_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"[default]\naws_access_key_id = AKIDDEFAULT\naws_secret_access_key = a\n\
              [staging]\naws_access_key_id = AKIDSTAGING\naws_secret_access_key = b\n",
        )
        .unwrap();

        let provider = ProfileProvider::with_path(file.path());

        assert_eq!(
            provider.credentials(DEFAULT_SCOPE).unwrap().access_key.as_deref(),
            Some("AKIDDEFAULT")
        );
        assert_eq!(
            provider.credentials("staging").unwrap().access_key.as_deref(),
            Some("AKIDSTAGING")
        );
        assert!(matches!(
            provider.credentials("missing"),
            Err(CredentialsError::MissingProfile(_))
        ));
    }
}
