//! OAuth application credentials for the search API
//!
//! Search requests are authenticated with the application's client ID and
//! secret, which raises the search quota well above the anonymous limit.

use std::fmt;

/// Client ID and secret of a GitHub OAuth application
///
/// Both components are trimmed and must be non-empty.
///
/// # Examples
///
/// ```
/// use github_city::credentials::Credentials;
///
/// let credentials = Credentials::new(" my-id ", "my-secret").unwrap();
/// assert_eq!(credentials.client_id(), "my-id");
/// assert!(Credentials::new("", "my-secret").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Build credentials from a client ID and secret
    ///
    /// # Errors
    ///
    /// Returns an error if either component is missing or blank.
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self, CredentialsError> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(CredentialsError::MissingClientId);
        }

        let client_secret = client_secret.trim();
        if client_secret.is_empty() {
            return Err(CredentialsError::MissingClientSecret);
        }

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// Build credentials from optional components, as read from flags or the environment
    pub fn from_parts(
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<Self, CredentialsError> {
        let client_id = client_id.ok_or(CredentialsError::MissingClientId)?;
        let client_secret = client_secret.ok_or(CredentialsError::MissingClientSecret)?;
        Self::new(client_id, client_secret)
    }

    /// Get the client ID
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the client secret
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

// The secret never reaches logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Errors that can occur while building credentials
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// No client ID given
    #[error("no GitHub client ID given")]
    MissingClientId,

    /// No client secret given
    #[error("no GitHub client secret given")]
    MissingClientSecret,
}
