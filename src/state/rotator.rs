/// Credential rotation for the search API
///
/// The rotator only tracks which credential is active. Deciding when the pool is
/// exhausted belongs to the request loop, which knows how many attempts failed.
use crate::ConfigError;

/// Circular pool of API credentials scoped to a single harvest run
#[derive(Debug, Clone)]
pub struct CredentialRotator {
    keys: Vec<String>,
    index: usize,
}

impl CredentialRotator {
    /// Creates a rotator from raw credentials
    ///
    /// Surrounding whitespace is trimmed and blank entries are dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(CredentialRotator)` - At least one usable credential remained
    /// * `Err(ConfigError::NoCredentials)` - The pool would be empty
    pub fn new<I, S>(keys: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(ConfigError::NoCredentials);
        }

        Ok(Self { keys, index: 0 })
    }

    /// Returns the active credential
    pub fn current(&self) -> &str {
        &self.keys[self.index]
    }

    /// Advances to the next credential, wrapping around, and returns the new index
    pub fn rotate(&mut self) -> usize {
        self.index = (self.index + 1) % self.keys.len();
        tracing::warn!("Rotated to API key #{}", self.index + 1);
        self.index
    }

    /// Index of the active credential
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of credentials in the pool
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; an empty pool cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
