/// Password hashing module using Argon2id
///
/// Passwords are never stored in plaintext. Hashes are PHC strings that embed
/// the algorithm, parameters and salt, so verification works even after the
/// configured cost changes.
///
/// # Default Cost
///
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("super_secret_password_123")?;
///
/// assert!(verify_password("super_secret_password_123", &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder, Version,
};
use serde::{Deserialize, Serialize};

/// Minimum accepted password length (characters)
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum accepted password length (characters)
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl HashParams {
    /// Checks that Argon2 accepts these costs
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` naming the rejected parameter
    pub fn validate(&self) -> Result<(), PasswordError> {
        self.to_argon2().map(|_| ())
    }

    fn to_argon2(&self) -> Result<Params, PasswordError> {
        ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))
    }
}

/// Hashes a password using Argon2id with the default cost
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::hash_password;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("my_password")?;
/// assert!(hash.starts_with("$argon2id$"));
/// # Ok(())
/// # }
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with(password, &HashParams::default())
}

/// Hashes a password using Argon2id with explicit cost parameters
///
/// A fresh 16-byte salt is drawn from the OS RNG for every call, so hashing
/// the same password twice yields different strings.
///
/// # Returns
///
/// PHC string format hash, e.g.
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
pub fn hash_password_with(password: &str, params: &HashParams) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = params.to_argon2()?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Parameters are read from the PHC string. Comparison is constant-time.
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` when the stored hash cannot be parsed,
/// `PasswordError::VerifyError` for any other verification failure.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks the signup password length policy (6 to 128 characters)
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::validate_password_length;
///
/// assert!(validate_password_length("secret").is_ok());
/// assert!(validate_password_length("short").is_err());
/// ```
pub fn validate_password_length(password: &str) -> Result<(), String> {
    let len = password.chars().count();

    if len < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if len > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> HashParams {
        HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_password_default_params() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_with_custom_params() {
        let hash = hash_password_with("test_password_123", &cheap()).expect("Hash should succeed");

        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password_with("same_password", &cheap()).unwrap();
        let hash2 = hash_password_with("same_password", &cheap()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct_and_incorrect() {
        let hash = hash_password_with("correct_password", &cheap()).unwrap();

        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_ignores_configured_cost() {
        // Hashes made with one cost still verify after the default changes
        let hash = hash_password_with("password", &cheap()).unwrap();
        assert!(verify_password("password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(matches!(
            verify_password("password", "invalid_hash"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(matches!(
            verify_password("password", "$argon2id$v=19$m=19456,t=2,p=1$!!!!$!!!!"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_verify_password_parseable_hash_without_digest_is_mismatch() {
        // Well-formed PHC prefix with nothing to compare against
        assert!(!verify_password("password", "$argon2id$invalid").unwrap());
    }

    #[test]
    fn test_hash_verify_unicode() {
        let hash = hash_password_with("unicode-密码-パスワード", &cheap()).unwrap();
        assert!(verify_password("unicode-密码-パスワード", &hash).unwrap());
    }

    #[test]
    fn test_hash_params_validate() {
        assert!(HashParams::default().validate().is_ok());
        assert!(cheap().validate().is_ok());

        let no_passes = HashParams { iterations: 0, ..cheap() };
        assert!(matches!(no_passes.validate(), Err(PasswordError::HashError(_))));

        let no_lanes = HashParams { parallelism: 0, ..cheap() };
        assert!(no_lanes.validate().is_err());

        // Argon2 needs at least 8 KiB per lane
        let starved = HashParams { memory_kib: 8, parallelism: 4, iterations: 1 };
        assert!(starved.validate().is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password_length("123456").is_ok());
        assert!(validate_password_length(&"a".repeat(128)).is_ok());

        let err = validate_password_length("12345").unwrap_err();
        assert!(err.contains("at least 6"));

        let err = validate_password_length(&"a".repeat(129)).unwrap_err();
        assert!(err.contains("at most 128"));
    }

    #[test]
    fn test_validate_password_length_counts_chars() {
        // Six characters, more than six bytes
        assert!(validate_password_length("密码密码密码").is_ok());
    }
}
