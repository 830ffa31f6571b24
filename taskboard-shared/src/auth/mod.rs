/// Authentication utilities
///
/// This module provides the authentication primitives for Taskboard:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Bearer token extraction and the per-request `AuthContext`
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id, cost configurable (default 64 MB, 3 iterations)
/// - **JWT Tokens**: HS256 signing, 7 day default expiration
/// - **Generic login failures**: callers never learn which credential was wrong
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "user@example.com");
/// let token = create_token(&claims, "secret-key")?;
/// assert_eq!(validate_token(&token, "secret-key")?.email, "user@example.com");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
