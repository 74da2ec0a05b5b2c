/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and password strength rules
/// - [`jwt`]: HS256 access/refresh tokens carrying the user's role
/// - [`middleware`]: Bearer-token middleware and the per-request [`middleware::AuthContext`]
/// - [`authorization`]: Role and ownership checks used by handlers
///
/// # Example
///
/// ```no_run
/// use htmlquest_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use htmlquest_shared::auth::password::{hash_password, verify_password};
/// use htmlquest_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Str0ng!Passw0rd")?;
/// assert!(verify_password("Str0ng!Passw0rd", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), UserRole::Student, TokenType::Access);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// let validated = validate_access_token(&token, "secret-key-at-least-32-bytes-long!!")?;
/// assert_eq!(validated.role, UserRole::Student);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
