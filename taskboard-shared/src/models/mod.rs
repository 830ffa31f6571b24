/// Domain models for Taskboard
///
/// Each model carries its serde shape plus its PostgreSQL operations.
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `project`: Projects and project summaries
/// - `task`: Tasks, stages and attachments
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod project;
pub mod task;
pub mod user;
