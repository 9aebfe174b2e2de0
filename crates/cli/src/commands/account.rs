//! Account management commands.
//!
//! Business verification is a back-office decision, not a storefront flow,
//! so the flip lives here. The storefront derives tiers from a fresh read
//! on every request, which means a change made here takes effect on the
//! account's next request with no session invalidation needed.

use sqlx::PgPool;

use meridian_core::Email;

/// Account command failure modes.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] meridian_core::EmailError),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No account found for {0}")]
    NotFound(String),

    #[error("{0} is not a business account")]
    NotBusiness(String),
}

/// Set a business account's verification status.
///
/// # Errors
///
/// Returns `AccountError` if the database is unreachable, the email has no
/// account, or the account is not a business account.
pub async fn set_verification(email: &str, verified: bool) -> Result<(), AccountError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email)?;
    let email = email.as_str();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| AccountError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    let pool = PgPool::connect(&database_url).await?;

    let row: Option<(String,)> =
        sqlx::query_as("SELECT account_type::TEXT FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&pool)
            .await?;

    match row.as_ref().map(|(t,)| t.as_str()) {
        None => return Err(AccountError::NotFound(email.to_string())),
        Some("business") => {}
        Some(_) => return Err(AccountError::NotBusiness(email.to_string())),
    }

    let status = if verified { "verified" } else { "unverified" };
    sqlx::query(
        "UPDATE users SET verification_status = $1::verification_status, updated_at = NOW()
         WHERE email = $2",
    )
    .bind(status)
    .bind(email)
    .execute(&pool)
    .await?;

    tracing::info!("Set {email} verification status to {status}");
    Ok(())
}
