use anyhow::Result;

// ============================================================================
// Configuration Constants
// ============================================================================

const DEFAULT_PORT: u16 = 3000;

/// Minimum acceptable JWT secret length (characters)
const MIN_JWT_SECRET_LEN: usize = 32;

/// bcrypt permits costs between 4 and 31
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

// ============================================================================
// Configuration Structure
// ============================================================================

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    /// bcrypt work factor for password hashing
    pub bcrypt_cost: u32,
    pub port: u16,
    /// Session token TTL in hours. `None` means tokens never expire,
    /// which matches the behavior this service replaces; set
    /// TOKEN_TTL_HOURS to opt into expiring tokens.
    pub token_ttl_hours: Option<i64>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")?,
            jwt_secret: {
                let secret = std::env::var("JWT_SECRET")?;
                if secret.len() < MIN_JWT_SECRET_LEN {
                    anyhow::bail!(
                        "JWT_SECRET must be at least {} characters long. \
                         Generate one with: openssl rand -base64 32",
                        MIN_JWT_SECRET_LEN
                    );
                }
                secret
            },
            bcrypt_cost: {
                let cost = std::env::var("BCRYPT_COST")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(bcrypt::DEFAULT_COST);
                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
                    anyhow::bail!(
                        "BCRYPT_COST must be between {} and {} (got {})",
                        MIN_BCRYPT_COST,
                        MAX_BCRYPT_COST,
                        cost
                    );
                }
                cost
            },
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|t| t.parse().ok()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
