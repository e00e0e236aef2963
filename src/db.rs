use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::error::{AppError, AppResult};

pub type DbPool = Pool<Sqlite>;

pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        // Referential integrity for message sender/recipient lives in the
        // schema; SQLite only enforces it with this pragma on.
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

// ============================================================================
// Users
// ============================================================================

/// Full user row including the password hash. Never serialized; handlers
/// project into [`UserProfile`] or [`UserDetail`] before responding.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// Public profile projection embedded in message payloads
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Profile plus timestamps, returned from registration and user lookup
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserDetail {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Creates a user with a bcrypt-hashed password and `join_at =
/// last_login_at = now`. A duplicate username maps to a conflict error.
pub async fn create_user(pool: &DbPool, new_user: &NewUser, cost: u32) -> AppResult<UserDetail> {
    let password_hash = bcrypt::hash(&new_user.password, cost)?;
    let now = Utc::now();

    let user = sqlx::query_as::<_, UserDetail>(
        r#"
        INSERT INTO users (username, password_hash, first_name, last_name, phone, join_at, last_login_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING username, first_name, last_name, phone, join_at, last_login_at
        "#,
    )
    .bind(&new_user.username)
    .bind(&password_hash)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.phone)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Username taken. Please pick another!".to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok(user)
}

pub async fn get_user_by_username(pool: &DbPool, username: &str) -> AppResult<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>(
        r#"
        SELECT username, password_hash, first_name, last_name, phone, join_at, last_login_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Is this username/password pair valid? Returns `false` for a missing
/// user or a non-matching password, never an error.
pub async fn authenticate(pool: &DbPool, username: &str, password: &str) -> AppResult<bool> {
    match get_user_by_username(pool, username).await? {
        Some(user) => Ok(bcrypt::verify(password, &user.password_hash).unwrap_or(false)),
        None => Ok(false),
    }
}

/// Sets `last_login_at` to the current time. Callers treat this as
/// fire-and-forget: a missing username is not an error here.
pub async fn touch_last_login(pool: &DbPool, username: &str) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE users SET last_login_at = $1 WHERE username = $2
        "#,
    )
    .bind(Utc::now())
    .bind(username)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_users(pool: &DbPool) -> AppResult<Vec<UserProfile>> {
    let users = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT username, first_name, last_name, phone
        FROM users
        ORDER BY username
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn get_user_detail(pool: &DbPool, username: &str) -> AppResult<Option<UserDetail>> {
    let user = sqlx::query_as::<_, UserDetail>(
        r#"
        SELECT username, first_name, last_name, phone, join_at, last_login_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

// ============================================================================
// Messages
// ============================================================================

/// Raw message row as stored
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: i64,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Message with both party profiles embedded, as returned from
/// `GET /messages/:id`
#[derive(Debug, Clone, Serialize)]
pub struct MessageDetail {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserProfile,
    pub to_user: UserProfile,
}

impl MessageDetail {
    /// A party to a message is its sender or its recipient; nobody else
    /// may see it.
    pub fn is_party(&self, username: &str) -> bool {
        username == self.from_user.username || username == self.to_user.username
    }

    /// Only the recipient may mark a message read
    pub fn is_recipient(&self, username: &str) -> bool {
        username == self.to_user.username
    }
}

/// Message in a sender's outbox, recipient profile embedded
#[derive(Debug, Clone, Serialize)]
pub struct SentMessage {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub to_user: UserProfile,
}

/// Message in a recipient's inbox, sender profile embedded
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedMessage {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserProfile,
}

/// Read receipt returned from `POST /messages/:id/read`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReadReceipt {
    pub id: i64,
    pub read_at: DateTime<Utc>,
}

// Flat join row; split into the embedded profile shape after fetching
#[derive(Debug, sqlx::FromRow)]
struct MessageWithPartyRow {
    id: i64,
    body: String,
    sent_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
    username: String,
    first_name: String,
    last_name: String,
    phone: String,
}

impl MessageWithPartyRow {
    fn into_parts(self) -> (i64, String, DateTime<Utc>, Option<DateTime<Utc>>, UserProfile) {
        (
            self.id,
            self.body,
            self.sent_at,
            self.read_at,
            UserProfile {
                username: self.username,
                first_name: self.first_name,
                last_name: self.last_name,
                phone: self.phone,
            },
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageDetailRow {
    id: i64,
    body: String,
    sent_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
    from_username: String,
    from_first_name: String,
    from_last_name: String,
    from_phone: String,
    to_username: String,
    to_first_name: String,
    to_last_name: String,
    to_phone: String,
}

impl From<MessageDetailRow> for MessageDetail {
    fn from(row: MessageDetailRow) -> Self {
        Self {
            id: row.id,
            body: row.body,
            sent_at: row.sent_at,
            read_at: row.read_at,
            from_user: UserProfile {
                username: row.from_username,
                first_name: row.from_first_name,
                last_name: row.from_last_name,
                phone: row.from_phone,
            },
            to_user: UserProfile {
                username: row.to_username,
                first_name: row.to_first_name,
                last_name: row.to_last_name,
                phone: row.to_phone,
            },
        }
    }
}

/// Inserts a message with `sent_at = now` and `read_at = NULL`. An
/// unknown sender or recipient surfaces the foreign-key violation as a
/// validation error.
pub async fn create_message(
    pool: &DbPool,
    from_username: &str,
    to_username: &str,
    body: &str,
) -> AppResult<MessageRecord> {
    let message = sqlx::query_as::<_, MessageRecord>(
        r#"
        INSERT INTO messages (from_username, to_username, body, sent_at, read_at)
        VALUES ($1, $2, $3, $4, NULL)
        RETURNING id, from_username, to_username, body, sent_at, read_at
        "#,
    )
    .bind(from_username)
    .bind(to_username)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::Validation(
                "from_username and to_username must reference existing users".to_string(),
            )
        }
        _ => AppError::Database(e),
    })?;

    Ok(message)
}

pub async fn get_message(pool: &DbPool, id: i64) -> AppResult<Option<MessageDetail>> {
    let row = sqlx::query_as::<_, MessageDetailRow>(
        r#"
        SELECT
            m.id, m.body, m.sent_at, m.read_at,
            f.username   AS from_username,
            f.first_name AS from_first_name,
            f.last_name  AS from_last_name,
            f.phone      AS from_phone,
            t.username   AS to_username,
            t.first_name AS to_first_name,
            t.last_name  AS to_last_name,
            t.phone      AS to_phone
        FROM messages m
        JOIN users f ON f.username = m.from_username
        JOIN users t ON t.username = m.to_username
        WHERE m.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(MessageDetail::from))
}

/// All messages sent by a user, oldest first, each with the recipient
/// profile embedded
pub async fn messages_from(pool: &DbPool, username: &str) -> AppResult<Vec<SentMessage>> {
    let rows = sqlx::query_as::<_, MessageWithPartyRow>(
        r#"
        SELECT m.id, m.body, m.sent_at, m.read_at,
               u.username, u.first_name, u.last_name, u.phone
        FROM messages m
        JOIN users u ON u.username = m.to_username
        WHERE m.from_username = $1
        ORDER BY m.sent_at ASC, m.id ASC
        "#,
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let (id, body, sent_at, read_at, to_user) = row.into_parts();
            SentMessage {
                id,
                body,
                sent_at,
                read_at,
                to_user,
            }
        })
        .collect())
}

/// All messages addressed to a user, oldest first, each with the sender
/// profile embedded
pub async fn messages_to(pool: &DbPool, username: &str) -> AppResult<Vec<ReceivedMessage>> {
    let rows = sqlx::query_as::<_, MessageWithPartyRow>(
        r#"
        SELECT m.id, m.body, m.sent_at, m.read_at,
               u.username, u.first_name, u.last_name, u.phone
        FROM messages m
        JOIN users u ON u.username = m.from_username
        WHERE m.to_username = $1
        ORDER BY m.sent_at ASC, m.id ASC
        "#,
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let (id, body, sent_at, read_at, from_user) = row.into_parts();
            ReceivedMessage {
                id,
                body,
                sent_at,
                read_at,
                from_user,
            }
        })
        .collect())
}

/// Marks a message read, first write wins. Re-marking is an idempotent
/// no-op that returns the original timestamp. `None` if no such message.
pub async fn mark_read(pool: &DbPool, id: i64) -> AppResult<Option<ReadReceipt>> {
    let receipt = sqlx::query_as::<_, ReadReceipt>(
        r#"
        UPDATE messages
        SET read_at = $1
        WHERE id = $2 AND read_at IS NULL
        RETURNING id, read_at
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if receipt.is_some() {
        return Ok(receipt);
    }

    // Already read (or absent): report the stored timestamp unchanged
    let existing = sqlx::query_as::<_, ReadReceipt>(
        r#"
        SELECT id, read_at FROM messages WHERE id = $1 AND read_at IS NOT NULL
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(existing)
}
