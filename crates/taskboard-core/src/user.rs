use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::auth;
use crate::error::{CoreError, Result};
use crate::store::{ts_from_sql, ts_to_sql, Store};

/// A registered account. The password hash never leaves the store.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The subset of a user embedded in other payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

pub fn register(store: &Store, email: &str, password: &str, name: &str) -> Result<User> {
    let conn = store.conn();
    let taken: Option<String> = conn
        .query_row("SELECT id FROM users WHERE email = ?1", [email], |r| {
            r.get(0)
        })
        .optional()?;
    if taken.is_some() {
        return Err(CoreError::EmailTaken(email.to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        name: name.to_string(),
        created_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO users (id, email, password_hash, name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id,
            user.email,
            auth::hash_password(password),
            user.name,
            ts_to_sql(user.created_at),
        ],
    )?;
    tracing::info!(email = %user.email, "registered user");
    Ok(user)
}

/// Verify credentials. A missing account and a wrong password are
/// indistinguishable to the caller.
pub fn login(store: &Store, email: &str, password: &str) -> Result<User> {
    let row = store
        .conn()
        .query_row(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE email = ?1",
            [email],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id, email, hash, name, created_at)) = row else {
        return Err(CoreError::InvalidCredentials);
    };
    if !auth::verify_password(password, &hash) {
        return Err(CoreError::InvalidCredentials);
    }
    Ok(User {
        id,
        email,
        name,
        created_at: ts_from_sql(&created_at)?,
    })
}

pub fn get(conn: &Connection, id: &str) -> Result<User> {
    conn.query_row(
        "SELECT id, email, name, created_at FROM users WHERE id = ?1",
        [id],
        |r| {
            Ok(User {
                id: r.get(0)?,
                email: r.get(1)?,
                name: r.get(2)?,
                created_at: ts_from_sql(&r.get::<_, String>(3)?)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CoreError::UserNotFound(id.to_string()))
}

pub(crate) fn summary(conn: &Connection, id: &str) -> Result<UserSummary> {
    conn.query_row(
        "SELECT id, name, email FROM users WHERE id = ?1",
        [id],
        |r| {
            Ok(UserSummary {
                id: r.get(0)?,
                name: r.get(1)?,
                email: r.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CoreError::UserNotFound(id.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
