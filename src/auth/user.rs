//! User accounts and the `user` table.

use std::fmt::Display;

use rusqlite::{Connection, Row, ToSql};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// The primary key of a row in the `user` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserID(i64);

impl UserID {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered account. Usernames and email addresses are unique across accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserID,
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
}

/// The columns read by [map_user_row], in order.
const USER_COLUMNS: &str = "id, username, email, password";

/// Check that `email` has something on both sides of an '@'.
///
/// Anything stricter is left to the mail server.
pub fn validate_email(email: &str) -> Result<(), Error> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(Error::InvalidEmail(email.to_owned())),
    }
}

pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Insert a new account.
///
/// # Errors
///
/// Returns [Error::DuplicateUsername] or [Error::DuplicateEmail] when either is
/// already registered.
pub fn create_user(
    username: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let sql = format!(
        "INSERT INTO user (username, email, password) VALUES (?1, ?2, ?3) RETURNING {USER_COLUMNS}"
    );

    let user = connection
        .prepare(&sql)?
        .query_row((username, email, password_hash.as_ref()), map_user_row)?;

    Ok(user)
}

/// The single user matching `column = value`, or [Error::NotFound].
fn find_user(column: &str, value: &dyn ToSql, connection: &Connection) -> Result<User, Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM user WHERE {column} = ?1");

    let user = connection.prepare(&sql)?.query_row([value], map_user_row)?;

    Ok(user)
}

pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    find_user("id", &user_id.as_i64(), connection)
}

pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    find_user("username", &username, connection)
}

/// Replace the password hash of `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such user.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// How many accounts are registered.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM user", [], |row| row.get(0))?;

    usize::try_from(count)
        .map_err(|_| Error::SqlError(rusqlite::Error::IntegralValueOutOfRange(0, count)))
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
