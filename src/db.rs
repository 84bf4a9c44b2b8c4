//! Database connection setup and id newtypes.

use std::fmt;

use diesel::connection::SimpleConnection;
use diesel::{Connection, QueryResult, SqliteConnection};
use diesel_derive_newtype::DieselNewType;
use teloxide::types::{ChatId, MessageId};

/// The schema of the `user`, `poll` and `reference` tables.
const SCHEMA: &str =
    include_str!("../migrations/2026-10-19-000000_create_references/up.sql");

/// Open a connection with foreign keys enforced.
///
/// `SQLite` checks foreign keys (and thus performs `ON DELETE CASCADE`) only
/// when the pragma is enabled on the connection itself.
pub fn establish(
    database_url: &str,
    busy_timeout_ms: u32,
) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.batch_execute(&format!(
        "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {busy_timeout_ms};"
    ))?;
    Ok(conn)
}

/// Create missing tables, indexes and triggers.
pub fn migrate(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(SCHEMA)
}

macro_rules! make_db_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(
            Copy,
            Clone,
            Debug,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
            DieselNewType,
        )]
        #[doc = "A newtype wrapper for an id to be stored in the database."]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

make_db_newtype!(DbUserId, i64);
make_db_newtype!(DbPollId, i32);
make_db_newtype!(DbReferenceId, i32);
make_db_newtype!(DbMessageId, i64);

/// The private chat with a user has the same id as the user.
impl From<DbUserId> for ChatId {
    fn from(id: DbUserId) -> Self {
        Self(id.0)
    }
}

impl From<MessageId> for DbMessageId {
    fn from(id: MessageId) -> Self {
        Self(id.0.into())
    }
}

impl TryFrom<DbMessageId> for MessageId {
    type Error = std::num::TryFromIntError;

    fn try_from(id: DbMessageId) -> Result<Self, Self::Error> {
        Ok(Self(id.0.try_into()?))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// A fresh in-memory database with the schema applied.
    pub fn test_conn() -> SqliteConnection {
        let mut conn = establish(":memory:", 0).unwrap();
        migrate(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let mut conn = test_conn();
        migrate(&mut conn).unwrap();
    }

    #[test]
    fn test_message_id_conversion() {
        assert_eq!(DbMessageId::from(MessageId(42)), DbMessageId(42));
        assert_eq!(MessageId::try_from(DbMessageId(42)), Ok(MessageId(42)));
        assert!(MessageId::try_from(DbMessageId(i64::MAX)).is_err());
    }

    #[test]
    fn test_user_chat_id() {
        assert_eq!(ChatId::from(DbUserId(42)), ChatId(42));
    }
}
