use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::db::{DbMessageId, DbPollId, DbReferenceId, DbUserId};

// Database models

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name = crate::schema::user)]
pub struct User {
    pub id: DbUserId,
    pub name: String,
    pub username: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::user)]
pub struct NewUser<'a> {
    pub id: DbUserId,
    pub name: &'a str,
    pub username: Option<&'a str>,
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name = crate::schema::poll)]
pub struct Poll {
    pub id: DbPollId,
    pub user_id: DbUserId,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::poll)]
pub struct NewPoll<'a> {
    pub user_id: DbUserId,
    pub name: &'a str,
}

/// A raw `reference` row. Use [`crate::reference::Reference`] to access the
/// addressing fields.
#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name = crate::schema::reference)]
pub struct ReferenceRow {
    pub id: DbReferenceId,
    pub type_: Option<String>,
    pub bot_inline_message_id: Option<String>,
    pub message_id: Option<DbMessageId>,
    pub message_dc_id: Option<i64>,
    pub message_access_hash: Option<i64>,
    pub user_id: Option<DbUserId>,
    pub poll_id: DbPollId,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::reference)]
pub struct NewReferenceRow<'a> {
    pub type_: Option<&'a str>,
    pub bot_inline_message_id: Option<&'a str>,
    pub message_id: Option<DbMessageId>,
    pub user_id: Option<DbUserId>,
    pub poll_id: DbPollId,
}
