//! Queries over users, polls and their references.
//!
//! References are removed together with their poll or user by the
//! `ON DELETE CASCADE` constraints of the schema, see [`crate::db::migrate`].

use diesel::prelude::*;
use diesel::result::Error::DeserializationError;

use crate::db::{DbPollId, DbReferenceId, DbUserId};
use crate::models::{NewPoll, NewUser, Poll, ReferenceRow, User};
use crate::reference::{NewReference, Reference};
use crate::schema;

fn decode(row: ReferenceRow) -> QueryResult<Reference> {
    Reference::try_from(row).map_err(|e| DeserializationError(Box::new(e)))
}

pub fn insert_user(
    conn: &mut SqliteConnection,
    user: &NewUser<'_>,
) -> QueryResult<User> {
    diesel::insert_into(schema::user::table)
        .values(user)
        .returning(User::as_returning())
        .get_result(conn)
}

pub fn find_user_by_id(
    conn: &mut SqliteConnection,
    user_id: DbUserId,
) -> QueryResult<Option<User>> {
    schema::user::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// Delete a user with their polls and references. Returns `false` if there
/// was no such user.
pub fn delete_user(
    conn: &mut SqliteConnection,
    user_id: DbUserId,
) -> QueryResult<bool> {
    let deleted =
        diesel::delete(schema::user::table.find(user_id)).execute(conn)?;
    log::debug!("Deleted user {user_id}: {deleted}");
    Ok(deleted > 0)
}

pub fn insert_poll(
    conn: &mut SqliteConnection,
    poll: &NewPoll<'_>,
) -> QueryResult<Poll> {
    diesel::insert_into(schema::poll::table)
        .values(poll)
        .returning(Poll::as_returning())
        .get_result(conn)
}

pub fn find_poll_by_id(
    conn: &mut SqliteConnection,
    poll_id: DbPollId,
) -> QueryResult<Option<Poll>> {
    schema::poll::table
        .find(poll_id)
        .select(Poll::as_select())
        .first(conn)
        .optional()
}

/// Delete a poll with all its references. Returns `false` if there was no
/// such poll.
pub fn delete_poll(
    conn: &mut SqliteConnection,
    poll_id: DbPollId,
) -> QueryResult<bool> {
    let deleted =
        diesel::delete(schema::poll::table.find(poll_id)).execute(conn)?;
    log::debug!("Deleted poll {poll_id}: {deleted}");
    Ok(deleted > 0)
}

/// Store a reference. Fails with a foreign key violation if the poll or the
/// user does not exist.
pub fn insert_reference(
    conn: &mut SqliteConnection,
    reference: &NewReference,
) -> QueryResult<Reference> {
    let row = diesel::insert_into(schema::reference::table)
        .values(reference.as_row())
        .returning(ReferenceRow::as_returning())
        .get_result(conn)?;
    let reference = decode(row)?;
    log::info!("Created {reference} for poll {}", reference.poll_id);
    Ok(reference)
}

pub fn find_reference_by_id(
    conn: &mut SqliteConnection,
    reference_id: DbReferenceId,
) -> QueryResult<Option<Reference>> {
    schema::reference::table
        .find(reference_id)
        .select(ReferenceRow::as_select())
        .first(conn)
        .optional()?
        .map(decode)
        .transpose()
}

pub fn find_references_by_poll(
    conn: &mut SqliteConnection,
    poll_id: DbPollId,
) -> QueryResult<Vec<Reference>> {
    schema::reference::table
        .filter(schema::reference::poll_id.eq(poll_id))
        .order(schema::reference::id.asc())
        .select(ReferenceRow::as_select())
        .load(conn)?
        .into_iter()
        .map(decode)
        .collect()
}

pub fn find_references_by_user(
    conn: &mut SqliteConnection,
    user_id: DbUserId,
) -> QueryResult<Vec<Reference>> {
    schema::reference::table
        .filter(schema::reference::user_id.eq(user_id))
        .order(schema::reference::id.asc())
        .select(ReferenceRow::as_select())
        .load(conn)?
        .into_iter()
        .map(decode)
        .collect()
}

/// Returns `false` if there was no such reference.
pub fn delete_reference(
    conn: &mut SqliteConnection,
    reference_id: DbReferenceId,
) -> QueryResult<bool> {
    let deleted = diesel::delete(schema::reference::table.find(reference_id))
        .execute(conn)?;
    log::debug!("Deleted reference {reference_id}: {deleted}");
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use itertools::Itertools;

    use super::*;
    use crate::db::tests::test_conn;
    use crate::db::DbMessageId;
    use crate::reference::ReferenceKind;

    const ADMIN: DbUserId = DbUserId(42);
    const VOTER: DbUserId = DbUserId(99);

    /// An admin owning one poll, and a voter.
    fn setup(conn: &mut SqliteConnection) -> DbPollId {
        for (id, name) in [(ADMIN, "Admin"), (VOTER, "Voter")] {
            insert_user(conn, &NewUser { id, name, username: None }).unwrap();
        }
        insert_poll(conn, &NewPoll { user_id: ADMIN, name: "Lunch?" })
            .unwrap()
            .id
    }

    fn insert_all(
        conn: &mut SqliteConnection,
        poll_id: DbPollId,
    ) -> Vec<Reference> {
        [
            NewReference::admin(poll_id, ADMIN, DbMessageId(200)),
            NewReference::private_vote(poll_id, VOTER, DbMessageId(300)),
            NewReference::inline(poll_id, "AgAAA".to_string()),
        ]
        .iter()
        .map(|r| insert_reference(conn, r).unwrap())
        .collect()
    }

    #[test]
    fn test_insert_and_find() {
        let mut conn = test_conn();
        let poll_id = setup(&mut conn);
        let inserted = insert_all(&mut conn, poll_id);

        assert_eq!(
            inserted.iter().map(|r| r.kind.reference_type().as_str()).collect_vec(),
            vec!["admin", "private_vote", "inline"]
        );
        assert!(inserted.iter().all(|r| r.poll_id == poll_id
            && r.message_dc_id.is_none()
            && r.message_access_hash.is_none()
            && r.created_at <= r.updated_at));

        assert_eq!(find_references_by_poll(&mut conn, poll_id).unwrap(), inserted);
        assert_eq!(
            find_reference_by_id(&mut conn, inserted[2].id).unwrap().as_ref(),
            Some(&inserted[2])
        );
        assert_eq!(
            find_reference_by_id(&mut conn, DbReferenceId(1000)).unwrap(),
            None
        );

        let by_voter = find_references_by_user(&mut conn, VOTER).unwrap();
        assert_eq!(by_voter, vec![inserted[1].clone()]);
        assert_eq!(
            by_voter[0].kind,
            ReferenceKind::PrivateVote {
                user_id: VOTER,
                message_id: DbMessageId(300)
            }
        );
    }

    #[test]
    fn test_find_collaborators() {
        let mut conn = test_conn();
        let poll_id = setup(&mut conn);

        let poll = find_poll_by_id(&mut conn, poll_id).unwrap().unwrap();
        assert_eq!(poll.user_id, ADMIN);
        assert_eq!(poll.name, "Lunch?");
        assert!(find_poll_by_id(&mut conn, DbPollId(1000)).unwrap().is_none());

        let user = find_user_by_id(&mut conn, VOTER).unwrap().unwrap();
        assert_eq!(user.name, "Voter");
        assert!(find_user_by_id(&mut conn, DbUserId(1)).unwrap().is_none());
    }

    #[test]
    fn test_missing_poll_or_user() {
        let mut conn = test_conn();
        let poll_id = setup(&mut conn);

        for reference in [
            NewReference::inline(DbPollId(1000), "AgAAA".to_string()),
            NewReference::admin(poll_id, DbUserId(1), DbMessageId(1)),
        ] {
            let result = insert_reference(&mut conn, &reference);
            assert!(
                matches!(
                    result,
                    Err(diesel::result::Error::DatabaseError(_, _))
                ),
                "{result:?}"
            );
        }
        assert!(find_references_by_poll(&mut conn, poll_id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_poll_cascades() {
        let mut conn = test_conn();
        let poll_id = setup(&mut conn);
        let other_poll =
            insert_poll(&mut conn, &NewPoll { user_id: VOTER, name: "Other" })
                .unwrap()
                .id;
        insert_all(&mut conn, poll_id);
        let kept = insert_all(&mut conn, other_poll);

        assert!(delete_poll(&mut conn, poll_id).unwrap());
        assert!(!delete_poll(&mut conn, poll_id).unwrap());
        assert!(find_references_by_poll(&mut conn, poll_id).unwrap().is_empty());
        assert_eq!(find_references_by_poll(&mut conn, other_poll).unwrap(), kept);
    }

    #[test]
    fn test_delete_user_cascades() {
        let mut conn = test_conn();
        let poll_id = setup(&mut conn);
        let inserted = insert_all(&mut conn, poll_id);

        assert!(delete_user(&mut conn, VOTER).unwrap());
        assert!(find_references_by_user(&mut conn, VOTER).unwrap().is_empty());
        assert_eq!(
            find_references_by_poll(&mut conn, poll_id).unwrap(),
            vec![inserted[0].clone(), inserted[2].clone()]
        );

        // The admin owns the poll, so everything goes.
        assert!(delete_user(&mut conn, ADMIN).unwrap());
        assert!(find_poll_by_id(&mut conn, poll_id).unwrap().is_none());
        assert!(find_references_by_poll(&mut conn, poll_id).unwrap().is_empty());
    }

    #[test]
    fn test_update_refreshes_updated_at() {
        let mut conn = test_conn();
        let poll_id = setup(&mut conn);
        let id = insert_all(&mut conn, poll_id)[0].id;
        let old = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        diesel::sql_query(format!(
            "UPDATE reference \
             SET created_at = '2000-01-01 00:00:00', \
                 updated_at = '2000-01-01 00:00:00' \
             WHERE id = {id}"
        ))
        .execute(&mut conn)
        .unwrap();

        let reference = find_reference_by_id(&mut conn, id).unwrap().unwrap();
        assert_eq!(reference.created_at, old);
        assert!(reference.updated_at > old, "{reference:?}");
    }

    #[test]
    fn test_delete_reference() {
        let mut conn = test_conn();
        let poll_id = setup(&mut conn);
        let inserted = insert_all(&mut conn, poll_id);

        assert!(delete_reference(&mut conn, inserted[0].id).unwrap());
        assert!(!delete_reference(&mut conn, inserted[0].id).unwrap());
        assert_eq!(find_references_by_poll(&mut conn, poll_id).unwrap().len(), 2);
        assert!(find_user_by_id(&mut conn, ADMIN).unwrap().is_some());
    }

    #[test]
    fn test_invalid_row() {
        let mut conn = test_conn();
        let poll_id = setup(&mut conn);
        diesel::sql_query(format!(
            "INSERT INTO reference (type, message_id, poll_id) \
             VALUES ('inline', 5, {poll_id})"
        ))
        .execute(&mut conn)
        .unwrap();

        assert!(matches!(
            find_references_by_poll(&mut conn, poll_id),
            Err(DeserializationError(_))
        ));
    }
}
