// Must match migrations/2026-10-19-000000_create_references/up.sql.

diesel::table! {
    poll (id) {
        id -> Integer,
        user_id -> BigInt,
        name -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    reference (id) {
        id -> Integer,
        #[sql_name = "type"]
        type_ -> Nullable<Text>,
        bot_inline_message_id -> Nullable<Text>,
        message_id -> Nullable<BigInt>,
        message_dc_id -> Nullable<BigInt>,
        message_access_hash -> Nullable<BigInt>,
        user_id -> Nullable<BigInt>,
        poll_id -> Integer,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    user (id) {
        id -> BigInt,
        name -> Text,
        username -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::joinable!(poll -> user (user_id));
diesel::joinable!(reference -> poll (poll_id));
diesel::joinable!(reference -> user (user_id));

diesel::allow_tables_to_appear_in_same_query!(poll, reference, user,);
