// Database schema definitions
diesel::table! {
    account (id) {
        id -> Int4,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamp,
    }
}

diesel::table! {
    users (account_id) {
        account_id -> Int4,
    }
}

diesel::table! {
    admin (account_id) {
        account_id -> Int4,
        admin_name -> Varchar,
    }
}

diesel::table! {
    user_restrictions (account_id, restriction) {
        account_id -> Int4,
        restriction -> Varchar,
    }
}

diesel::table! {
    session (session_id) {
        session_id -> Int4,
        account_id -> Int4,
        token -> Varchar,
        expires_at -> Timestamp,
        created_at -> Timestamp,
    }
}

diesel::joinable!(users -> account (account_id));
diesel::joinable!(admin -> account (account_id));
diesel::joinable!(user_restrictions -> account (account_id));
diesel::joinable!(session -> account (account_id));

diesel::allow_tables_to_appear_in_same_query!(
    account, users, admin, user_restrictions, session,
);
