use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Serialize, Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::account)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// One row per non-admin account. Mutually exclusive with AdminMembership.
#[derive(Queryable, Insertable, Serialize, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct UserMembership {
    pub account_id: i32,
}

// Carries a denormalized copy of the username; kept in sync on rename.
#[derive(Queryable, Insertable, Serialize, Debug)]
#[diesel(table_name = crate::schema::admin)]
pub struct AdminMembership {
    pub account_id: i32,
    pub admin_name: String,
}

#[derive(Queryable, Insertable, Serialize, Debug, Clone)]
#[diesel(table_name = crate::schema::user_restrictions)]
pub struct Restriction {
    pub account_id: i32,
    pub restriction: String,
}

#[derive(Queryable, Serialize, Debug, Clone)]
pub struct Session {
    pub session_id: i32,
    pub account_id: i32,
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::session)]
pub struct NewSession {
    pub account_id: i32,
    pub token: String,
    pub expires_at: NaiveDateTime,
}

// DTOs
#[derive(Deserialize, Debug)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub account_id: i32,
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct ChangeUsernameForm {
    pub username: String,
}

#[derive(Deserialize, Debug)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize, Debug)]
pub struct ChangeEmailForm {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct SecurityKeyForm {
    pub security_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn account_serialization_hides_password_hash() {
        let account = Account {
            id: 1,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            created_at: Utc::now().naive_utc(),
        };
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn signup_request_parses_json_body() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"username":"alice","password":"pw1","email":"a@x.com"}"#,
        )
        .unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.email, "a@x.com");
    }
}
