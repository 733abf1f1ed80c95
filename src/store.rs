use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::config::DbPool;
use crate::models::{
    Account, AdminMembership, NewAccount, NewSession, Restriction, Session, UserMembership,
};
use crate::schema::{account, admin, session, user_restrictions, users};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),
    #[error("Record not found")]
    NotFound,
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::NotFound => StoreError::NotFound,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Outcome of the admin role flip, decided inside a single transaction so
/// two concurrent promotions cannot both pass the "not yet admin" check.
#[derive(Debug, PartialEq, Eq)]
pub enum PromoteOutcome {
    Granted,
    AlreadyAdmin,
    NotFound,
}

/// Storage seam for the account service. Production uses [`PgStore`];
/// tests substitute an in-memory implementation.
///
/// Methods are synchronous; callers run them on the blocking pool
/// (`web::block`). Every multi-statement method is atomic: either all of
/// its rows land or none do.
pub trait AccountStore: Send + Sync {
    /// Inserts the account row plus its user-membership row.
    fn create_account(&self, new: NewAccount) -> Result<i32, StoreError>;
    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;
    fn find_account(&self, id: i32) -> Result<Option<Account>, StoreError>;
    /// Renames the account and, when an admin membership exists, its
    /// denormalized `admin_name`, in one transaction.
    fn update_username(&self, id: i32, new_username: &str) -> Result<(), StoreError>;
    fn update_password(&self, id: i32, new_hash: &str) -> Result<(), StoreError>;
    fn update_email(&self, id: i32, new_email: &str) -> Result<(), StoreError>;
    /// Moves the account from user membership to admin membership.
    fn promote_to_admin(&self, id: i32) -> Result<PromoteOutcome, StoreError>;
    /// Full replace: deletes every restriction row for the account, then
    /// inserts the submitted set.
    fn replace_restrictions(&self, id: i32, labels: Vec<String>) -> Result<(), StoreError>;
    /// Removes memberships, restrictions, sessions and the account row.
    fn delete_account(&self, id: i32) -> Result<(), StoreError>;
    fn create_session(&self, new: NewSession) -> Result<(), StoreError>;
    fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError>;
    fn delete_session(&self, token: &str) -> Result<(), StoreError>;
}

// Order-preserving dedupe for restriction labels.
fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PgPooled, StoreError> {
        self.pool.get().map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl AccountStore for PgStore {
    fn create_account(&self, new: NewAccount) -> Result<i32, StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let id = diesel::insert_into(account::table)
                .values(&new)
                .returning(account::id)
                .get_result::<i32>(conn)?;
            diesel::insert_into(users::table)
                .values(&UserMembership { account_id: id })
                .execute(conn)?;
            Ok(id)
        })
    }

    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let mut conn = self.conn()?;
        Ok(account::table
            .filter(account::username.eq(username))
            .first::<Account>(&mut conn)
            .optional()?)
    }

    fn find_account(&self, id: i32) -> Result<Option<Account>, StoreError> {
        let mut conn = self.conn()?;
        Ok(account::table.find(id).first::<Account>(&mut conn).optional()?)
    }

    fn update_username(&self, id: i32, new_username: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            diesel::update(account::table.find(id))
                .set(account::username.eq(new_username))
                .execute(conn)?;
            let is_admin = admin::table
                .find(id)
                .select(admin::account_id)
                .first::<i32>(conn)
                .optional()?
                .is_some();
            if is_admin {
                diesel::update(admin::table.find(id))
                    .set(admin::admin_name.eq(new_username))
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    fn update_password(&self, id: i32, new_hash: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        diesel::update(account::table.find(id))
            .set(account::password_hash.eq(new_hash))
            .execute(&mut conn)?;
        Ok(())
    }

    fn update_email(&self, id: i32, new_email: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        diesel::update(account::table.find(id))
            .set(account::email.eq(new_email))
            .execute(&mut conn)?;
        Ok(())
    }

    fn promote_to_admin(&self, id: i32) -> Result<PromoteOutcome, StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            let already = admin::table
                .find(id)
                .select(admin::account_id)
                .first::<i32>(conn)
                .optional()?
                .is_some();
            if already {
                return Ok(PromoteOutcome::AlreadyAdmin);
            }
            let username = account::table
                .find(id)
                .select(account::username)
                .first::<String>(conn)
                .optional()?;
            let Some(username) = username else {
                return Ok(PromoteOutcome::NotFound);
            };
            diesel::insert_into(admin::table)
                .values(&AdminMembership {
                    account_id: id,
                    admin_name: username,
                })
                .execute(conn)?;
            diesel::delete(users::table.find(id)).execute(conn)?;
            Ok(PromoteOutcome::Granted)
        })
    }

    fn replace_restrictions(&self, id: i32, labels: Vec<String>) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            diesel::delete(user_restrictions::table.filter(user_restrictions::account_id.eq(id)))
                .execute(conn)?;
            // A checkbox form can repeat a label; the composite primary key
            // admits it only once.
            let rows: Vec<Restriction> = dedup_labels(labels)
                .into_iter()
                .map(|restriction| Restriction {
                    account_id: id,
                    restriction,
                })
                .collect();
            if !rows.is_empty() {
                diesel::insert_into(user_restrictions::table)
                    .values(&rows)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    fn delete_account(&self, id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        conn.transaction::<_, StoreError, _>(|conn| {
            diesel::delete(admin::table.find(id)).execute(conn)?;
            diesel::delete(users::table.find(id)).execute(conn)?;
            diesel::delete(user_restrictions::table.filter(user_restrictions::account_id.eq(id)))
                .execute(conn)?;
            diesel::delete(session::table.filter(session::account_id.eq(id))).execute(conn)?;
            diesel::delete(account::table.find(id)).execute(conn)?;
            Ok(())
        })
    }

    fn create_session(&self, new: NewSession) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        diesel::insert_into(session::table).values(&new).execute(&mut conn)?;
        Ok(())
    }

    fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let mut conn = self.conn()?;
        Ok(session::table
            .filter(session::token.eq(token))
            .first::<Session>(&mut conn)
            .optional()?)
    }

    fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        diesel::delete(session::table.filter(session::token.eq(token))).execute(&mut conn)?;
        Ok(())
    }
}
