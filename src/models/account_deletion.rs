use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::account_deletions;

/// Append-only audit row written when an account is deleted
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = account_deletions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccountDeletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    pub deleted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = account_deletions)]
pub struct NewAccountDeletion {
    pub user_id: Uuid,
    pub reason: String,
    pub deleted_at: DateTime<Utc>,
}

impl AccountDeletion {
    pub async fn record(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        reason: &str,
    ) -> QueryResult<AccountDeletion> {
        diesel::insert_into(account_deletions::table)
            .values(NewAccountDeletion {
                user_id,
                reason: reason.to_string(),
                deleted_at: Utc::now(),
            })
            .returning(AccountDeletion::as_returning())
            .get_result(conn)
            .await
    }
}
