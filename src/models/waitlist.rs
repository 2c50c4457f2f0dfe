use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::waitlist;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = waitlist)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct JoinWaitlistRequest {
    pub email: Option<String>,
}

impl WaitlistEntry {
    pub async fn insert(conn: &mut AsyncPgConnection, email: &str) -> QueryResult<WaitlistEntry> {
        diesel::insert_into(waitlist::table)
            .values(waitlist::email.eq(email))
            .returning(WaitlistEntry::as_returning())
            .get_result(conn)
            .await
    }
}
