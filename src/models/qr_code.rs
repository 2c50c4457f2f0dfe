use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::qr_codes;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable, ToSchema)]
#[diesel(table_name = qr_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QrCode {
    pub id: Uuid,
    pub code: String,
    pub pet_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub linked_at: Option<DateTime<Utc>>,
}

impl QrCode {
    pub fn is_linked(&self) -> bool {
        self.pet_id.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkQrRequest {
    #[serde(alias = "pet_id")]
    pub pet_id: Uuid,
}

impl QrCode {
    pub async fn find_by_code(conn: &mut AsyncPgConnection, code: &str) -> QueryResult<Option<QrCode>> {
        qr_codes::table
            .filter(qr_codes::code.eq(code))
            .select(QrCode::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn list_for_pet(conn: &mut AsyncPgConnection, pet_id: Uuid) -> QueryResult<Vec<QrCode>> {
        qr_codes::table
            .filter(qr_codes::pet_id.eq(pet_id))
            .order(qr_codes::linked_at.desc())
            .select(QrCode::as_select())
            .load(conn)
            .await
    }

    pub async fn list_for_pets(conn: &mut AsyncPgConnection, pet_ids: &[Uuid]) -> QueryResult<Vec<QrCode>> {
        qr_codes::table
            .filter(qr_codes::pet_id.eq_any(pet_ids))
            .order(qr_codes::linked_at.desc())
            .select(QrCode::as_select())
            .load(conn)
            .await
    }

    pub async fn count_for_pets(conn: &mut AsyncPgConnection, pet_ids: &[Uuid]) -> QueryResult<i64> {
        qr_codes::table
            .filter(qr_codes::pet_id.eq_any(pet_ids))
            .count()
            .get_result(conn)
            .await
    }

    pub async fn link(conn: &mut AsyncPgConnection, code: &str, pet_id: Uuid) -> QueryResult<QrCode> {
        diesel::update(qr_codes::table.filter(qr_codes::code.eq(code)))
            .set((
                qr_codes::pet_id.eq(Some(pet_id)),
                qr_codes::linked_at.eq(Some(Utc::now())),
            ))
            .returning(QrCode::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn unlink(conn: &mut AsyncPgConnection, code: &str) -> QueryResult<QrCode> {
        diesel::update(qr_codes::table.filter(qr_codes::code.eq(code)))
            .set((
                qr_codes::pet_id.eq(None::<Uuid>),
                qr_codes::linked_at.eq(None::<DateTime<Utc>>),
            ))
            .returning(QrCode::as_returning())
            .get_result(conn)
            .await
    }
}
