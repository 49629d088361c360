use sqlx::PgPool;

use crate::types::{Interaction, NormalizedEvent};

/// Writes one interaction row per accepted event. The human-meaningful value
/// (rating 0-4 or request kind 0/1) is resolved to its reference-table row by
/// a subquery inside the insert itself, so the lookup and the write are a
/// single round trip. The reference tables are owned elsewhere and only ever
/// read here.
pub struct InteractionSink {
    pool: PgPool,
}

impl InteractionSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Exactly one insert, inside one transaction, on a connection checked
    /// out for just this event. A value with no reference row makes the
    /// subquery yield NULL and the not-null constraint rejects the insert, so
    /// a lookup miss fails the upload rather than writing garbage. Dropping
    /// the transaction on any error path rolls it back.
    pub async fn upload(&self, event: &NormalizedEvent) -> Result<(), sqlx::Error> {
        let mut txn = self.pool.begin().await?;

        match Interaction::from(event) {
            Interaction::Request(request) => {
                sqlx::query(
                    r#"
                    INSERT INTO request_interaction (exhibition_id, request_id, event_at)
                    VALUES ($1, (SELECT request_id FROM request WHERE request_value = $2), $3)
                    "#,
                )
                .bind(request.site)
                .bind(request.request_value)
                .bind(request.at)
                .execute(&mut *txn)
                .await?;
            }
            Interaction::Rating(rating) => {
                sqlx::query(
                    r#"
                    INSERT INTO rating_interaction (exhibition_id, rating_id, event_at)
                    VALUES ($1, (SELECT rating_id FROM rating WHERE rating_value = $2), $3)
                    "#,
                )
                .bind(rating.site)
                .bind(rating.rating_value)
                .bind(rating.at)
                .execute(&mut *txn)
                .await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }
}
