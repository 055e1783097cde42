//! Delete Badge Lambda - cascading delete of one badge.
//!
//! Users referencing the badge have their foreign key nulled first, then
//! the badge row is deleted. Both statements run in one transaction so a
//! failure in either leaves the badge untouched.

use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::db::{connect, map_db_error};
use shared::http::{failure_response, message_response};
use shared::secrets::{resolve_secret, DatabaseSecret};
use shared::Config;

/// Application state
struct AppState {
    secrets: aws_sdk_secretsmanager::Client,
    config: Config,
}

impl AppState {
    async fn new() -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            secrets: aws_sdk_secretsmanager::Client::new(&aws_config),
            config: Config::from_env(),
        }
    }
}

// Ordered cascade: the dependent foreign key is nulled first, the badge
// row is deleted last. The rows affected by the final statement decide
// whether the badge existed at all.
const CASCADE_PLAN: [&str; 2] = [
    "UPDATE Users SET fk_id_badge = NULL WHERE fk_id_badge = ?",
    "DELETE FROM Badges WHERE id_badge = ?",
];

fn check_deleted(rows_affected: u64) -> shared::Result<()> {
    if rows_affected == 0 {
        return Err(shared::Error::NotFound("Badge not found".to_string()));
    }
    Ok(())
}

async fn delete_badge(conn: &mut MySqlConnection, id_badge: i64) -> shared::Result<()> {
    let mut tx = conn.begin().await.map_err(map_db_error)?;

    // Statements run in plan order inside one transaction. An early return
    // here drops the transaction uncommitted, so a failed first statement
    // leaves the badge row untouched.
    let mut rows_affected = 0;
    for sql in CASCADE_PLAN {
        let done = sqlx::query(sql)
            .bind(id_badge)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        rows_affected = done.rows_affected();
    }

    if let Err(e) = check_deleted(rows_affected) {
        tx.rollback().await.map_err(map_db_error)?;
        return Err(e);
    }

    tx.commit().await.map_err(map_db_error)?;
    Ok(())
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let params = event.query_string_parameters();
    let id_badge: i64 = match params.first("id_badge").and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => return message_response(400, "Missing or invalid id_badge"),
    };

    let secret: DatabaseSecret =
        match resolve_secret(&state.secrets, &state.config.db_secret_name).await {
            Ok(secret) => secret,
            Err(e) => return failure_response(&e),
        };

    let mut conn = match connect(&secret, &state.config.db_name).await {
        Ok(conn) => conn,
        Err(e) => return failure_response(&e),
    };

    let outcome = delete_badge(&mut conn, id_badge).await;
    let _ = conn.close().await;

    match outcome {
        Ok(()) => {
            info!("Deleted badge {}", id_badge);
            message_response(200, "Badge deleted successfully")
        }
        Err(e) => failure_response(&e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_is_nulled_before_the_parent_delete() {
        assert_eq!(CASCADE_PLAN.len(), 2);
        assert!(CASCADE_PLAN[0].starts_with("UPDATE Users SET fk_id_badge = NULL"));
        assert!(CASCADE_PLAN[1].starts_with("DELETE FROM Badges"));

        let delete_at = CASCADE_PLAN
            .iter()
            .position(|sql| sql.starts_with("DELETE"))
            .unwrap();
        assert_eq!(
            delete_at,
            CASCADE_PLAN.len() - 1,
            "the parent delete must run last"
        );
    }

    #[test]
    fn test_zero_deleted_rows_rolls_back_as_404() {
        let err = check_deleted(0).unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Badge not found");
    }

    #[test]
    fn test_deleted_row_commits() {
        assert!(check_deleted(1).is_ok());
    }
}
