use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::ActivityLogEntryType,
};

/**
 * SQL query to append an activity log entry. The log is append only, there
 * are no update or delete queries for it.
 */
const ADD_ACTIVITY_LOG_ENTRY: &str = "INSERT INTO activity_log (actor, action, target_table, target_id, old_value, new_value, ip_address, remarks, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())";

/**
 * DAO for the append-only activity log.
 */
pub struct ActivityLogDao {}

impl ActivityLogDao {
    /**
     * Creates a new instance of `ActivityLogDao`.
     *
     * # Returns
     * A new instance of `ActivityLogDao`.
     */
    pub fn new() -> Self {
        ActivityLogDao {}
    }

    /**
     * Appends an entry to the activity log. Executed inside the same
     * transaction as the mutation it records, so a rolled back action leaves
     * no log entry.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `entry`: The entry to append.
     *
     * # Returns
     * A result indicating success or failure of the operation.
     */
    #[instrument(skip(self, transaction, entry), fields(result))]
    pub async fn add_entry(&self, transaction: &mut PgConnection, entry: ActivityLogEntryType) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query(ADD_ACTIVITY_LOG_ENTRY)
            .bind(entry.actor)
            .bind(entry.action)
            .bind(entry.target_table)
            .bind(entry.target_id)
            .bind(entry.old_value)
            .bind(entry.new_value)
            .bind(entry.ip_address)
            .bind(entry.remarks)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to append activity log entry: {err}")))?;
        Ok(())
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::model::models::ACTION_PENETAPAN_BANTUAN;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_add_entry() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let activity_log_dao = ActivityLogDao::new();
        let entry = ActivityLogEntryType::new(
            "test_user".to_string(),
            ACTION_PENETAPAN_BANTUAN,
            "bantuan",
            1,
            None,
            Some("{\"status\":\"ditetapkan\"}".to_string()),
            Some("127.0.0.1".to_string()),
            None,
        );
        let result = activity_log_dao.add_entry(&mut transaction, entry).await;
        assert!(result.is_ok());
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    /**
     * Initialize the database connection pool.
     */
    async fn init_db() -> PgPool {
        dotenv::from_filename("./sqlx-postgresql-migration/.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&pool).await.unwrap();
        pool
    }
}
