use std::borrow::Cow;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{
        BantuanAddInputType, BantuanDetailType, BantuanListInputType, BantuanListOutputType, DisbursementStatus, DistribusiDetailType, DistribusiUpdateInputType, GrantStatus, PaginationInput,
        PaginationOutput,
    },
};

/**
 * Database response type for querying aid grants.
 */
pub type QueryBantuanDbResp = (i64, i64, i64, String, Decimal, Option<String>, DateTime<Utc>, DateTime<Utc>, String, String);

/**
 * Database response type for querying disbursement slots.
 */
pub type QueryDistribusiDbResp = (i64, i64, i64, String, Option<DateTime<Utc>>, Option<String>, DateTime<Utc>, String);

/**
 * SQL query next grant id.
 */
const NEXT_BANTUAN_ID: &str = "SELECT nextval('bantuan_id_seq')";

/**
 * SQL query to add a new grant.
 */
const ADD_BANTUAN: &str =
    "INSERT INTO bantuan (id, id_keluarga, tahun_anggaran, status, nominal_per_bulan, keterangan, ditetapkan_pada, inserted_by, updated_at, updated_by) VALUES ($1, $2, $3, $4, $5, $6, now(), $7, now(), $7)";

/**
 * SQL query to retrieve a single grant.
 */
const QUERY_BANTUAN: &str = "SELECT id, id_keluarga, tahun_anggaran, status, nominal_per_bulan, keterangan, ditetapkan_pada, updated_at, inserted_by, updated_by FROM bantuan WHERE id = $1";

/**
 * SQL query to retrieve a single grant with a row lock. Serializes the
 * activation check against concurrent activation of the same grant.
 */
const QUERY_BANTUAN_FOR_UPDATE: &str =
    "SELECT id, id_keluarga, tahun_anggaran, status, nominal_per_bulan, keterangan, ditetapkan_pada, updated_at, inserted_by, updated_by FROM bantuan WHERE id = $1 FOR UPDATE";

/**
 * SQL query to retrieve a list of grants filtered by budget year and status.
 */
const QUERY_BANTUAN_LIST: &str = "SELECT id, id_keluarga, tahun_anggaran, status, nominal_per_bulan, keterangan, ditetapkan_pada, updated_at, inserted_by, updated_by
                                 FROM bantuan
                                 WHERE ($1::bigint IS NULL OR tahun_anggaran = $1) AND
                                 ($2::varchar IS NULL OR status = $2)
                                 ORDER BY id
                                 LIMIT $3 OFFSET $4";

/**
 * SQL query to update a grant's status.
 */
const UPDATE_BANTUAN_STATUS: &str = "UPDATE bantuan SET status = $1, updated_by = $2, updated_at = now() WHERE id = $3";

/**
 * SQL query to delete a grant. Disbursement slots are owned by the grant and
 * removed through the cascading foreign key.
 */
const DELETE_BANTUAN: &str = "DELETE FROM bantuan WHERE id = $1";

/**
 * SQL query to create the 12 monthly slots of a grant as one batch. Insert or
 * ignore semantics on the (id_bantuan, bulan) key make the batch idempotent.
 */
const ADD_DISTRIBUSI_BATCH: &str = "INSERT INTO distribusi_bantuan (id_bantuan, bulan, status, updated_at, updated_by)
                                 SELECT $1, gs.bulan, 'belum_disalurkan', now(), $2 FROM generate_series(1, 12) AS gs(bulan)
                                 ON CONFLICT (id_bantuan, bulan) DO NOTHING";

/**
 * SQL query to count a grant's disbursement slots.
 */
const COUNT_DISTRIBUSI: &str = "SELECT count(*) FROM distribusi_bantuan WHERE id_bantuan = $1";

/**
 * SQL query to retrieve the slot statuses of a grant.
 */
const QUERY_DISTRIBUSI_STATUSES: &str = "SELECT status FROM distribusi_bantuan WHERE id_bantuan = $1";

/**
 * SQL query to retrieve a grant's disbursement slots in month order.
 */
const QUERY_DISTRIBUSI_LIST: &str = "SELECT id, id_bantuan, bulan, status, disalurkan_pada, catatan, updated_at, updated_by FROM distribusi_bantuan WHERE id_bantuan = $1 ORDER BY bulan";

/**
 * SQL query to retrieve a single disbursement slot with a row lock.
 */
const QUERY_DISTRIBUSI_FOR_UPDATE: &str = "SELECT id, id_bantuan, bulan, status, disalurkan_pada, catatan, updated_at, updated_by FROM distribusi_bantuan WHERE id = $1 FOR UPDATE";

/**
 * SQL query to mark a slot disbursed. Stamps the disbursement time and keeps
 * the previous note when no new note is supplied.
 */
const UPDATE_DISTRIBUSI_DISALURKAN: &str = "UPDATE distribusi_bantuan SET status = 'disalurkan', disalurkan_pada = now(), catatan = COALESCE($1, catatan), updated_by = $2, updated_at = now() WHERE id = $3";

/**
 * SQL query to mark a slot failed. The disbursement timestamp is left as is.
 */
const UPDATE_DISTRIBUSI_GAGAL: &str = "UPDATE distribusi_bantuan SET status = 'gagal', catatan = COALESCE($1, catatan), updated_by = $2, updated_at = now() WHERE id = $3";

impl TryFrom<QueryBantuanDbResp> for BantuanDetailType {
    type Error = ApplicationError;

    fn try_from(row: QueryBantuanDbResp) -> Result<Self, Self::Error> {
        let (id, id_keluarga, tahun_anggaran, status, nominal_per_bulan, keterangan, ditetapkan_pada, updated_at, inserted_by, updated_by) = row;
        Ok(BantuanDetailType { id, id_keluarga, tahun_anggaran, status: GrantStatus::parse(&status)?, nominal_per_bulan, keterangan, ditetapkan_pada, updated_at, inserted_by, updated_by })
    }
}

impl TryFrom<QueryDistribusiDbResp> for DistribusiDetailType {
    type Error = ApplicationError;

    fn try_from(row: QueryDistribusiDbResp) -> Result<Self, Self::Error> {
        let (id, id_bantuan, bulan, status, disalurkan_pada, catatan, updated_at, updated_by) = row;
        Ok(DistribusiDetailType { id, id_bantuan, bulan, status: DisbursementStatus::parse(&status)?, disalurkan_pada, catatan, updated_at, updated_by })
    }
}

/**
 * DAO for grant and disbursement database operations.
 */
pub struct BantuanDao {}

impl BantuanDao {
    /**
     * Creates a new instance of `BantuanDao`.
     *
     * # Returns
     * A new instance of `BantuanDao`.
     */
    pub fn new() -> Self {
        BantuanDao {}
    }

    /**
     * Adds a new grant in the ditetapkan state.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `bantuan_add_input`: The input containing details of the grant to be added.
     *
     * # Returns
     * A Result containing the id of the new grant or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_bantuan(&self, transaction: &mut PgConnection, bantuan_add_input: BantuanAddInputType) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let next_id: (i64,) = sqlx::query_as(NEXT_BANTUAN_ID).fetch_one(transaction.as_mut()).instrument(span.clone()).await.map_err(|err| Self::handle_database_error(err.as_database_error()))?;

        sqlx::query(ADD_BANTUAN)
            .bind(next_id.0)
            .bind(bantuan_add_input.id_keluarga)
            .bind(bantuan_add_input.tahun_anggaran)
            .bind(GrantStatus::Ditetapkan.as_str())
            .bind(bantuan_add_input.nominal_per_bulan)
            .bind(bantuan_add_input.keterangan)
            .bind(bantuan_add_input.claim_name)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        Ok(next_id.0)
    }

    /**
     * Retrieves a single grant by its id.
     *
     * # Arguments
     * `connection`: The database connection.
     * `bantuan_id`: The id of the grant.
     *
     * # Returns
     * A Result containing `BantuanDetailType` or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_bantuan(&self, connection: &mut PgConnection, bantuan_id: i64) -> Result<BantuanDetailType, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryBantuanDbResp> = sqlx::query_as(QUERY_BANTUAN)
            .bind(bantuan_id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get grant: {err}")))?;
        let Some(row) = result else {
            return Err(ApplicationError::new(ErrorType::NotFound, "Grant not found".to_string()));
        };
        BantuanDetailType::try_from(row)
    }

    /**
     * Retrieves a single grant by its id with a row lock. Used by mutating
     * operations to serialize per-grant state changes.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `bantuan_id`: The id of the grant.
     *
     * # Returns
     * A Result containing `BantuanDetailType` or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn get_bantuan_for_update(&self, transaction: &mut PgConnection, bantuan_id: i64) -> Result<BantuanDetailType, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryBantuanDbResp> = sqlx::query_as(QUERY_BANTUAN_FOR_UPDATE)
            .bind(bantuan_id)
            .fetch_optional(transaction)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to lock grant: {err}")))?;
        let Some(row) = result else {
            return Err(ApplicationError::new(ErrorType::NotFound, "Grant not found".to_string()));
        };
        BantuanDetailType::try_from(row)
    }

    /**
     * Retrieves a list of grants based on the provided pagination input and filter parameters.
     *
     * # Arguments
     * `connection`: The database connection.
     * `pagination_input`: The pagination input containing start index and page size.
     * `filter_params`: The filter parameters for budget year and status.
     *
     * # Returns
     * A Result containing the `BantuanListOutputType` with the retrieved grants and pagination information.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_bantuan_list(&self, connection: &mut PgConnection, pagination_input: PaginationInput, filter_params: BantuanListInputType) -> Result<BantuanListOutputType, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryBantuanDbResp> = sqlx::query_as(QUERY_BANTUAN_LIST)
            .bind(filter_params.tahun_anggaran)
            .bind(filter_params.status.map(|status| status.as_str()))
            .bind(pagination_input.page_size + 1)
            .bind(pagination_input.start_index)
            .fetch_all(connection)
            .instrument(span.clone())
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query for grant list: {err}")))?;
        let mut elements: Vec<BantuanDetailType> = results.into_iter().map(BantuanDetailType::try_from).collect::<Result<Vec<_>, _>>()?;
        let pagination_output = Self::get_pagination_output(
            &pagination_input,
            i64::try_from(elements.len()).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Failed to get pagination output: {err}")))?,
        );
        elements.truncate(usize::try_from(pagination_input.page_size).map_err(|err| ApplicationError::new(ErrorType::Validation, format!("Failed to truncate elements: {err}")))?);
        Ok(BantuanListOutputType::new(elements, pagination_output))
    }

    /**
     * Updates a grant's status.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `bantuan_id`: The id of the grant.
     * `status`: The status to set.
     * `claim_name`: The operator performing the update.
     *
     * # Returns
     * A result indicating success or failure of the operation.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_bantuan_status(&self, transaction: &mut PgConnection, bantuan_id: i64, status: GrantStatus, claim_name: &str) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_BANTUAN_STATUS)
            .bind(status.as_str())
            .bind(claim_name)
            .bind(bantuan_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Grant with ID {} not found for status update", bantuan_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Grant not found".to_string()));
        }
        if result.rows_affected() > 1 {
            tracing::warn!("Multiple grants attempted updated. Rolled back");
            return Err(ApplicationError::new(ErrorType::Application, "Multiple grants attempted updated. Rolled back".to_string()));
        }
        Ok(())
    }

    /**
     * Deletes a grant from the database by its id.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `bantuan_id`: The id of the grant to be deleted.
     *
     * # Returns
     * A result indicating success or failure of the operation.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn delete_bantuan(&self, transaction: &mut PgConnection, bantuan_id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_BANTUAN)
            .bind(bantuan_id)
            .execute(transaction)
            .instrument(span.clone())
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to delete grant: {err}")))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Grant with ID {} not found for deletion", bantuan_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Grant not found".to_string()));
        }
        if result.rows_affected() > 1 {
            tracing::warn!("Multiple grants attempted deleted. Rolled back");
            return Err(ApplicationError::new(ErrorType::Application, "Multiple grants attempted deleted. Rolled back".to_string()));
        }
        Ok(())
    }

    /**
     * Creates the 12 monthly slots of a grant as one batch. Slots that already
     * exist are left untouched, so the batch may be re-run on an activated
     * grant without duplicating months.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `bantuan_id`: The id of the grant the slots belong to.
     * `claim_name`: The operator performing the activation.
     *
     * # Returns
     * A Result containing the number of slots inserted or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_distribusi_batch(&self, transaction: &mut PgConnection, bantuan_id: i64, claim_name: &str) -> Result<u64, ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(ADD_DISTRIBUSI_BATCH)
            .bind(bantuan_id)
            .bind(claim_name)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        Ok(result.rows_affected())
    }

    /**
     * Counts a grant's disbursement slots.
     *
     * # Arguments
     * `connection`: The database connection.
     * `bantuan_id`: The id of the grant.
     *
     * # Returns
     * A Result containing the slot count or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn count_distribusi(&self, connection: &mut PgConnection, bantuan_id: i64) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let count: (i64,) = sqlx::query_as(COUNT_DISTRIBUSI)
            .bind(bantuan_id)
            .fetch_one(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to count slots: {err}")))?;
        Ok(count.0)
    }

    /**
     * Retrieves the slot statuses of a grant. The summary derivation works on
     * statuses alone, so the full rows are not loaded.
     *
     * # Arguments
     * `connection`: The database connection.
     * `bantuan_id`: The id of the grant.
     *
     * # Returns
     * A Result containing the statuses or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_distribusi_statuses(&self, connection: &mut PgConnection, bantuan_id: i64) -> Result<Vec<DisbursementStatus>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<(String,)> = sqlx::query_as(QUERY_DISTRIBUSI_STATUSES)
            .bind(bantuan_id)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query for slot statuses: {err}")))?;
        results.into_iter().map(|(status,)| DisbursementStatus::parse(&status)).collect()
    }

    /**
     * Retrieves a grant's disbursement slots in month order.
     *
     * # Arguments
     * `connection`: The database connection.
     * `bantuan_id`: The id of the grant.
     *
     * # Returns
     * A Result containing the slots or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_distribusi_list(&self, connection: &mut PgConnection, bantuan_id: i64) -> Result<Vec<DistribusiDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryDistribusiDbResp> = sqlx::query_as(QUERY_DISTRIBUSI_LIST)
            .bind(bantuan_id)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query for slot list: {err}")))?;
        results.into_iter().map(DistribusiDetailType::try_from).collect()
    }

    /**
     * Retrieves a single disbursement slot by its id with a row lock.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `distribusi_id`: The id of the slot.
     *
     * # Returns
     * A Result containing `DistribusiDetailType` or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn get_distribusi_for_update(&self, transaction: &mut PgConnection, distribusi_id: i64) -> Result<DistribusiDetailType, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryDistribusiDbResp> = sqlx::query_as(QUERY_DISTRIBUSI_FOR_UPDATE)
            .bind(distribusi_id)
            .fetch_optional(transaction)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to lock slot: {err}")))?;
        let Some(row) = result else {
            return Err(ApplicationError::new(ErrorType::NotFound, "Disbursement not found".to_string()));
        };
        DistribusiDetailType::try_from(row)
    }

    /**
     * Marks a slot disbursed, stamping the disbursement time.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `distribusi_id`: The id of the slot.
     * `update_input`: The input carrying the optional note and the operator.
     *
     * # Returns
     * A result indicating success or failure of the operation.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_distribusi_disalurkan(&self, transaction: &mut PgConnection, distribusi_id: i64, update_input: DistribusiUpdateInputType) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_DISTRIBUSI_DISALURKAN)
            .bind(update_input.catatan)
            .bind(update_input.claim_name)
            .bind(distribusi_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Disbursement with id {} not found for update", distribusi_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Disbursement not found".to_string()));
        }
        if result.rows_affected() > 1 {
            tracing::warn!("Multiple disbursements attempted updated. Rolled back");
            return Err(ApplicationError::new(ErrorType::Application, "Multiple disbursements attempted updated. Rolled back".to_string()));
        }
        Ok(())
    }

    /**
     * Marks a slot failed. The disbursement timestamp is not touched, a
     * previously stamped payment time survives the failure mark.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `distribusi_id`: The id of the slot.
     * `update_input`: The input carrying the optional note and the operator.
     *
     * # Returns
     * A result indicating success or failure of the operation.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_distribusi_gagal(&self, transaction: &mut PgConnection, distribusi_id: i64, update_input: DistribusiUpdateInputType) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_DISTRIBUSI_GAGAL)
            .bind(update_input.catatan)
            .bind(update_input.claim_name)
            .bind(distribusi_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Disbursement with id {} not found for update", distribusi_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Disbursement not found".to_string()));
        }
        if result.rows_affected() > 1 {
            tracing::warn!("Multiple disbursements attempted updated. Rolled back");
            return Err(ApplicationError::new(ErrorType::Application, "Multiple disbursements attempted updated. Rolled back".to_string()));
        }
        Ok(())
    }

    /**
     * Constructs a `PaginationOutput` based on the pagination input and the number of elements.
     *
     * # Arguments
     * `pagination_input`: The input containing pagination parameters.
     * `elements_size`: The number of elements retrieved from the database.
     *
     * # Returns
     * A `PaginationOutput` instance containing pagination details.
     */
    fn get_pagination_output(pagination_input: &PaginationInput, elements_size: i64) -> PaginationOutput {
        let has_more_elements = elements_size > pagination_input.page_size;
        PaginationOutput::new(pagination_input.start_index, pagination_input.page_size, has_more_elements)
    }

    /**
     * Handles database errors and maps them to application errors.
     *
     * # Arguments
     * `error`: The database error to handle.
     *
     * # Returns
     * An `ApplicationError` corresponding to the database error.
     */
    fn handle_database_error(error: Option<&dyn sqlx::error::DatabaseError>) -> ApplicationError {
        if let Some(db_error) = error {
            tracing::debug!("Database error: {}", db_error);
            tracing::info!("Add/Update error: {:?}", db_error.code());
            if db_error.code() == Some(Cow::Borrowed("23505")) {
                // Unique violation
                return ApplicationError::new(ErrorType::ConstraintViolation, "Already exists".to_string());
            } else if db_error.code() == Some(Cow::Borrowed("23503")) {
                // Foreign key violation
                return ApplicationError::new(ErrorType::ConstraintViolation, "Missing parent value".to_string());
            } else if db_error.code() == Some(Cow::Borrowed("22001")) {
                // Value too long
                return ApplicationError::new(ErrorType::Validation, "Value too long".to_string());
            }
            tracing::error!("Unhandled database error: {}", db_error);
            return ApplicationError::new(ErrorType::DatabaseError, "Unhandled database error".to_string());
        }
        ApplicationError::new(ErrorType::DatabaseError, "Failed to execute database operation".to_string())
    }
}

#[cfg(test)]
mod test {
    use crate::{dao::bantuan::BantuanDao, model::models::PaginationInput};

    #[test]
    fn test_pagination_output_has_more() {
        let pagination_input = PaginationInput { start_index: 0, page_size: 10 };
        let elements_size = 11;
        let pagination_output = BantuanDao::get_pagination_output(&pagination_input, elements_size);
        assert_eq!(pagination_output.start_index, 0);
        assert_eq!(pagination_output.page_size, 10);
        assert!(pagination_output.has_more);
    }

    #[test]
    fn test_pagination_output_has_no_more() {
        let pagination_input = PaginationInput { start_index: 0, page_size: 10 };
        let elements_size = 10;
        let pagination_output = BantuanDao::get_pagination_output(&pagination_input, elements_size);
        assert_eq!(pagination_output.start_index, 0);
        assert_eq!(pagination_output.page_size, 10);
        assert!(!pagination_output.has_more);
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn add_input(id_keluarga: i64) -> BantuanAddInputType {
        BantuanAddInputType { id_keluarga, tahun_anggaran: 2025, nominal_per_bulan: Decimal::new(300_000, 0), keterangan: None, claim_name: "test_user".to_string() }
    }

    #[sqlx::test]
    async fn test_add_then_get_bantuan() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let bantuan_dao = BantuanDao::new();
        let bantuan_id = bantuan_dao.add_bantuan(&mut transaction, add_input(1)).await.unwrap();
        let bantuan = bantuan_dao.get_bantuan(&mut transaction, bantuan_id).await.unwrap();
        assert_eq!(bantuan.status, GrantStatus::Ditetapkan);
        assert_eq!(bantuan.tahun_anggaran, 2025);
        assert_eq!(bantuan.nominal_per_bulan, Decimal::new(300_000, 0));
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_distribusi_batch_is_idempotent() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let bantuan_dao = BantuanDao::new();
        let bantuan_id = bantuan_dao.add_bantuan(&mut transaction, add_input(2)).await.unwrap();
        let inserted = bantuan_dao.add_distribusi_batch(&mut transaction, bantuan_id, "test_user").await.unwrap();
        assert_eq!(inserted, 12);
        let inserted_again = bantuan_dao.add_distribusi_batch(&mut transaction, bantuan_id, "test_user").await.unwrap();
        assert_eq!(inserted_again, 0);
        let count = bantuan_dao.count_distribusi(&mut transaction, bantuan_id).await.unwrap();
        assert_eq!(count, 12);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_disburse_then_fail_keeps_timestamp() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let bantuan_dao = BantuanDao::new();
        let bantuan_id = bantuan_dao.add_bantuan(&mut transaction, add_input(3)).await.unwrap();
        bantuan_dao.add_distribusi_batch(&mut transaction, bantuan_id, "test_user").await.unwrap();
        let slots = bantuan_dao.get_distribusi_list(&mut transaction, bantuan_id).await.unwrap();
        assert_eq!(slots.len(), 12);
        let first = &slots[0];
        let update_input = DistribusiUpdateInputType { catatan: Some("paid".to_string()), claim_name: "test_user".to_string() };
        bantuan_dao.update_distribusi_disalurkan(&mut transaction, first.id, update_input).await.unwrap();
        let disbursed = bantuan_dao.get_distribusi_for_update(&mut transaction, first.id).await.unwrap();
        assert_eq!(disbursed.status, DisbursementStatus::Disalurkan);
        assert!(disbursed.disalurkan_pada.is_some());
        let fail_input = DistribusiUpdateInputType { catatan: Some("bank rejected".to_string()), claim_name: "test_user".to_string() };
        bantuan_dao.update_distribusi_gagal(&mut transaction, first.id, fail_input).await.unwrap();
        let failed = bantuan_dao.get_distribusi_for_update(&mut transaction, first.id).await.unwrap();
        assert_eq!(failed.status, DisbursementStatus::Gagal);
        assert_eq!(failed.disalurkan_pada, disbursed.disalurkan_pada);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_delete_bantuan_cascades_to_distribusi() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let bantuan_dao = BantuanDao::new();
        let bantuan_id = bantuan_dao.add_bantuan(&mut transaction, add_input(4)).await.unwrap();
        bantuan_dao.add_distribusi_batch(&mut transaction, bantuan_id, "test_user").await.unwrap();
        bantuan_dao.delete_bantuan(&mut transaction, bantuan_id).await.unwrap();
        let count = bantuan_dao.count_distribusi(&mut transaction, bantuan_id).await.unwrap();
        assert_eq!(count, 0);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_list_bantuan_filters() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let bantuan_dao = BantuanDao::new();
        bantuan_dao.add_bantuan(&mut transaction, add_input(5)).await.unwrap();
        let filter = BantuanListInputType { tahun_anggaran: Some(2025), status: Some(GrantStatus::Ditetapkan) };
        let listed = bantuan_dao.get_bantuan_list(&mut transaction, PaginationInput { start_index: 0, page_size: 10 }, filter).await.unwrap();
        assert!(!listed.bantuan.is_empty());
        let filter_other_year = BantuanListInputType { tahun_anggaran: Some(1999), status: None };
        let listed_other = bantuan_dao.get_bantuan_list(&mut transaction, PaginationInput { start_index: 0, page_size: 10 }, filter_other_year).await.unwrap();
        assert!(listed_other.bantuan.is_empty());
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
