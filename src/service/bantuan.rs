use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    dao::{activity_log::ActivityLogDao, bantuan::BantuanDao},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{
            ACTION_AKTIVASI_BANTUAN, ACTION_DISTRIBUSI_BANTUAN, ACTION_DISTRIBUSI_GAGAL, ACTION_PEMBATALAN_BANTUAN, ACTION_PENETAPAN_BANTUAN, ACTION_PENGHAPUSAN_BANTUAN,
            ACTION_PENYELESAIAN_BANTUAN, ActivityLogEntryType, BantuanAddInputType, BantuanDetailType, BantuanListInputType, BantuanListOutputType, DistribusiDetailType,
            DistribusiUpdateInputType, GrantStatus, GrantSummaryType, MONTHS_PER_YEAR, PaginationInput,
        },
    },
};

/**
 * Table name used for grant entries in the activity log.
 */
const TABLE_BANTUAN: &str = "bantuan";

/**
 * Table name used for disbursement entries in the activity log.
 */
const TABLE_DISTRIBUSI: &str = "distribusi_bantuan";

/**
 * Represents the service for managing the aid grant lifecycle. Every mutating
 * operation runs in one transaction together with its activity log entry.
 * Actor identity and origin address always arrive as explicit parameters.
 */
pub struct BantuanService {
    /**
     * The DAO for grant and disbursement operations.
     */
    bantuan_dao: BantuanDao,
    /**
     * The DAO for the activity log.
     */
    activity_log_dao: ActivityLogDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
}

impl BantuanService {
    /**
     * Creates a new instance of `BantuanService`.
     *
     * # Arguments
     * `bantuan_dao`: The DAO for grant and disbursement operations.
     * `activity_log_dao`: The DAO for the activity log.
     * `connection_pool`: Optional connection pool for database operations.
     *
     * # Returns
     * A new instance of `BantuanService`.
     */
    pub fn new(bantuan_dao: BantuanDao, activity_log_dao: ActivityLogDao, connection_pool: Option<Pool<Postgres>>) -> Self {
        BantuanService { bantuan_dao, activity_log_dao, connection_pool }
    }

    /**
     * Establishes a new grant in the ditetapkan state. No disbursement slots
     * are created until activation.
     *
     * # Arguments
     * `bantuan_add_input`: The input containing details of the grant.
     * `origin`: Network address of the caller, recorded in the activity log.
     *
     * # Returns
     * A Result containing the id of the new grant or an `ApplicationError`.
     */
    pub async fn add_bantuan(&self, bantuan_add_input: BantuanAddInputType, origin: Option<String>) -> Result<i64, ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = self.add_bantuan_in_transaction(&mut transaction, bantuan_add_input, origin).await;
        match result {
            Ok(bantuan_id) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(bantuan_id)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    async fn add_bantuan_in_transaction(&self, transaction: &mut PgConnection, bantuan_add_input: BantuanAddInputType, origin: Option<String>) -> Result<i64, ApplicationError> {
        let actor = bantuan_add_input.claim_name.clone();
        let new_value = serde_json::json!({
            "idKeluarga": bantuan_add_input.id_keluarga,
            "tahunAnggaran": bantuan_add_input.tahun_anggaran,
            "nominalPerBulan": bantuan_add_input.nominal_per_bulan,
            "status": GrantStatus::Ditetapkan,
        })
        .to_string();
        let bantuan_id = self.bantuan_dao.add_bantuan(transaction, bantuan_add_input).await?;
        let entry = ActivityLogEntryType::new(actor, ACTION_PENETAPAN_BANTUAN, TABLE_BANTUAN, bantuan_id, None, Some(new_value), origin, None);
        self.activity_log_dao.add_entry(transaction, entry).await?;
        Ok(bantuan_id)
    }

    /**
     * Retrieves a single grant by its id.
     *
     * # Arguments
     * `bantuan_id`: The id of the grant.
     *
     * # Returns
     * A Result containing `BantuanDetailType` or an `ApplicationError`.
     */
    pub async fn get_bantuan(&self, bantuan_id: i64) -> Result<BantuanDetailType, ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut connection = connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.bantuan_dao.get_bantuan(&mut connection, bantuan_id).await
    }

    /**
     * Retrieves a list of grants based on the provided pagination input and filter parameters.
     *
     * # Arguments
     * `pagination_input`: `PaginationInput` containing pagination information.
     * `filter_params`: `BantuanListInputType` containing filter parameters.
     *
     * # Returns
     * A Result containing `BantuanListOutputType` or an `ApplicationError`.
     */
    pub async fn get_bantuan_list(&self, pagination_input: PaginationInput, filter_params: BantuanListInputType) -> Result<BantuanListOutputType, ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut connection = connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.bantuan_dao.get_bantuan_list(&mut connection, pagination_input, filter_params).await
    }

    /**
     * Activates a grant. Creates the 12 monthly disbursement slots when they
     * do not exist yet and sets the status to aktif. Idempotent, a second
     * activation only re-applies the status. Status change and slot creation
     * commit or roll back as one unit.
     *
     * # Arguments
     * `bantuan_id`: The id of the grant.
     * `claim_name`: The operator performing the activation.
     * `origin`: Network address of the caller, recorded in the activity log.
     *
     * # Returns
     * A Result containing the updated `BantuanDetailType` or an `ApplicationError`.
     */
    pub async fn activate_bantuan(&self, bantuan_id: i64, claim_name: String, origin: Option<String>) -> Result<BantuanDetailType, ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = self.activate_bantuan_in_transaction(&mut transaction, bantuan_id, claim_name, origin).await;
        match result {
            Ok(bantuan) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(bantuan)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    async fn activate_bantuan_in_transaction(&self, transaction: &mut PgConnection, bantuan_id: i64, claim_name: String, origin: Option<String>) -> Result<BantuanDetailType, ApplicationError> {
        let mut bantuan = self.bantuan_dao.get_bantuan_for_update(transaction, bantuan_id).await?;
        if !bantuan.status.can_activate() {
            return Err(ApplicationError::new(ErrorType::InvalidTransition, format!("Cannot activate a grant in status {}", bantuan.status.as_str())));
        }
        self.bantuan_dao.add_distribusi_batch(transaction, bantuan_id, &claim_name).await?;
        let slot_count = self.bantuan_dao.count_distribusi(transaction, bantuan_id).await?;
        if slot_count != MONTHS_PER_YEAR {
            return Err(ApplicationError::new(ErrorType::Concurrency, format!("Disbursement schedule holds {slot_count} slots instead of {MONTHS_PER_YEAR}")));
        }
        self.bantuan_dao.update_bantuan_status(transaction, bantuan_id, GrantStatus::Aktif, &claim_name).await?;
        let entry = ActivityLogEntryType::new(
            claim_name,
            ACTION_AKTIVASI_BANTUAN,
            TABLE_BANTUAN,
            bantuan_id,
            Some(Self::status_snapshot(bantuan.status)),
            Some(Self::status_snapshot(GrantStatus::Aktif)),
            origin,
            None,
        );
        self.activity_log_dao.add_entry(transaction, entry).await?;
        bantuan.status = GrantStatus::Aktif;
        Ok(bantuan)
    }

    /**
     * Completes a grant. Disbursement slots are not touched.
     *
     * # Arguments
     * `bantuan_id`: The id of the grant.
     * `claim_name`: The operator performing the completion.
     * `origin`: Network address of the caller, recorded in the activity log.
     *
     * # Returns
     * A Result containing the updated `BantuanDetailType` or an `ApplicationError`.
     */
    pub async fn complete_bantuan(&self, bantuan_id: i64, claim_name: String, origin: Option<String>) -> Result<BantuanDetailType, ApplicationError> {
        self.transition_bantuan(bantuan_id, claim_name, origin, GrantStatus::Selesai, ACTION_PENYELESAIAN_BANTUAN).await
    }

    /**
     * Cancels a grant. Terminal, slots are not cascaded.
     *
     * # Arguments
     * `bantuan_id`: The id of the grant.
     * `claim_name`: The operator performing the cancellation.
     * `origin`: Network address of the caller, recorded in the activity log.
     *
     * # Returns
     * A Result containing the updated `BantuanDetailType` or an `ApplicationError`.
     */
    pub async fn cancel_bantuan(&self, bantuan_id: i64, claim_name: String, origin: Option<String>) -> Result<BantuanDetailType, ApplicationError> {
        self.transition_bantuan(bantuan_id, claim_name, origin, GrantStatus::Dibatalkan, ACTION_PEMBATALAN_BANTUAN).await
    }

    async fn transition_bantuan(&self, bantuan_id: i64, claim_name: String, origin: Option<String>, target: GrantStatus, action: &str) -> Result<BantuanDetailType, ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = self.transition_bantuan_in_transaction(&mut transaction, bantuan_id, claim_name, origin, target, action).await;
        match result {
            Ok(bantuan) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(bantuan)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    async fn transition_bantuan_in_transaction(
        &self,
        transaction: &mut PgConnection,
        bantuan_id: i64,
        claim_name: String,
        origin: Option<String>,
        target: GrantStatus,
        action: &str,
    ) -> Result<BantuanDetailType, ApplicationError> {
        let mut bantuan = self.bantuan_dao.get_bantuan_for_update(transaction, bantuan_id).await?;
        let allowed = match target {
            GrantStatus::Selesai => bantuan.status.can_complete(),
            GrantStatus::Dibatalkan => bantuan.status.can_cancel(),
            GrantStatus::Ditetapkan | GrantStatus::Aktif => false,
        };
        if !allowed {
            return Err(ApplicationError::new(
                ErrorType::InvalidTransition,
                format!("Cannot change a grant in status {} to {}", bantuan.status.as_str(), target.as_str()),
            ));
        }
        self.bantuan_dao.update_bantuan_status(transaction, bantuan_id, target, &claim_name).await?;
        let entry = ActivityLogEntryType::new(claim_name, action, TABLE_BANTUAN, bantuan_id, Some(Self::status_snapshot(bantuan.status)), Some(Self::status_snapshot(target)), origin, None);
        self.activity_log_dao.add_entry(transaction, entry).await?;
        bantuan.status = target;
        Ok(bantuan)
    }

    /**
     * Deletes a grant. The owned disbursement slots are removed with it.
     *
     * # Arguments
     * `bantuan_id`: The id of the grant to be deleted.
     * `claim_name`: The operator performing the deletion.
     * `origin`: Network address of the caller, recorded in the activity log.
     *
     * # Returns
     * A Result indicating success or an `ApplicationError`.
     */
    pub async fn delete_bantuan(&self, bantuan_id: i64, claim_name: String, origin: Option<String>) -> Result<(), ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = self.delete_bantuan_in_transaction(&mut transaction, bantuan_id, claim_name, origin).await;
        match result {
            Ok(()) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(())
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    async fn delete_bantuan_in_transaction(&self, transaction: &mut PgConnection, bantuan_id: i64, claim_name: String, origin: Option<String>) -> Result<(), ApplicationError> {
        let bantuan = self.bantuan_dao.get_bantuan_for_update(transaction, bantuan_id).await?;
        let old_value = serde_json::json!({
            "idKeluarga": bantuan.id_keluarga,
            "tahunAnggaran": bantuan.tahun_anggaran,
            "nominalPerBulan": bantuan.nominal_per_bulan,
            "status": bantuan.status,
        })
        .to_string();
        self.bantuan_dao.delete_bantuan(transaction, bantuan_id).await?;
        let entry = ActivityLogEntryType::new(claim_name, ACTION_PENGHAPUSAN_BANTUAN, TABLE_BANTUAN, bantuan_id, Some(old_value), None, origin, None);
        self.activity_log_dao.add_entry(transaction, entry).await?;
        Ok(())
    }

    /**
     * Marks a monthly slot disbursed. Permitted while the slot is pending or
     * failed, a retry after failure is an ordinary disbursement. Re-disbursing
     * an already disbursed slot is rejected so the original payment time is
     * never overwritten.
     *
     * # Arguments
     * `distribusi_id`: The id of the slot.
     * `update_input`: The input carrying the optional note and the operator.
     * `origin`: Network address of the caller, recorded in the activity log.
     *
     * # Returns
     * A Result containing the updated `DistribusiDetailType` or an `ApplicationError`.
     */
    pub async fn disburse(&self, distribusi_id: i64, update_input: DistribusiUpdateInputType, origin: Option<String>) -> Result<DistribusiDetailType, ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = self.disburse_in_transaction(&mut transaction, distribusi_id, update_input, origin).await;
        match result {
            Ok(distribusi) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(distribusi)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    async fn disburse_in_transaction(&self, transaction: &mut PgConnection, distribusi_id: i64, update_input: DistribusiUpdateInputType, origin: Option<String>) -> Result<DistribusiDetailType, ApplicationError> {
        let distribusi = self.bantuan_dao.get_distribusi_for_update(transaction, distribusi_id).await?;
        if !distribusi.status.can_disburse() {
            return Err(ApplicationError::new(ErrorType::InvalidTransition, format!("Cannot disburse a slot in status {}", distribusi.status.as_str())));
        }
        let claim_name = update_input.claim_name.clone();
        let remarks = update_input.catatan.clone();
        self.bantuan_dao.update_distribusi_disalurkan(transaction, distribusi_id, update_input).await?;
        let updated = self.bantuan_dao.get_distribusi_for_update(transaction, distribusi_id).await?;
        let entry = ActivityLogEntryType::new(
            claim_name,
            ACTION_DISTRIBUSI_BANTUAN,
            TABLE_DISTRIBUSI,
            distribusi_id,
            Some(Self::distribusi_snapshot(&distribusi)),
            Some(Self::distribusi_snapshot(&updated)),
            origin,
            remarks,
        );
        self.activity_log_dao.add_entry(transaction, entry).await?;
        Ok(updated)
    }

    /**
     * Marks a monthly slot failed. Permitted from every status. A payment
     * timestamp stamped by an earlier disbursement is left in place.
     *
     * # Arguments
     * `distribusi_id`: The id of the slot.
     * `update_input`: The input carrying the optional note and the operator.
     * `origin`: Network address of the caller, recorded in the activity log.
     *
     * # Returns
     * A Result containing the updated `DistribusiDetailType` or an `ApplicationError`.
     */
    pub async fn mark_failed(&self, distribusi_id: i64, update_input: DistribusiUpdateInputType, origin: Option<String>) -> Result<DistribusiDetailType, ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut transaction = connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = self.mark_failed_in_transaction(&mut transaction, distribusi_id, update_input, origin).await;
        match result {
            Ok(distribusi) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(distribusi)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    async fn mark_failed_in_transaction(&self, transaction: &mut PgConnection, distribusi_id: i64, update_input: DistribusiUpdateInputType, origin: Option<String>) -> Result<DistribusiDetailType, ApplicationError> {
        let distribusi = self.bantuan_dao.get_distribusi_for_update(transaction, distribusi_id).await?;
        if !distribusi.status.can_mark_failed() {
            return Err(ApplicationError::new(ErrorType::InvalidTransition, format!("Cannot fail a slot in status {}", distribusi.status.as_str())));
        }
        let claim_name = update_input.claim_name.clone();
        let remarks = update_input.catatan.clone();
        self.bantuan_dao.update_distribusi_gagal(transaction, distribusi_id, update_input).await?;
        let updated = self.bantuan_dao.get_distribusi_for_update(transaction, distribusi_id).await?;
        let entry = ActivityLogEntryType::new(
            claim_name,
            ACTION_DISTRIBUSI_GAGAL,
            TABLE_DISTRIBUSI,
            distribusi_id,
            Some(Self::distribusi_snapshot(&distribusi)),
            Some(Self::distribusi_snapshot(&updated)),
            origin,
            remarks,
        );
        self.activity_log_dao.add_entry(transaction, entry).await?;
        Ok(updated)
    }

    /**
     * Retrieves a grant's disbursement slots in month order.
     *
     * # Arguments
     * `bantuan_id`: The id of the grant.
     *
     * # Returns
     * A Result containing the slots or an `ApplicationError`.
     */
    pub async fn get_distribusi_list(&self, bantuan_id: i64) -> Result<Vec<DistribusiDetailType>, ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut connection = connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.bantuan_dao.get_bantuan(&mut connection, bantuan_id).await?;
        self.bantuan_dao.get_distribusi_list(&mut connection, bantuan_id).await
    }

    /**
     * Derives the summary projection for a grant. Recomputed on every call
     * from the current slot statuses and the grant's current stipend.
     *
     * # Arguments
     * `bantuan_id`: The id of the grant.
     *
     * # Returns
     * A Result containing the grant and its `GrantSummaryType` or an `ApplicationError`.
     */
    pub async fn summarize(&self, bantuan_id: i64) -> Result<(BantuanDetailType, GrantSummaryType), ApplicationError> {
        let connection_pool = self.get_connection_pool()?;
        let mut connection = connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        let bantuan = self.bantuan_dao.get_bantuan(&mut connection, bantuan_id).await?;
        let statuses = self.bantuan_dao.get_distribusi_statuses(&mut connection, bantuan_id).await?;
        let summary = GrantSummaryType::derive(bantuan.nominal_per_bulan, &statuses);
        Ok((bantuan, summary))
    }

    fn get_connection_pool(&self) -> Result<&Pool<Postgres>, ApplicationError> {
        self.connection_pool.as_ref().ok_or_else(|| ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()))
    }

    fn status_snapshot(status: GrantStatus) -> String {
        serde_json::json!({ "status": status }).to_string()
    }

    fn distribusi_snapshot(distribusi: &DistribusiDetailType) -> String {
        serde_json::json!({ "bulan": distribusi.bulan, "status": distribusi.status, "disalurkanPada": distribusi.disalurkan_pada }).to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rust_decimal::Decimal;

    fn service_without_pool() -> BantuanService {
        BantuanService::new(BantuanDao::new(), ActivityLogDao::new(), None)
    }

    #[tokio::test]
    async fn test_get_bantuan_without_pool() {
        let service = service_without_pool();
        let result = service.get_bantuan(1).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::DatabaseError);
    }

    #[tokio::test]
    async fn test_add_bantuan_without_pool() {
        let service = service_without_pool();
        let input = BantuanAddInputType { id_keluarga: 1, tahun_anggaran: 2025, nominal_per_bulan: Decimal::new(300_000, 0), keterangan: None, claim_name: "operator".to_string() };
        let result = service.add_bantuan(input, None).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::DatabaseError);
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    use crate::model::models::DisbursementStatus;

    fn service(pool: PgPool) -> BantuanService {
        BantuanService::new(BantuanDao::new(), ActivityLogDao::new(), Some(pool))
    }

    fn add_input(id_keluarga: i64) -> BantuanAddInputType {
        BantuanAddInputType { id_keluarga, tahun_anggaran: 2025, nominal_per_bulan: Decimal::new(300_000, 0), keterangan: None, claim_name: "test_user".to_string() }
    }

    fn update_input(catatan: Option<&str>) -> DistribusiUpdateInputType {
        DistribusiUpdateInputType { catatan: catatan.map(str::to_string), claim_name: "test_user".to_string() }
    }

    #[sqlx::test]
    async fn test_activation_is_idempotent() {
        let pool = init_db().await;
        let service = service(pool);
        let bantuan_id = service.add_bantuan(add_input(101), None).await.unwrap();
        let activated = service.activate_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
        assert_eq!(activated.status, GrantStatus::Aktif);
        let activated_again = service.activate_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
        assert_eq!(activated_again.status, GrantStatus::Aktif);
        let slots = service.get_distribusi_list(bantuan_id).await.unwrap();
        assert_eq!(slots.len(), 12);
        assert!(slots.iter().all(|slot| slot.status == DisbursementStatus::BelumDisalurkan));
        service.delete_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
    }

    #[sqlx::test]
    async fn test_disbursement_scenario() {
        let pool = init_db().await;
        let service = service(pool);
        let bantuan_id = service.add_bantuan(add_input(102), None).await.unwrap();
        service.activate_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
        let (_, summary) = service.summarize(bantuan_id).await.unwrap();
        assert_eq!(summary.percent, 0.0);
        assert_eq!(summary.total_annual_amount, Decimal::new(3_600_000, 0));

        let slots = service.get_distribusi_list(bantuan_id).await.unwrap();
        for slot in slots.iter().take(6) {
            service.disburse(slot.id, update_input(None), None).await.unwrap();
        }
        let (_, summary) = service.summarize(bantuan_id).await.unwrap();
        assert_eq!(summary.percent, 50.0);
        assert_eq!(summary.months_remaining, 6);
        assert_eq!(summary.amount_disbursed_so_far, Decimal::new(1_800_000, 0));

        service.mark_failed(slots[6].id, update_input(Some("bank rejected")), None).await.unwrap();
        let (_, summary) = service.summarize(bantuan_id).await.unwrap();
        assert_eq!(summary.disbursed, 6);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 5);
        service.delete_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
    }

    #[sqlx::test]
    async fn test_disburse_twice_is_rejected() {
        let pool = init_db().await;
        let service = service(pool);
        let bantuan_id = service.add_bantuan(add_input(103), None).await.unwrap();
        service.activate_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
        let slots = service.get_distribusi_list(bantuan_id).await.unwrap();
        service.disburse(slots[0].id, update_input(None), None).await.unwrap();
        let second = service.disburse(slots[0].id, update_input(None), None).await;
        assert_eq!(second.unwrap_err().error_type, ErrorType::InvalidTransition);
        service.delete_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
    }

    #[sqlx::test]
    async fn test_complete_cancelled_grant_is_rejected() {
        let pool = init_db().await;
        let service = service(pool);
        let bantuan_id = service.add_bantuan(add_input(104), None).await.unwrap();
        service.cancel_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
        let result = service.complete_bantuan(bantuan_id, "test_user".to_string(), None).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::InvalidTransition);
        let bantuan = service.get_bantuan(bantuan_id).await.unwrap();
        assert_eq!(bantuan.status, GrantStatus::Dibatalkan);
        service.delete_bantuan(bantuan_id, "test_user".to_string(), None).await.unwrap();
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
