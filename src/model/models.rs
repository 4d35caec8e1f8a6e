use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Number of monthly disbursement slots generated for a grant when it is activated.
 */
pub const MONTHS_PER_YEAR: i64 = 12;

/**
 * Sentinel returned for month numbers outside 1-12. Month integrity is guaranteed
 * by batch creation, so an out of range number is displayed, not rejected.
 */
pub const UNKNOWN_MONTH: &str = "Tidak Diketahui";

/**
 * Activity log action tag for establishing a grant.
 */
pub const ACTION_PENETAPAN_BANTUAN: &str = "penetapan_bantuan";
/**
 * Activity log action tag for activating a grant.
 */
pub const ACTION_AKTIVASI_BANTUAN: &str = "aktivasi_bantuan";
/**
 * Activity log action tag for disbursing a monthly slot.
 */
pub const ACTION_DISTRIBUSI_BANTUAN: &str = "distribusi_bantuan";
/**
 * Activity log action tag for marking a monthly slot failed.
 */
pub const ACTION_DISTRIBUSI_GAGAL: &str = "distribusi_gagal";
/**
 * Activity log action tag for completing a grant.
 */
pub const ACTION_PENYELESAIAN_BANTUAN: &str = "penyelesaian_bantuan";
/**
 * Activity log action tag for cancelling a grant.
 */
pub const ACTION_PEMBATALAN_BANTUAN: &str = "pembatalan_bantuan";
/**
 * Activity log action tag for deleting a grant.
 */
pub const ACTION_PENGHAPUSAN_BANTUAN: &str = "penghapusan_bantuan";

/**
 * Lifecycle status of an aid grant.
 *
 * The legal transitions are ditetapkan -> aktif -> selesai, with dibatalkan
 * reachable from any non-terminal state. Dibatalkan and selesai are terminal.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Ditetapkan,
    Aktif,
    Selesai,
    Dibatalkan,
}

impl GrantStatus {
    /**
     * Returns the database representation of the status.
     */
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantStatus::Ditetapkan => "ditetapkan",
            GrantStatus::Aktif => "aktif",
            GrantStatus::Selesai => "selesai",
            GrantStatus::Dibatalkan => "dibatalkan",
        }
    }

    /**
     * Parses a status from its database representation.
     *
     * # Arguments
     * `value`: The stored status string.
     *
     * # Returns
     * The parsed status or an `ApplicationError` for an unknown value.
     */
    pub fn parse(value: &str) -> Result<Self, ApplicationError> {
        match value {
            "ditetapkan" => Ok(GrantStatus::Ditetapkan),
            "aktif" => Ok(GrantStatus::Aktif),
            "selesai" => Ok(GrantStatus::Selesai),
            "dibatalkan" => Ok(GrantStatus::Dibatalkan),
            other => Err(ApplicationError::new(ErrorType::Application, format!("Unknown grant status: {other}"))),
        }
    }

    /**
     * Whether the grant may be activated from this status. Activation is
     * idempotent, so an already active grant may be activated again.
     */
    pub fn can_activate(&self) -> bool {
        matches!(self, GrantStatus::Ditetapkan | GrantStatus::Aktif)
    }

    /**
     * Whether the grant may be completed from this status.
     */
    pub fn can_complete(&self) -> bool {
        matches!(self, GrantStatus::Ditetapkan | GrantStatus::Aktif)
    }

    /**
     * Whether the grant may be cancelled from this status. Cancellation is
     * terminal, a cancelled grant cannot be cancelled again.
     */
    pub fn can_cancel(&self) -> bool {
        !matches!(self, GrantStatus::Dibatalkan)
    }
}

/**
 * Status of a single monthly disbursement slot.
 *
 * Slots leave belum_disalurkan exactly once. A failed slot may be retried,
 * but no transition returns a slot to belum_disalurkan.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisbursementStatus {
    BelumDisalurkan,
    Disalurkan,
    Gagal,
}

impl DisbursementStatus {
    /**
     * Returns the database representation of the status.
     */
    pub fn as_str(&self) -> &'static str {
        match self {
            DisbursementStatus::BelumDisalurkan => "belum_disalurkan",
            DisbursementStatus::Disalurkan => "disalurkan",
            DisbursementStatus::Gagal => "gagal",
        }
    }

    /**
     * Parses a status from its database representation.
     *
     * # Arguments
     * `value`: The stored status string.
     *
     * # Returns
     * The parsed status or an `ApplicationError` for an unknown value.
     */
    pub fn parse(value: &str) -> Result<Self, ApplicationError> {
        match value {
            "belum_disalurkan" => Ok(DisbursementStatus::BelumDisalurkan),
            "disalurkan" => Ok(DisbursementStatus::Disalurkan),
            "gagal" => Ok(DisbursementStatus::Gagal),
            other => Err(ApplicationError::new(ErrorType::Application, format!("Unknown disbursement status: {other}"))),
        }
    }

    /**
     * Whether the slot may be disbursed from this status. Retrying a failed
     * slot is allowed, re-disbursing an already disbursed slot is not.
     */
    pub fn can_disburse(&self) -> bool {
        matches!(self, DisbursementStatus::BelumDisalurkan | DisbursementStatus::Gagal)
    }

    /**
     * Whether the slot may be marked failed from this status. Allowed from
     * every status, including disalurkan for payments reversed by the bank.
     */
    pub fn can_mark_failed(&self) -> bool {
        true
    }
}

/**
 * Maps a month number to its Indonesian name. Numbers outside 1-12 resolve
 * to the `UNKNOWN_MONTH` sentinel instead of failing.
 *
 * # Arguments
 * `bulan`: The month number.
 *
 * # Returns
 * The month name.
 */
pub fn month_name(bulan: i64) -> &'static str {
    match bulan {
        1 => "Januari",
        2 => "Februari",
        3 => "Maret",
        4 => "April",
        5 => "Mei",
        6 => "Juni",
        7 => "Juli",
        8 => "Agustus",
        9 => "September",
        10 => "Oktober",
        11 => "November",
        12 => "Desember",
        _ => UNKNOWN_MONTH,
    }
}

/**
 * Detail of one aid grant.
 */
#[derive(Debug, Clone)]
pub struct BantuanDetailType {
    pub id: i64,
    pub id_keluarga: i64,
    pub tahun_anggaran: i64,
    pub status: GrantStatus,
    pub nominal_per_bulan: Decimal,
    pub keterangan: Option<String>,
    pub ditetapkan_pada: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub inserted_by: String,
    pub updated_by: String,
}

/**
 * Detail of one monthly disbursement slot.
 */
#[derive(Debug, Clone)]
pub struct DistribusiDetailType {
    pub id: i64,
    pub id_bantuan: i64,
    pub bulan: i64,
    pub status: DisbursementStatus,
    pub disalurkan_pada: Option<DateTime<Utc>>,
    pub catatan: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/**
 * Output of the grant list operation.
 */
pub struct BantuanListOutputType {
    pub bantuan: Vec<BantuanDetailType>,
    pub pagination: PaginationOutput,
}

impl BantuanListOutputType {
    pub fn new(bantuan: Vec<BantuanDetailType>, pagination: PaginationOutput) -> Self {
        BantuanListOutputType { bantuan, pagination }
    }
}

/**
 * Summary projection over a grant and its disbursement slots. Always
 * recomputed from the current slot statuses and the grant's current
 * stipend, never stored.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct GrantSummaryType {
    pub total_months: i64,
    pub disbursed: i64,
    pub pending: i64,
    pub failed: i64,
    pub percent: f64,
    pub months_remaining: i64,
    pub total_annual_amount: Decimal,
    pub amount_disbursed_so_far: Decimal,
}

impl GrantSummaryType {
    /**
     * Derives the summary from the grant's stipend and the statuses of its
     * disbursement slots.
     *
     * # Arguments
     * `nominal_per_bulan`: The grant's monthly stipend.
     * `statuses`: The statuses of the grant's disbursement slots, empty when
     * the grant has not been activated.
     *
     * # Returns
     * The derived `GrantSummaryType`.
     */
    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    pub fn derive(nominal_per_bulan: Decimal, statuses: &[DisbursementStatus]) -> Self {
        let disbursed = statuses.iter().filter(|status| **status == DisbursementStatus::Disalurkan).count() as i64;
        let failed = statuses.iter().filter(|status| **status == DisbursementStatus::Gagal).count() as i64;
        let pending = statuses.iter().filter(|status| **status == DisbursementStatus::BelumDisalurkan).count() as i64;
        // The denominator is the constant schedule length, the guard covers a grant without a schedule.
        let percent = if statuses.is_empty() { 0.0 } else { disbursed as f64 / MONTHS_PER_YEAR as f64 * 100.0 };
        GrantSummaryType {
            total_months: MONTHS_PER_YEAR,
            disbursed,
            pending,
            failed,
            percent,
            months_remaining: MONTHS_PER_YEAR - disbursed,
            total_annual_amount: nominal_per_bulan * Decimal::from(MONTHS_PER_YEAR),
            amount_disbursed_so_far: nominal_per_bulan * Decimal::from(disbursed),
        }
    }
}

/**
 * Input for establishing a new aid grant.
 */
#[derive(Debug, Clone)]
pub struct BantuanAddInputType {
    pub id_keluarga: i64,
    pub tahun_anggaran: i64,
    pub nominal_per_bulan: Decimal,
    pub keterangan: Option<String>,
    pub claim_name: String,
}

impl BantuanAddInputType {
    /**
     * Validates the input.
     *
     * # Returns
     * The validated input or an `ApplicationError` describing the first failure.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if self.id_keluarga <= 0 {
            return Err(ApplicationError::new(ErrorType::Validation, "Household id must be positive".to_string()));
        }
        if !(1000..=9999).contains(&self.tahun_anggaran) {
            return Err(ApplicationError::new(ErrorType::Validation, "Budget year must be a 4 digit year".to_string()));
        }
        if self.nominal_per_bulan < Decimal::ZERO {
            return Err(ApplicationError::new(ErrorType::Validation, "Monthly stipend must not be negative".to_string()));
        }
        if self.nominal_per_bulan.scale() > 2 {
            return Err(ApplicationError::new(ErrorType::Validation, "Monthly stipend must have at most 2 decimal places".to_string()));
        }
        Ok(self)
    }
}

/**
 * Filter parameters for the grant list operation.
 */
#[derive(Debug, Clone)]
pub struct BantuanListInputType {
    pub tahun_anggaran: Option<i64>,
    pub status: Option<GrantStatus>,
}

impl BantuanListInputType {
    /**
     * Validates the filter parameters.
     *
     * # Returns
     * The validated input or an `ApplicationError` describing the first failure.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if let Some(tahun_anggaran) = self.tahun_anggaran {
            if !(1000..=9999).contains(&tahun_anggaran) {
                return Err(ApplicationError::new(ErrorType::Validation, "Budget year must be a 4 digit year".to_string()));
            }
        }
        Ok(self)
    }
}

/**
 * Input for disbursing or failing a monthly slot.
 */
#[derive(Debug, Clone)]
pub struct DistribusiUpdateInputType {
    pub catatan: Option<String>,
    pub claim_name: String,
}

impl DistribusiUpdateInputType {
    /**
     * Validates the input.
     *
     * # Returns
     * The validated input or an `ApplicationError` describing the first failure.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if let Some(catatan) = &self.catatan {
            if catatan.len() > 2000 {
                return Err(ApplicationError::new(ErrorType::Validation, "Note too long".to_string()));
            }
        }
        Ok(self)
    }
}

/**
 * One append-only activity log entry. Actor and origin address are passed in
 * explicitly by the caller, the core never reads them from ambient state.
 */
#[derive(Debug, Clone)]
pub struct ActivityLogEntryType {
    pub actor: String,
    pub action: String,
    pub target_table: String,
    pub target_id: i64,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub ip_address: Option<String>,
    pub remarks: Option<String>,
}

impl ActivityLogEntryType {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        actor: String,
        action: &str,
        target_table: &str,
        target_id: i64,
        old_value: Option<String>,
        new_value: Option<String>,
        ip_address: Option<String>,
        remarks: Option<String>,
    ) -> Self {
        ActivityLogEntryType { actor, action: action.to_string(), target_table: target_table.to_string(), target_id, old_value, new_value, ip_address, remarks }
    }
}

/**
 * Pagination input for list operations.
 */
#[derive(Debug, Clone)]
pub struct PaginationInput {
    pub start_index: i64,
    pub page_size: i64,
}

impl PaginationInput {
    /**
     * Validates the pagination input.
     *
     * # Returns
     * The validated input or an `ApplicationError` describing the first failure.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if self.start_index < 0 {
            return Err(ApplicationError::new(ErrorType::Validation, "Start index must not be negative".to_string()));
        }
        if !(1..=1000).contains(&self.page_size) {
            return Err(ApplicationError::new(ErrorType::Validation, "Page size must be between 1 and 1000".to_string()));
        }
        Ok(self)
    }
}

/**
 * Pagination details of a list result.
 */
pub struct PaginationOutput {
    pub start_index: i64,
    pub page_size: i64,
    pub has_more: bool,
}

impl PaginationOutput {
    pub fn new(start_index: i64, page_size: i64, has_more: bool) -> Self {
        PaginationOutput { start_index, page_size, has_more }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_grant_status_roundtrip() {
        for status in [GrantStatus::Ditetapkan, GrantStatus::Aktif, GrantStatus::Selesai, GrantStatus::Dibatalkan] {
            assert_eq!(GrantStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(GrantStatus::parse("ditolak").is_err());
    }

    #[test]
    fn test_grant_transitions() {
        assert!(GrantStatus::Ditetapkan.can_activate());
        assert!(GrantStatus::Aktif.can_activate());
        assert!(!GrantStatus::Selesai.can_activate());
        assert!(!GrantStatus::Dibatalkan.can_activate());

        assert!(GrantStatus::Ditetapkan.can_complete());
        assert!(GrantStatus::Aktif.can_complete());
        assert!(!GrantStatus::Selesai.can_complete());
        assert!(!GrantStatus::Dibatalkan.can_complete());

        assert!(GrantStatus::Ditetapkan.can_cancel());
        assert!(GrantStatus::Aktif.can_cancel());
        assert!(GrantStatus::Selesai.can_cancel());
        assert!(!GrantStatus::Dibatalkan.can_cancel());
    }

    #[test]
    fn test_disbursement_transitions() {
        assert!(DisbursementStatus::BelumDisalurkan.can_disburse());
        assert!(DisbursementStatus::Gagal.can_disburse());
        assert!(!DisbursementStatus::Disalurkan.can_disburse());

        assert!(DisbursementStatus::BelumDisalurkan.can_mark_failed());
        assert!(DisbursementStatus::Disalurkan.can_mark_failed());
        assert!(DisbursementStatus::Gagal.can_mark_failed());
    }

    #[test]
    fn test_month_name_bounds() {
        assert_eq!(month_name(1), "Januari");
        assert_eq!(month_name(12), "Desember");
        assert_eq!(month_name(0), UNKNOWN_MONTH);
        assert_eq!(month_name(13), UNKNOWN_MONTH);
        assert_eq!(month_name(-1), UNKNOWN_MONTH);
    }

    #[test]
    fn test_summary_without_schedule() {
        let summary = GrantSummaryType::derive(Decimal::new(300_000, 0), &[]);
        assert_eq!(summary.total_months, 12);
        assert_eq!(summary.disbursed, 0);
        assert_eq!(summary.pending, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.percent, 0.0);
        assert_eq!(summary.months_remaining, 12);
        assert_eq!(summary.total_annual_amount, Decimal::new(3_600_000, 0));
        assert_eq!(summary.amount_disbursed_so_far, Decimal::ZERO);
    }

    #[test]
    fn test_summary_percent_for_every_count() {
        for disbursed in 0..=12 {
            let mut statuses = vec![DisbursementStatus::Disalurkan; disbursed];
            statuses.resize(12, DisbursementStatus::BelumDisalurkan);
            let summary = GrantSummaryType::derive(Decimal::new(100, 0), &statuses);
            assert_eq!(summary.percent, disbursed as f64 / 12.0 * 100.0);
            assert_eq!(summary.months_remaining, 12 - disbursed as i64);
        }
    }

    #[test]
    fn test_summary_after_six_disbursed() {
        let mut statuses = vec![DisbursementStatus::Disalurkan; 6];
        statuses.resize(12, DisbursementStatus::BelumDisalurkan);
        let summary = GrantSummaryType::derive(Decimal::new(300_000, 0), &statuses);
        assert_eq!(summary.percent, 50.0);
        assert_eq!(summary.disbursed, 6);
        assert_eq!(summary.pending, 6);
        assert_eq!(summary.months_remaining, 6);
        assert_eq!(summary.amount_disbursed_so_far, Decimal::new(1_800_000, 0));
        assert_eq!(summary.total_annual_amount, Decimal::new(3_600_000, 0));
    }

    #[test]
    fn test_summary_with_failed_slot() {
        let mut statuses = vec![DisbursementStatus::Disalurkan; 6];
        statuses.push(DisbursementStatus::Gagal);
        statuses.resize(12, DisbursementStatus::BelumDisalurkan);
        let summary = GrantSummaryType::derive(Decimal::new(300_000, 0), &statuses);
        assert_eq!(summary.disbursed, 6);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 5);
    }

    #[test]
    fn test_annual_amount_invariant_under_statuses() {
        let nominal = Decimal::new(123_456, 2);
        let expected = nominal * Decimal::from(12);
        for statuses in [
            vec![DisbursementStatus::BelumDisalurkan; 12],
            vec![DisbursementStatus::Disalurkan; 12],
            vec![DisbursementStatus::Gagal; 12],
        ] {
            assert_eq!(GrantSummaryType::derive(nominal, &statuses).total_annual_amount, expected);
        }
    }

    #[test]
    fn test_add_input_validation() {
        let input = BantuanAddInputType { id_keluarga: 1, tahun_anggaran: 2025, nominal_per_bulan: Decimal::new(300_000, 0), keterangan: None, claim_name: "operator".to_string() };
        assert!(input.clone().validate().is_ok());

        let negative = BantuanAddInputType { nominal_per_bulan: Decimal::new(-1, 0), ..input.clone() };
        assert_eq!(negative.validate().unwrap_err().error_type, ErrorType::Validation);

        let bad_year = BantuanAddInputType { tahun_anggaran: 25, ..input.clone() };
        assert_eq!(bad_year.validate().unwrap_err().error_type, ErrorType::Validation);

        let too_precise = BantuanAddInputType { nominal_per_bulan: Decimal::new(123_456, 3), ..input.clone() };
        assert_eq!(too_precise.validate().unwrap_err().error_type, ErrorType::Validation);

        let bad_household = BantuanAddInputType { id_keluarga: 0, ..input };
        assert_eq!(bad_household.validate().unwrap_err().error_type, ErrorType::Validation);
    }

    #[test]
    fn test_pagination_validation() {
        assert!(PaginationInput { start_index: 0, page_size: 10 }.validate().is_ok());
        assert!(PaginationInput { start_index: -1, page_size: 10 }.validate().is_err());
        assert!(PaginationInput { start_index: 0, page_size: 0 }.validate().is_err());
        assert!(PaginationInput { start_index: 0, page_size: 1001 }.validate().is_err());
    }
}
