use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{
        BantuanAddInputType, BantuanDetailType, BantuanListInputType, BantuanListOutputType, DisbursementStatus, DistribusiDetailType, DistribusiUpdateInputType, GrantStatus, GrantSummaryType,
        PaginationInput, PaginationOutput, month_name,
    },
};

/***************** Bantuan models *********************/

/**
 * Request structure for listing grants.
 *
 * Grants are filtered by budget year and status. The activeOnly flag is a
 * convenience filter equivalent to status aktif and takes precedence over an
 * explicit status.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BantuanListRequest {
    pub tahun_anggaran: Option<i64>,
    pub status: Option<GrantStatus>,
    pub active_only: Option<bool>,
}

impl From<web::Json<BantuanListRequest>> for BantuanListInputType {
    fn from(request: web::Json<BantuanListRequest>) -> Self {
        let status = if request.active_only.unwrap_or(false) { Some(GrantStatus::Aktif) } else { request.status };
        BantuanListInputType { tahun_anggaran: request.tahun_anggaran, status }
    }
}

/**
 * Request structure for establishing a grant.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BantuanAddRequest {
    pub id_keluarga: i64,
    pub tahun_anggaran: i64,
    pub nominal_per_bulan: Decimal,
    pub keterangan: Option<String>,
}

impl From<(web::Json<BantuanAddRequest>, String)> for BantuanAddInputType {
    fn from((request, claim_name): (web::Json<BantuanAddRequest>, String)) -> Self {
        let request = request.into_inner();
        BantuanAddInputType { id_keluarga: request.id_keluarga, tahun_anggaran: request.tahun_anggaran, nominal_per_bulan: request.nominal_per_bulan, keterangan: request.keterangan, claim_name }
    }
}

/**
 * Response structure for a single grant.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BantuanDetailResponse {
    /**
     * The unique identifier of the grant.
     */
    id: i64,
    /**
     * The household the grant was established for.
     */
    id_keluarga: i64,
    /**
     * The budget year the grant applies to.
     */
    tahun_anggaran: i64,
    /**
     * The lifecycle status of the grant.
     */
    status: GrantStatus,
    /**
     * The fixed monthly stipend.
     */
    nominal_per_bulan: Decimal,
    /**
     * Free-text remarks.
     */
    keterangan: Option<String>,
    /**
     * When the grant was established.
     */
    ditetapkan_pada: chrono::DateTime<Utc>,
    /**
     * When the grant was last updated.
     */
    updated_at: chrono::DateTime<Utc>,
    /**
     * The operator who established the grant.
     */
    inserted_by: String,
    /**
     * The operator who last updated the grant.
     */
    updated_by: String,
}

impl From<BantuanDetailType> for BantuanDetailResponse {
    fn from(bantuan: BantuanDetailType) -> Self {
        BantuanDetailResponse {
            id: bantuan.id,
            id_keluarga: bantuan.id_keluarga,
            tahun_anggaran: bantuan.tahun_anggaran,
            status: bantuan.status,
            nominal_per_bulan: bantuan.nominal_per_bulan,
            keterangan: bantuan.keterangan,
            ditetapkan_pada: bantuan.ditetapkan_pada,
            updated_at: bantuan.updated_at,
            inserted_by: bantuan.inserted_by,
            updated_by: bantuan.updated_by,
        }
    }
}

/**
 * Response structure for listing grants.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BantuanListResponse {
    /**
     * The grants on this page.
     */
    bantuan: Vec<BantuanDetailResponse>,
    /**
     * Pagination information for the response.
     */
    pagination: PaginationResponse,
}

impl From<BantuanListOutputType> for BantuanListResponse {
    fn from(output: BantuanListOutputType) -> Self {
        let bantuan: Vec<BantuanDetailResponse> = output.bantuan.into_iter().map(BantuanDetailResponse::from).collect();
        let pagination = PaginationResponse::from(output.pagination);
        BantuanListResponse { bantuan, pagination }
    }
}

/**
 * Response structure for the grant summary projection.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BantuanSummaryResponse {
    /**
     * The grant the summary was derived for.
     */
    bantuan: BantuanDetailResponse,
    /**
     * Number of monthly slots in a full schedule.
     */
    total_months: i64,
    /**
     * Number of disbursed slots.
     */
    disbursed: i64,
    /**
     * Number of pending slots.
     */
    pending: i64,
    /**
     * Number of failed slots.
     */
    failed: i64,
    /**
     * Share of the schedule disbursed, in percent.
     */
    percent: f64,
    /**
     * Number of months not yet disbursed.
     */
    months_remaining: i64,
    /**
     * The stipend over a full year.
     */
    total_annual_amount: Decimal,
    /**
     * The amount disbursed so far at the grant's current stipend.
     */
    amount_disbursed_so_far: Decimal,
}

impl From<(BantuanDetailType, GrantSummaryType)> for BantuanSummaryResponse {
    fn from((bantuan, summary): (BantuanDetailType, GrantSummaryType)) -> Self {
        BantuanSummaryResponse {
            bantuan: BantuanDetailResponse::from(bantuan),
            total_months: summary.total_months,
            disbursed: summary.disbursed,
            pending: summary.pending,
            failed: summary.failed,
            percent: summary.percent,
            months_remaining: summary.months_remaining,
            total_annual_amount: summary.total_annual_amount,
            amount_disbursed_so_far: summary.amount_disbursed_so_far,
        }
    }
}

/***************** Distribusi models *********************/

/**
 * Request structure for disbursing or failing a monthly slot.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistribusiUpdateRequest {
    pub catatan: Option<String>,
}

impl From<(web::Json<DistribusiUpdateRequest>, String)> for DistribusiUpdateInputType {
    fn from((request, claim_name): (web::Json<DistribusiUpdateRequest>, String)) -> Self {
        DistribusiUpdateInputType { catatan: request.into_inner().catatan, claim_name }
    }
}

/**
 * Response structure for a single monthly slot.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistribusiDetailResponse {
    /**
     * The unique identifier of the slot.
     */
    id: i64,
    /**
     * The grant the slot belongs to.
     */
    id_bantuan: i64,
    /**
     * The month number, 1 through 12.
     */
    bulan: i64,
    /**
     * The display name of the month.
     */
    nama_bulan: &'static str,
    /**
     * The status of the slot.
     */
    status: DisbursementStatus,
    /**
     * When the slot was disbursed, unset while pending.
     */
    disalurkan_pada: Option<chrono::DateTime<Utc>>,
    /**
     * Free-text note recorded on disbursement or failure.
     */
    catatan: Option<String>,
    /**
     * When the slot was last updated.
     */
    updated_at: chrono::DateTime<Utc>,
    /**
     * The operator who last updated the slot.
     */
    updated_by: String,
}

impl From<DistribusiDetailType> for DistribusiDetailResponse {
    fn from(distribusi: DistribusiDetailType) -> Self {
        DistribusiDetailResponse {
            id: distribusi.id,
            id_bantuan: distribusi.id_bantuan,
            bulan: distribusi.bulan,
            nama_bulan: month_name(distribusi.bulan),
            status: distribusi.status,
            disalurkan_pada: distribusi.disalurkan_pada,
            catatan: distribusi.catatan,
            updated_at: distribusi.updated_at,
            updated_by: distribusi.updated_by,
        }
    }
}

/**
 * Response structure for listing a grant's monthly slots.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistribusiListResponse {
    /**
     * The monthly slots in month order.
     */
    distribusi: Vec<DistribusiDetailResponse>,
}

impl From<Vec<DistribusiDetailType>> for DistribusiListResponse {
    fn from(distribusi: Vec<DistribusiDetailType>) -> Self {
        DistribusiListResponse { distribusi: distribusi.into_iter().map(DistribusiDetailResponse::from).collect() }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type.clone())).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::JwtAuthorization => StatusCode::UNAUTHORIZED,
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::InvalidTransition | ErrorType::Concurrency | ErrorType::ConstraintViolation => StatusCode::CONFLICT,
        ErrorType::Initialization | ErrorType::DatabaseError | ErrorType::Application => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::JwtAuthorization => 1000,
        ErrorType::Initialization => 1001,
        ErrorType::Validation => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::NotFound => 1004,
        ErrorType::InvalidTransition => 1005,
        ErrorType::Concurrency => 1006,
        ErrorType::ConstraintViolation => 1007,
        ErrorType::Application => 1008,
    }
}

/***************** Common models *********************/

/**
 * Pagination query parameters for API requests.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    /**
     * The index of the first item to return.
     */
    pub start_index: Option<i64>,
    /**
     * The size of the page to return.
     */
    pub page_size: Option<i64>,
}

impl From<web::Query<PaginationQuery>> for PaginationInput {
    fn from(query: web::Query<PaginationQuery>) -> Self {
        PaginationInput { start_index: query.start_index.unwrap_or(0), page_size: query.page_size.unwrap_or(100) }
    }
}

/**
 * Pagination response structure.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    /**
     * The starting index of the returned items.
     */
    pub start_index: Option<i64>,
    /**
     * The size of the page.
     */
    pub page_size: Option<i64>,
    /**
     * Indicates if there are more items available.
     */
    pub has_more_elements: bool,
}

impl From<PaginationOutput> for PaginationResponse {
    fn from(pagination_output: PaginationOutput) -> Self {
        PaginationResponse { start_index: Some(pagination_output.start_index), page_size: Some(pagination_output.page_size), has_more_elements: pagination_output.has_more }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_distribusi_response_carries_month_name() {
        let distribusi = DistribusiDetailType {
            id: 1,
            id_bantuan: 1,
            bulan: 1,
            status: DisbursementStatus::BelumDisalurkan,
            disalurkan_pada: None,
            catatan: None,
            updated_at: Utc::now(),
            updated_by: "test_user".to_string(),
        };
        let response = DistribusiDetailResponse::from(distribusi);
        assert_eq!(response.nama_bulan, "Januari");
        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(serialized["namaBulan"], "Januari");
        assert_eq!(serialized["status"], "belum_disalurkan");
    }

    #[test]
    fn test_error_statuscodes() {
        assert_eq!(get_statuscode(&ErrorType::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(get_statuscode(&ErrorType::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(get_statuscode(&ErrorType::InvalidTransition), StatusCode::CONFLICT);
        assert_eq!(get_statuscode(&ErrorType::Concurrency), StatusCode::CONFLICT);
        assert_eq!(get_statuscode(&ErrorType::JwtAuthorization), StatusCode::UNAUTHORIZED);
        assert_eq!(get_statuscode(&ErrorType::DatabaseError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            get_error_code(&ErrorType::JwtAuthorization),
            get_error_code(&ErrorType::Initialization),
            get_error_code(&ErrorType::Validation),
            get_error_code(&ErrorType::DatabaseError),
            get_error_code(&ErrorType::NotFound),
            get_error_code(&ErrorType::InvalidTransition),
            get_error_code(&ErrorType::Concurrency),
            get_error_code(&ErrorType::ConstraintViolation),
            get_error_code(&ErrorType::Application),
        ];
        let mut deduped = codes.to_vec();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len());
    }
}
