use actix_web::{
    delete, post, web::{self, Path}, HttpRequest, HttpResponse
};
use tracing::{instrument, Instrument};

use crate::{
    api::{
        rest::{BantuanAddRequest, BantuanDetailResponse, BantuanListRequest, BantuanListResponse, BantuanSummaryResponse, DistribusiDetailResponse, DistribusiListResponse, DistribusiUpdateRequest, PaginationQuery},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{BantuanAddInputType, BantuanListInputType, DistribusiUpdateInputType, PaginationInput},
    },
};

/**
 * Endpoint to retrieve a list of grants.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "listBantuan", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/bantuan:list")]
pub async fn bantuan_list(
    http_request: HttpRequest,
    request_body: web::Json<BantuanListRequest>,
    pagination: web::Query<PaginationQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let pagination_input = PaginationInput::from(pagination).validate()?;
    let filter_params = BantuanListInputType::from(request_body).validate()?;
    let output = app_state.bantuan_service.get_bantuan_list(pagination_input, filter_params).instrument(span).await?;
    Ok(HttpResponse::Ok().json(BantuanListResponse::from(output)))
}

/**
 * Endpoint to establish a new grant.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "addBantuan", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/bantuan")]
pub async fn bantuan_add(http_request: HttpRequest, request_body: web::Json<BantuanAddRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let claim = app_state.jwt_service.validate(&http_request)?;
    let bantuan_add_input = BantuanAddInputType::from((request_body, claim.actor())).validate()?;
    let bantuan_id = app_state.bantuan_service.add_bantuan(bantuan_add_input, get_origin(&http_request)).instrument(span.clone()).await?;
    let bantuan = app_state.bantuan_service.get_bantuan(bantuan_id).instrument(span).await?;
    Ok(HttpResponse::Created().json(BantuanDetailResponse::from(bantuan)))
}

/**
 * Endpoint to delete a grant and its disbursement slots.
 */
#[instrument(skip(http_request, app_state), fields(service = "deleteBantuan", trace_id = get_trace_id(&http_request), result))]
#[delete("/api/services/v1_0/bantuan/{bantuanId}")]
pub async fn bantuan_delete(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let claim = app_state.jwt_service.validate(&http_request)?;
    let bantuan_id = path.into_inner();
    app_state.bantuan_service.delete_bantuan(bantuan_id, claim.actor(), get_origin(&http_request)).instrument(span).await?;
    Ok(HttpResponse::NoContent().finish())
}

/**
 * Endpoint to activate a grant, generating its monthly disbursement slots.
 */
#[instrument(skip(http_request, app_state), fields(service = "activateBantuan", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/bantuan/{bantuanId}:activate")]
pub async fn bantuan_activate(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let claim = app_state.jwt_service.validate(&http_request)?;
    let bantuan_id = path.into_inner();
    let bantuan = app_state.bantuan_service.activate_bantuan(bantuan_id, claim.actor(), get_origin(&http_request)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(BantuanDetailResponse::from(bantuan)))
}

/**
 * Endpoint to complete a grant.
 */
#[instrument(skip(http_request, app_state), fields(service = "completeBantuan", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/bantuan/{bantuanId}:complete")]
pub async fn bantuan_complete(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let claim = app_state.jwt_service.validate(&http_request)?;
    let bantuan_id = path.into_inner();
    let bantuan = app_state.bantuan_service.complete_bantuan(bantuan_id, claim.actor(), get_origin(&http_request)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(BantuanDetailResponse::from(bantuan)))
}

/**
 * Endpoint to cancel a grant.
 */
#[instrument(skip(http_request, app_state), fields(service = "cancelBantuan", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/bantuan/{bantuanId}:cancel")]
pub async fn bantuan_cancel(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let claim = app_state.jwt_service.validate(&http_request)?;
    let bantuan_id = path.into_inner();
    let bantuan = app_state.bantuan_service.cancel_bantuan(bantuan_id, claim.actor(), get_origin(&http_request)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(BantuanDetailResponse::from(bantuan)))
}

/**
 * Endpoint to derive the summary projection for a grant.
 */
#[instrument(skip(http_request, app_state), fields(service = "summarizeBantuan", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/bantuan/{bantuanId}:summarize")]
pub async fn bantuan_summarize(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let bantuan_id = path.into_inner();
    let summary = app_state.bantuan_service.summarize(bantuan_id).instrument(span).await?;
    Ok(HttpResponse::Ok().json(BantuanSummaryResponse::from(summary)))
}

/**
 * Endpoint to retrieve a grant's monthly disbursement slots.
 */
#[instrument(skip(http_request, app_state), fields(service = "listDistribusi", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/bantuan/{bantuanId}/distribusi:list")]
pub async fn distribusi_list(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let _ = app_state.jwt_service.validate(&http_request)?;
    let bantuan_id = path.into_inner();
    let distribusi = app_state.bantuan_service.get_distribusi_list(bantuan_id).instrument(span).await?;
    Ok(HttpResponse::Ok().json(DistribusiListResponse::from(distribusi)))
}

/**
 * Endpoint to mark a monthly slot disbursed.
 */
#[instrument(skip(http_request, app_state), fields(service = "disburseDistribusi", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/distribusi/{distribusiId}:disburse")]
pub async fn distribusi_disburse(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<DistribusiUpdateRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let claim = app_state.jwt_service.validate(&http_request)?;
    let distribusi_id = path.into_inner();
    let update_input = DistribusiUpdateInputType::from((request_body, claim.actor())).validate()?;
    let distribusi = app_state.bantuan_service.disburse(distribusi_id, update_input, get_origin(&http_request)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(DistribusiDetailResponse::from(distribusi)))
}

/**
 * Endpoint to mark a monthly slot failed.
 */
#[instrument(skip(http_request, app_state), fields(service = "failDistribusi", trace_id = get_trace_id(&http_request), result))]
#[post("/api/services/v1_0/distribusi/{distribusiId}:fail")]
pub async fn distribusi_fail(path: Path<i64>, http_request: HttpRequest, request_body: web::Json<DistribusiUpdateRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let claim = app_state.jwt_service.validate(&http_request)?;
    let distribusi_id = path.into_inner();
    let update_input = DistribusiUpdateInputType::from((request_body, claim.actor())).validate()?;
    let distribusi = app_state.bantuan_service.mark_failed(distribusi_id, update_input, get_origin(&http_request)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(DistribusiDetailResponse::from(distribusi)))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID")
        .and_then(|v| v.to_str().ok().map(std::string::ToString::to_string))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/**
 * Retrieves the caller's network address for the activity log. The address is
 * handed to the service explicitly, the service never inspects the request.
 */
fn get_origin(http_request: &HttpRequest) -> Option<String> {
    http_request.peer_addr().map(|addr| addr.ip().to_string())
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[actix_web::test]
    async fn test_get_trace_id_exists() {
        let request = TestRequest::default()
            .insert_header(("X-Trace-ID", "test"))
            .to_http_request();
        let trace_id = get_trace_id(&request);
        assert_eq!(trace_id, "test");
    }


    #[actix_web::test]
    async fn test_get_trace_id_not_exists() {
        let request = TestRequest::default()
            .to_http_request();
        let trace_id = get_trace_id(&request);
        assert!(!trace_id.is_empty());
    }

    #[actix_web::test]
    async fn test_get_origin_not_set() {
        let request = TestRequest::default().to_http_request();
        assert_eq!(get_origin(&request), None);
    }

    #[actix_web::test]
    async fn test_get_origin_from_peer_addr() {
        let request = TestRequest::default().peer_addr("192.168.1.10:4430".parse().unwrap()).to_http_request();
        assert_eq!(get_origin(&request), Some("192.168.1.10".to_string()));
    }
}
