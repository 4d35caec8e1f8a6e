use crate::{api::security::JwtSecurityService, service::bantuan::BantuanService};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The JWT security service for handling authentication and authorization.
     */
    pub jwt_service: JwtSecurityService,
    /**
     * The service for grant lifecycle and disbursement operations.
     */
    pub bantuan_service: BantuanService,
}

/**
 * Creates a new instance of `AppState`.
 *
 * # Arguments
 * `jwt_service`: The JWT security service for handling authentication and authorization.
 * `bantuan_service`: The service for grant lifecycle and disbursement operations.
 */
impl AppState {
    pub fn new(jwt_service: JwtSecurityService, bantuan_service: BantuanService) -> Self {
        AppState { jwt_service, bantuan_service }
    }
}
