use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use common::models::{CampaignReport, DispatchStats, Forecast};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::send_campaign,
        handlers::campaign_stats,
        handlers::get_forecast,
    ),
    components(schemas(
        Forecast,
        CampaignReport,
        DispatchStats,
        common::models::Subscriber,
    )),
    tags(
        (name = "forecast", description = "Cached forecast retrieval"),
        (name = "campaign", description = "Notification campaign runs"),
    ),
)]
struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
