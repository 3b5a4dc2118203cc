use chrono::Utc;
use common::errors::AppError;
use common::http_client::HttpClient;
use common::models::Forecast;
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct ConditionsResponse {
    current_observation: CurrentObservation,
}

#[derive(Debug, Deserialize)]
struct CurrentObservation {
    temp_f: f64,
    icon: String,
}

/// Client for the weather provider's current-conditions endpoint.
///
/// One outbound request per call, no retries, no state between calls.
/// Callers that want caching or retry wrap this (see `cache::ForecastCache`).
pub struct ForecastClient {
    http_client: HttpClient,
    base_url: String,
    feature_path: &'static str,
    response_format: &'static str,
}

impl ForecastClient {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        Self {
            http_client: HttpClient::new(timeout_secs),
            base_url,
            feature_path: "conditions",
            response_format: "json",
        }
    }

    #[instrument(skip(self, api_key), fields(state = %state, city = %city))]
    pub async fn fetch(
        &self,
        api_key: &str,
        state: &str,
        city: &str,
    ) -> Result<Forecast, AppError> {
        let url = self.request_url(api_key, state, city)?;

        info!("Fetching current conditions from provider");

        let response: ConditionsResponse = self.http_client.get_json(&url).await?;

        Ok(Forecast {
            temperature: response.current_observation.temp_f,
            conditions: response.current_observation.icon,
            queried_at: Utc::now(),
        })
    }

    /// Provider URL: `{base}/{api_key}/{feature}/q/{state}/{city}.{format}`.
    /// Spaces in the city name become underscores before path embedding.
    fn request_url(&self, api_key: &str, state: &str, city: &str) -> Result<String, AppError> {
        if api_key.trim().is_empty() {
            return Err(AppError::config("weather API key is not set"));
        }
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::config(format!(
                "state must be a 2-letter code, got {:?}",
                state
            )));
        }
        if city.trim().is_empty() {
            return Err(AppError::config("city name is empty"));
        }

        let city_segment = city.replace(' ', "_");
        let city_segment = urlencoding::encode(&city_segment);

        Ok(format!(
            "{}/{}/{}/q/{}/{}.{}",
            self.base_url, api_key, self.feature_path, state, city_segment, self.response_format
        ))
    }
}
