use common::errors::AppError;
use common::models::{CampaignReport, Subscriber};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, instrument, warn};

use crate::cache::ForecastCache;
use crate::composer::NotificationComposer;
use crate::dispatch::DispatchExecutor;
use crate::subscribers::SubscriberStore;

/// Runs one notification batch: forecast -> compose -> dispatch per
/// subscriber, with per-subscriber fault isolation.
///
/// Subscribers are processed concurrently (bounded by a semaphore) so that
/// a bursty batch exercises the cache's singleflight coordination instead
/// of serializing on the provider. One subscriber's forecast failure is
/// logged and counted; the batch always runs to completion.
pub struct CampaignRunner {
    store: Arc<dyn SubscriberStore>,
    cache: Arc<ForecastCache>,
    composer: Arc<NotificationComposer>,
    dispatch: Arc<DispatchExecutor>,
    api_key: String,
    semaphore: Arc<Semaphore>,
    cancellation_token: CancellationToken,
}

impl CampaignRunner {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        cache: Arc<ForecastCache>,
        composer: NotificationComposer,
        dispatch: Arc<DispatchExecutor>,
        api_key: String,
        max_concurrent: usize,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            store,
            cache,
            composer: Arc::new(composer),
            dispatch,
            api_key,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            cancellation_token,
        }
    }

    /// Load every current subscriber and run the batch over them. A store
    /// failure aborts before any work is attempted.
    pub async fn run_all(&self) -> Result<CampaignReport, AppError> {
        let subscribers = self.store.all().await?;
        Ok(self.run(subscribers).await)
    }

    #[instrument(skip(self, subscribers), fields(subscriber_count = subscribers.len()))]
    pub async fn run(&self, subscribers: Vec<Subscriber>) -> CampaignReport {
        let attempted = subscribers.len();

        info!(count = attempted, "Starting notification campaign");

        let mut handles = Vec::with_capacity(attempted);

        for subscriber in subscribers {
            let semaphore = Arc::clone(&self.semaphore);
            let cache = Arc::clone(&self.cache);
            let composer = Arc::clone(&self.composer);
            let dispatch = Arc::clone(&self.dispatch);
            let api_key = self.api_key.clone();
            let cancel = self.cancellation_token.clone();

            let handle = tokio::spawn(
                async move {
                    if cancel.is_cancelled() {
                        warn!(email = %subscriber.email, "Campaign cancelled before processing");
                        return false;
                    }

                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return false,
                    };

                    tokio::select! {
                        composed = process_subscriber(&subscriber, &api_key, &cache, &composer, &dispatch) => composed,
                        _ = cancel.cancelled() => {
                            warn!(email = %subscriber.email, "Campaign cancelled mid-lookup");
                            false
                        }
                    }
                }
                .in_current_span(),
            );

            handles.push(handle);
        }

        let mut composed = 0;
        let mut failed = 0;

        for handle in handles {
            match handle.await {
                Ok(true) => composed += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    error!(error = %e, "Task join error");
                    failed += 1;
                }
            }
        }

        info!(attempted, composed, failed, "Campaign completed");

        CampaignReport {
            attempted,
            composed,
            failed,
        }
    }
}

/// One subscriber's pipeline stage. Returns whether a message was composed
/// and handed to dispatch; failures are logged here with enough context to
/// diagnose, never propagated.
async fn process_subscriber(
    subscriber: &Subscriber,
    api_key: &str,
    cache: &ForecastCache,
    composer: &NotificationComposer,
    dispatch: &DispatchExecutor,
) -> bool {
    match cache.get(api_key, &subscriber.state, &subscriber.city).await {
        Ok(forecast) => {
            let message = composer.compose(
                &subscriber.email,
                &forecast.conditions,
                &subscriber.city,
                &subscriber.state,
                forecast.temperature,
            );
            dispatch.submit(message);
            true
        }
        Err(e) => {
            warn!(
                stage = "forecast",
                email = %subscriber.email,
                city = %subscriber.city,
                state = %subscriber.state,
                error = %e,
                "Skipping subscriber after forecast failure"
            );
            false
        }
    }
}
