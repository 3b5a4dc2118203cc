use common::models::{DispatchOutcome, DispatchStats, NotificationMessage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tokio::time::{Duration, timeout};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, info, warn};

use crate::mailer::{MailTransport, OutgoingEmail};

/// Hands composed messages to the mail transport without blocking the
/// submitter.
///
/// Every submission becomes its own tracked task; concurrency is bounded by
/// a semaphore acquired inside the task, so `submit` returns immediately
/// even when all send slots are busy. A delivery failure is terminal for
/// that one message: it is logged, counted, and never surfaces to other
/// tasks or to the submitting call.
pub struct DispatchExecutor {
    transport: Arc<dyn MailTransport>,
    sender: String,
    limiter: Arc<Semaphore>,
    tracker: TaskTracker,
    send_timeout: Duration,
    submitted: AtomicUsize,
    delivered: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
}

impl DispatchExecutor {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        sender: String,
        max_inflight: usize,
        send_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            sender,
            limiter: Arc::new(Semaphore::new(max_inflight.max(1))),
            tracker: TaskTracker::new(),
            send_timeout,
            submitted: AtomicUsize::new(0),
            delivered: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue one message for delivery. Returns before the send happens.
    pub fn submit(&self, message: NotificationMessage) {
        self.submitted.fetch_add(1, Ordering::Relaxed);

        let email = OutgoingEmail {
            sender: self.sender.clone(),
            recipients: vec![message.recipient.clone()],
            subject: message.subject,
            html_body: message.body,
        };
        let recipient = message.recipient;

        let transport = Arc::clone(&self.transport);
        let limiter = Arc::clone(&self.limiter);
        let delivered = Arc::clone(&self.delivered);
        let failed = Arc::clone(&self.failed);
        let send_timeout = self.send_timeout;

        self.tracker.spawn(
            async move {
                let _permit = match limiter.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };

                let outcome = match timeout(send_timeout, transport.send(&email)).await {
                    Ok(Ok(())) => DispatchOutcome::Delivered,
                    Ok(Err(e)) => DispatchOutcome::Failed(e.to_string()),
                    Err(_) => DispatchOutcome::Failed(format!(
                        "send timed out after {}s",
                        send_timeout.as_secs()
                    )),
                };

                match &outcome {
                    DispatchOutcome::Delivered => {
                        delivered.fetch_add(1, Ordering::Relaxed);
                        info!(recipient = %recipient, "Notification delivered");
                    }
                    DispatchOutcome::Failed(reason) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        warn!(recipient = %recipient, reason = %reason, "Notification delivery failed");
                    }
                }
            }
            .in_current_span(),
        );
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Wait for every in-flight send to settle. Called on shutdown so the
    /// process does not exit with deliveries mid-air.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::errors::AppError;
    use tokio::time::{Instant, sleep};

    struct SlowTransport {
        delay: Duration,
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MailTransport for SlowTransport {
        async fn send(&self, _email: &OutgoingEmail) -> Result<(), AppError> {
            sleep(self.delay).await;
            self.sent.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    /// Fails any recipient whose address contains "bounce".
    struct FlakyTransport;

    #[async_trait]
    impl MailTransport for FlakyTransport {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
            if email.recipients.iter().any(|r| r.contains("bounce")) {
                return Err(AppError::dispatch("mailbox unavailable"));
            }
            Ok(())
        }
    }

    fn message(recipient: &str) -> NotificationMessage {
        NotificationMessage {
            recipient: recipient.to_string(),
            subject: "Enjoy a discount on us.".to_string(),
            body: "<html></html>".to_string(),
        }
    }

    #[tokio::test]
    async fn submit_returns_before_send_completes() {
        let sent = Arc::new(AtomicUsize::new(0));
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_millis(200),
            sent: Arc::clone(&sent),
        });
        let executor =
            DispatchExecutor::new(transport, "weather@example.com".to_string(), 4, Duration::from_secs(5));

        let started = Instant::now();
        executor.submit(message("a@b.com"));

        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(sent.load(Ordering::Relaxed), 0);

        executor.drain().await;
        assert_eq!(sent.load(Ordering::Relaxed), 1);
        assert_eq!(executor.stats().delivered, 1);
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_affect_the_rest() {
        let executor = DispatchExecutor::new(
            Arc::new(FlakyTransport),
            "weather@example.com".to_string(),
            4,
            Duration::from_secs(5),
        );

        executor.submit(message("ok1@b.com"));
        executor.submit(message("bounce@b.com"));
        executor.submit(message("ok2@b.com"));
        executor.drain().await;

        let stats = executor.stats();
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn stuck_send_is_bounded_by_timeout() {
        let sent = Arc::new(AtomicUsize::new(0));
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_secs(60),
            sent,
        });
        let executor = DispatchExecutor::new(
            transport,
            "weather@example.com".to_string(),
            4,
            Duration::from_millis(50),
        );

        executor.submit(message("a@b.com"));
        executor.drain().await;

        let stats = executor.stats();
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn submissions_beyond_the_send_limit_still_return_immediately() {
        let sent = Arc::new(AtomicUsize::new(0));
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_millis(50),
            sent: Arc::clone(&sent),
        });
        let executor = DispatchExecutor::new(
            transport,
            "weather@example.com".to_string(),
            2,
            Duration::from_secs(5),
        );

        let started = Instant::now();
        for i in 0..10 {
            executor.submit(message(&format!("user{i}@b.com")));
        }
        assert!(started.elapsed() < Duration::from_millis(100));

        executor.drain().await;
        assert_eq!(sent.load(Ordering::Relaxed), 10);
        assert_eq!(executor.stats().delivered, 10);
    }
}
