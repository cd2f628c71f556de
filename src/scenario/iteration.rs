use crate::config::ThinkTime;
use crate::engine::metrics::RunMetrics;
use crate::scenario::{Endpoints, SetupData};
use rand::Rng;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use url::Url;

pub const CHECK_HEALTH: &str = "health OK";
pub const CHECK_RECOMMENDATION: &str = "recommendations OK";
pub const CHECK_POSTS: &str = "public posts OK";

/// Idle backoff when a virtual user ticks without a token. Setup failure
/// aborts the run before any iteration, so this path only covers a setup
/// that returned successfully with no usable token.
pub const NO_TOKEN_BACKOFF: Duration = Duration::from_secs(1);

/// One virtual-user tick: health, recommendation (bearer auth), public
/// posts, in that order, each checked for HTTP 200, then a think-time sleep.
///
/// Check failures are recorded as metric samples and never abort the
/// iteration; a request that cannot be sent counts as a connection error and
/// the sequence continues.
pub async fn run_iteration(
    client: &Client,
    endpoints: &Endpoints,
    data: &SetupData,
    think_time: &ThinkTime,
    metrics: &Mutex<RunMetrics>,
) {
    let Some(token) = data.token.as_deref() else {
        sleep(NO_TOKEN_BACKOFF).await;
        return;
    };

    checked_get(client, endpoints.health.clone(), None, CHECK_HEALTH, metrics).await;
    checked_get(
        client,
        endpoints.recommendation.clone(),
        Some(token),
        CHECK_RECOMMENDATION,
        metrics,
    )
    .await;
    checked_get(client, endpoints.posts.clone(), None, CHECK_POSTS, metrics).await;

    metrics.lock().await.record_iteration();

    sleep(think_delay(think_time)).await;
}

/// Uniform draw from the half-open think-time range, default [1.0, 3.0)
/// seconds.
pub fn think_delay(think_time: &ThinkTime) -> Duration {
    let secs = rand::rng().random_range(think_time.min_secs..think_time.max_secs);
    Duration::from_secs_f64(secs)
}

async fn checked_get(
    client: &Client,
    url: Url,
    bearer: Option<&str>,
    check: &str,
    metrics: &Mutex<RunMetrics>,
) {
    let mut request = client.get(url);
    if let Some(token) = bearer {
        request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    let started = Instant::now();
    match request.send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let bytes_received = response
                .bytes()
                .await
                .map(|body| body.len() as u64)
                .unwrap_or(0);

            let mut metrics = metrics.lock().await;
            metrics.record_request(started.elapsed(), status, bytes_received);
            metrics.record_check(check, status == 200);
        }
        Err(_) => {
            let mut metrics = metrics.lock().await;
            metrics.record_connection_error();
            metrics.record_check(check, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn think_delay_stays_in_half_open_range() {
        let think_time = ThinkTime {
            min_secs: 1.0,
            max_secs: 3.0,
        };
        for _ in 0..1000 {
            let delay = think_delay(&think_time);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay < Duration::from_secs(3));
        }
    }
}
