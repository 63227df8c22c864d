use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::info;

pub const TIMING_TARGET: &str = "consult.timing";

/// Wall-clock record of one consultation submission, written to the timing log.
#[derive(Debug)]
pub struct SubmissionTimer {
    client_name: String,
    has_prior_tattoo: bool,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl SubmissionTimer {
    pub fn new(client_name: &str, has_prior_tattoo: bool) -> Self {
        let client_name: String = client_name.replace('\n', " ").chars().take(80).collect();
        SubmissionTimer {
            client_name,
            has_prior_tattoo,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn log_received(&self) {
        info!(
            target: TIMING_TARGET,
            "event=submission_received client={:?} prior_tattoo={} received_at={}",
            self.client_name,
            self.has_prior_tattoo,
            self.started_at.to_rfc3339()
        );
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=submission_completed client={:?} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.client_name,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status,
            self.detail.clone().unwrap_or_default()
        );
    }
}

pub fn start_submission_timer(client_name: &str, has_prior_tattoo: bool) -> SubmissionTimer {
    let timer = SubmissionTimer::new(client_name, has_prior_tattoo);
    timer.log_received();
    timer
}

pub fn complete_submission_timer(timer: &mut SubmissionTimer, status: &str, detail: Option<String>) {
    timer.mark_status(status, detail);
    timer.log_completed();
}

pub async fn log_llm_timing<T, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    metadata: Option<JsonValue>,
    call: F,
) -> Result<T, anyhow::Error>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    let metadata_text = metadata
        .as_ref()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "{}".to_string());
    info!(
        target: TIMING_TARGET,
        "event=llm_request provider={} model={} operation={} started_at={} metadata={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339(),
        metadata_text
    );

    let result = call().await;
    let status = if result.is_err() { "error" } else { "success" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={} metadata={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status,
        metadata_text
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[tokio::test]
    async fn llm_timing_passes_results_through() {
        let ok = log_llm_timing("gemini", "m", "op", None, || async {
            Ok::<u8, anyhow::Error>(5)
        })
        .await;
        assert_eq!(ok.unwrap(), 5);

        let err = log_llm_timing("gemini", "m", "op", None, || async {
            Err::<u8, anyhow::Error>(anyhow!("boom"))
        })
        .await;
        assert_eq!(err.unwrap_err().to_string(), "boom");
    }

    #[test]
    fn submission_timer_completes_once() {
        let mut timer = SubmissionTimer::new("An\nNguyen", true);
        assert_eq!(timer.client_name, "An Nguyen");
        complete_submission_timer(&mut timer, "error", Some("missing key".to_string()));
        assert!(timer.completed);
        assert_eq!(timer.status, "error");
        timer.mark_status("success", None);
        timer.log_completed();
        assert_eq!(timer.status, "success");
    }
}
