use thiserror::Error;

/// Failures that end a run (or reject a scenario) with a precise cause.
///
/// Everything else flows through `anyhow` at the command layer.
#[derive(Debug, Error)]
pub enum RunError {
    /// Setup authentication was rejected. Fatal for the whole run: no
    /// iteration may issue traffic without the shared token.
    #[error("signin failed with HTTP {status}: {body}")]
    SigninRejected { status: u16, body: String },

    #[error("invalid threshold expression `{expr}` for metric `{metric}`")]
    BadThreshold { metric: String, expr: String },

    #[error("unknown threshold metric `{0}` (expected http_req_duration or http_req_failed)")]
    UnknownMetric(String),

    #[error("aggregate `{aggregate}` cannot be applied to metric `{metric}`")]
    BadAggregate { metric: String, aggregate: String },

    #[error("scenario declares no ramp stages")]
    NoStages,

    #[error("think time range [{min}, {max}) is empty or negative")]
    BadThinkTime { min: f64, max: f64 },
}
