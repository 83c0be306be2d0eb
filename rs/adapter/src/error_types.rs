use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Fatal configuration errors. Raised at startup only; the process exits
/// before any polling begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required env variable is absent or empty.
    #[error("required env variable {0} is not set")]
    MissingEnv(&'static str),

    /// An explicit name list's length differs from its URL list's length.
    #[error("number of {role} URLs ({urls}) doesn't match the number of names ({names})")]
    NameCountMismatch {
        role: &'static str,
        urls: usize,
        names: usize,
    },

    /// A URL-valued setting failed to parse.
    #[error("invalid URL in {key} ({value:?}): {source}")]
    InvalidUrl {
        key: &'static str,
        value: String,
        source: url::ParseError,
    },

    /// A numeric setting failed to parse.
    #[error("invalid value for {key}: {value:?} (expected an integer)")]
    InvalidNumber { key: &'static str, value: String },

    /// No role has any metrics endpoint configured.
    #[error(
        "no endpoints configured; set the Prometheus URLs of your nodes in one or more of \
         VALIDATOR_HEIMDALL, VALIDATOR_BOR, SENTRY_HEIMDALL, SENTRY_BOR"
    )]
    NoTargets,
}

/// A single scrape attempt failed before the body could be parsed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure, including the request timeout.
    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("request to {url} returned status {status}")]
    Status { url: Url, status: StatusCode },
}

/// The endpoint answered, but the body is not valid exposition text.
#[derive(Debug, Error)]
#[error("failed to parse metrics exposition: {0}")]
pub struct ParseError(#[from] pub std::io::Error);

/// Everything that can go wrong while collecting one target's metrics.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A publish attempt or permission probe against the gateway failed.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Network-level failure talking to the gateway.
    #[error("gateway request for channel {channel} failed: {source}")]
    Request {
        channel: String,
        #[source]
        source: reqwest::Error,
    },

    /// The gateway rejected the request.
    #[error("gateway rejected request for channel {channel} with status {status}")]
    Rejected { channel: String, status: StatusCode },

    /// The gateway answered with a body this adapter cannot interpret.
    #[error("unexpected gateway response for channel {channel}: {reason}")]
    InvalidResponse { channel: String, reason: String },
}

/// Fatal permission failures, raised during startup validation only.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("the publish identity does not have permission to publish to {channel}")]
    Denied { channel: &'static str },

    #[error("permission check for {channel} failed")]
    Check {
        channel: &'static str,
        #[source]
        source: PublishError,
    },
}

/// Startup validation failures. Never caught; the process exits with a
/// descriptive message so the operator can fix the deployment.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("{target}: couldn't retrieve metrics from {url}")]
    Unreachable {
        target: String,
        url: Url,
        #[source]
        source: CollectError,
    },
}

/// Everything a poll lane can fail with. Caught at the lane boundary and
/// logged; never propagates to the orchestrator or sibling lanes.
#[derive(Debug, Error)]
pub enum LaneError {
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl LaneError {
    /// Short outcome label used for the lane outcome counter.
    pub fn status_label(&self) -> &'static str {
        match self {
            LaneError::Collect(CollectError::Fetch(_)) => "fetch_error",
            LaneError::Collect(CollectError::Parse(_)) => "parse_error",
            LaneError::Publish(_) => "publish_error",
        }
    }
}
