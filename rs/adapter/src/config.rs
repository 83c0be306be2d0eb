use crate::error_types::ConfigError;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Publish-identity credential, required.
pub const METRICS_PRIVATE_KEY: &str = "METRICS_PRIVATE_KEY";
/// Default node-name base, required unless every configured role carries an
/// explicit name list.
pub const VALIDATOR_NAME: &str = "VALIDATOR_NAME";
/// Cycle period in seconds.
pub const POLL_INTERVAL_SECONDS: &str = "POLL_INTERVAL_SECONDS";
/// Per-fetch timeout in seconds.
pub const REQUEST_TIMEOUT_SECONDS: &str = "REQUEST_TIMEOUT_SECONDS";
/// Per-metric sample-count cutoff.
pub const MAX_METRICS_LENGTH: &str = "MAX_METRICS_LENGTH";
/// Base URL of the pub/sub gateway the envelopes are published through.
pub const METRICS_GATEWAY_URL: &str = "METRICS_GATEWAY_URL";

pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_MAX_METRICS_LENGTH: usize = 100;
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:7171/api/v1";

/// The four node flavors one deployment can expose, in resolution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    /// The validator's consensus node (Heimdall).
    ValidatorConsensus,
    /// The validator's execution node (Bor).
    ValidatorExecution,
    /// A sentry consensus node.
    SentryConsensus,
    /// A sentry execution node.
    SentryExecution,
}

impl NodeRole {
    pub const ALL: [NodeRole; 4] = [
        NodeRole::ValidatorConsensus,
        NodeRole::ValidatorExecution,
        NodeRole::SentryConsensus,
        NodeRole::SentryExecution,
    ];

    /// Env key holding the comma-separated metrics URL list for this role.
    pub fn url_env_key(self) -> &'static str {
        match self {
            NodeRole::ValidatorConsensus => "VALIDATOR_HEIMDALL",
            NodeRole::ValidatorExecution => "VALIDATOR_BOR",
            NodeRole::SentryConsensus => "SENTRY_HEIMDALL",
            NodeRole::SentryExecution => "SENTRY_BOR",
        }
    }

    /// Env key holding the optional comma-separated node-name list.
    pub fn names_env_key(self) -> &'static str {
        match self {
            NodeRole::ValidatorConsensus => "VALIDATOR_HEIMDALL_NAMES",
            NodeRole::ValidatorExecution => "VALIDATOR_BOR_NAMES",
            NodeRole::SentryConsensus => "SENTRY_HEIMDALL_NAMES",
            NodeRole::SentryExecution => "SENTRY_BOR_NAMES",
        }
    }

    /// The fixed, well-known channel this role publishes to.
    pub fn channel(self) -> &'static str {
        match self {
            NodeRole::ValidatorConsensus => "polygon-validators.eth/validator/heimdall",
            NodeRole::ValidatorExecution => "polygon-validators.eth/validator/bor",
            NodeRole::SentryConsensus => "polygon-validators.eth/sentry/heimdall",
            NodeRole::SentryExecution => "polygon-validators.eth/sentry/bor",
        }
    }

    /// Human-readable role label used in display names and error messages.
    pub fn label(self) -> &'static str {
        match self {
            NodeRole::ValidatorConsensus => "Validator Heimdall",
            NodeRole::ValidatorExecution => "Validator Bor",
            NodeRole::SentryConsensus => "Sentry Heimdall",
            NodeRole::SentryExecution => "Sentry Bor",
        }
    }
}

/// One node's scrape configuration. The target set is resolved once at
/// startup and is immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollTarget {
    pub role: NodeRole,
    /// Logical identity published inside the envelope.
    pub node_name: String,
    /// Label used in log lines, `"{role label} ({node_name})"`.
    pub display_name: String,
    /// Metrics endpoint to scrape.
    pub url: Url,
    /// Channel the envelope is published to.
    pub channel: &'static str,
}

/// The adapter configuration, resolved from the environment exactly once.
#[derive(Clone, Debug)]
pub struct Config {
    pub targets: Vec<PollTarget>,
    pub private_key: String,
    pub gateway_url: Url,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub max_metrics_length: usize,
}

impl Config {
    /// Resolves the full configuration from an environment snapshot. Every
    /// violation is fatal: the process must not start polling on a partially
    /// valid configuration.
    pub fn from_env(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let private_key = require(env, METRICS_PRIVATE_KEY)?;
        let targets = resolve_targets(env)?;

        let gateway_raw = get_nonempty(env, METRICS_GATEWAY_URL).unwrap_or(DEFAULT_GATEWAY_URL);
        let gateway_url = Url::parse(gateway_raw).map_err(|source| ConfigError::InvalidUrl {
            key: METRICS_GATEWAY_URL,
            value: gateway_raw.to_string(),
            source,
        })?;

        Ok(Config {
            targets,
            private_key,
            gateway_url,
            poll_interval: Duration::from_secs(parse_u64(
                env,
                POLL_INTERVAL_SECONDS,
                DEFAULT_POLL_INTERVAL_SECONDS,
            )?),
            request_timeout: Duration::from_secs(parse_u64(
                env,
                REQUEST_TIMEOUT_SECONDS,
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )?),
            max_metrics_length: parse_u64(
                env,
                MAX_METRICS_LENGTH,
                DEFAULT_MAX_METRICS_LENGTH as u64,
            )? as usize,
        })
    }
}

/// Derives the set of independent poll targets from the environment, one
/// role at a time, preserving role order and within-role input order.
pub fn resolve_targets(env: &HashMap<String, String>) -> Result<Vec<PollTarget>, ConfigError> {
    let mut targets = Vec::new();
    for role in NodeRole::ALL {
        targets.extend(resolve_role(env, role)?);
    }
    if targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    Ok(targets)
}

fn resolve_role(env: &HashMap<String, String>, role: NodeRole) -> Result<Vec<PollTarget>, ConfigError> {
    let urls = split_list(env.get(role.url_env_key()).map(String::as_str).unwrap_or(""));
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let names = match env.get(role.names_env_key()) {
        Some(raw) => {
            let names = split_list(raw);
            if names.len() != urls.len() {
                return Err(ConfigError::NameCountMismatch {
                    role: role.label(),
                    urls: urls.len(),
                    names: names.len(),
                });
            }
            names
        }
        // Names default to the global validator name, suffixed with a
        // 1-based index when the role has more than one URL.
        None => {
            let base = require(env, VALIDATOR_NAME)?;
            if urls.len() == 1 {
                vec![base]
            } else {
                (1..=urls.len()).map(|i| format!("{}-{}", base, i)).collect()
            }
        }
    };

    urls.into_iter()
        .zip(names)
        .map(|(raw_url, node_name)| {
            let url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
                key: role.url_env_key(),
                value: raw_url,
                source,
            })?;
            Ok(PollTarget {
                role,
                display_name: format!("{} ({})", role.label(), node_name),
                node_name,
                url,
                channel: role.channel(),
            })
        })
        .collect()
}

/// Splits a comma-separated list, dropping empty and whitespace-only
/// segments.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_nonempty<'a>(env: &'a HashMap<String, String>, key: &'static str) -> Option<&'a str> {
    env.get(key).map(String::as_str).map(str::trim).filter(|v| !v.is_empty())
}

fn require(env: &HashMap<String, String>, key: &'static str) -> Result<String, ConfigError> {
    get_nonempty(env, key)
        .map(str::to_string)
        .ok_or(ConfigError::MissingEnv(key))
}

fn parse_u64(env: &HashMap<String, String>, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match get_nonempty(env, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry(METRICS_PRIVATE_KEY.to_string())
            .or_insert_with(|| "0xsecret".to_string());
        map
    }

    #[test]
    fn explicit_names_pair_positionally() {
        let env = env(&[
            ("VALIDATOR_BOR", "http://a,http://b"),
            ("VALIDATOR_BOR_NAMES", "x,y"),
        ]);
        let targets = resolve_targets(&env).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].node_name, "x");
        assert_eq!(targets[1].node_name, "y");
        assert_eq!(targets[0].url.as_str(), "http://a/");
        assert_eq!(targets[1].url.as_str(), "http://b/");
        for target in &targets {
            assert_eq!(target.channel, "polygon-validators.eth/validator/bor");
        }
    }

    #[test]
    fn name_count_mismatch_is_fatal() {
        let env = env(&[
            ("SENTRY_HEIMDALL", "http://a,http://b"),
            ("SENTRY_HEIMDALL_NAMES", "only-one"),
        ]);
        match resolve_targets(&env) {
            Err(ConfigError::NameCountMismatch { role, urls, names }) => {
                assert_eq!(role, "Sentry Heimdall");
                assert_eq!(urls, 2);
                assert_eq!(names, 1);
            }
            other => panic!("expected NameCountMismatch, got {:?}", other),
        }
    }

    #[test]
    fn single_url_uses_bare_validator_name() {
        let env = env(&[
            ("VALIDATOR_NAME", "alice"),
            ("VALIDATOR_HEIMDALL", "http://heimdall:26660/metrics"),
        ]);
        let targets = resolve_targets(&env).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].node_name, "alice");
        assert_eq!(targets[0].display_name, "Validator Heimdall (alice)");
    }

    #[test]
    fn multiple_urls_get_indexed_names() {
        let env = env(&[
            ("VALIDATOR_NAME", "alice"),
            ("SENTRY_BOR", "http://a,http://b,http://c"),
        ]);
        let targets = resolve_targets(&env).unwrap();
        let names: Vec<_> = targets.iter().map(|t| t.node_name.as_str()).collect();
        assert_eq!(names, vec!["alice-1", "alice-2", "alice-3"]);
    }

    #[test]
    fn whitespace_segments_are_skipped() {
        let env = env(&[
            ("VALIDATOR_NAME", "alice"),
            ("VALIDATOR_BOR", "http://a, ,,http://b"),
        ]);
        let targets = resolve_targets(&env).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].node_name, "alice-1");
        assert_eq!(targets[1].node_name, "alice-2");
    }

    #[test]
    fn roles_resolve_in_fixed_order() {
        let env = env(&[
            ("VALIDATOR_NAME", "alice"),
            ("SENTRY_BOR", "http://sb"),
            ("VALIDATOR_HEIMDALL", "http://vh"),
            ("SENTRY_HEIMDALL", "http://sh"),
            ("VALIDATOR_BOR", "http://vb"),
        ]);
        let roles: Vec<_> = resolve_targets(&env).unwrap().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                NodeRole::ValidatorConsensus,
                NodeRole::ValidatorExecution,
                NodeRole::SentryConsensus,
                NodeRole::SentryExecution,
            ]
        );
    }

    #[test]
    fn missing_validator_name_is_fatal_when_names_are_implicit() {
        let env = env(&[("VALIDATOR_BOR", "http://a")]);
        match resolve_targets(&env) {
            Err(ConfigError::MissingEnv(key)) => assert_eq!(key, VALIDATOR_NAME),
            other => panic!("expected MissingEnv, got {:?}", other),
        }
    }

    #[test]
    fn explicit_names_everywhere_need_no_validator_name() {
        let env = env(&[
            ("VALIDATOR_BOR", "http://a"),
            ("VALIDATOR_BOR_NAMES", "x"),
        ]);
        assert!(resolve_targets(&env).is_ok());
    }

    #[test]
    fn no_configured_endpoints_is_fatal() {
        let env = env(&[("VALIDATOR_NAME", "alice")]);
        assert!(matches!(resolve_targets(&env), Err(ConfigError::NoTargets)));
    }

    #[test]
    fn missing_private_key_is_fatal() {
        let mut env = env(&[("VALIDATOR_NAME", "alice"), ("VALIDATOR_BOR", "http://a")]);
        env.remove(METRICS_PRIVATE_KEY);
        match Config::from_env(&env) {
            Err(ConfigError::MissingEnv(key)) => assert_eq!(key, METRICS_PRIVATE_KEY),
            other => panic!("expected MissingEnv, got {:?}", other),
        }
    }

    #[test]
    fn tunables_default_when_absent() {
        let env = env(&[("VALIDATOR_NAME", "alice"), ("VALIDATOR_BOR", "http://a")]);
        let config = Config::from_env(&env).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_metrics_length, 100);
        assert_eq!(config.gateway_url.as_str(), "http://127.0.0.1:7171/api/v1");
    }

    #[test]
    fn malformed_number_is_fatal_not_defaulted() {
        let env = env(&[
            ("VALIDATOR_NAME", "alice"),
            ("VALIDATOR_BOR", "http://a"),
            ("POLL_INTERVAL_SECONDS", "sixty"),
        ]);
        match Config::from_env(&env) {
            Err(ConfigError::InvalidNumber { key, value }) => {
                assert_eq!(key, POLL_INTERVAL_SECONDS);
                assert_eq!(value, "sixty");
            }
            other => panic!("expected InvalidNumber, got {:?}", other),
        }
    }

    #[test]
    fn malformed_url_is_fatal() {
        let env = env(&[("VALIDATOR_NAME", "alice"), ("VALIDATOR_BOR", "not a url")]);
        assert!(matches!(
            resolve_targets(&env),
            Err(ConfigError::InvalidUrl { key: "VALIDATOR_BOR", .. })
        ));
    }
}
