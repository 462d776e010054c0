//! Configuration validation.
//!
//! Returns every semantic error at once, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::chain::registry::normalize_chain_id;
use crate::config::schema::SyncConfig;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid URL: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("session.preferred_chain_id is not a chain id: '{0}'")]
    InvalidChainId(String),

    #[error("observability.metrics_address is not a socket address: '{0}'")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let provider = &config.provider;
    if provider.enabled {
        if provider.rpc_url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: "provider.rpc_url",
                value: provider.rpc_url.clone(),
            });
        }
        for failover in &provider.failover_urls {
            if failover.parse::<url::Url>().is_err() {
                errors.push(ValidationError::InvalidUrl {
                    field: "provider.failover_urls",
                    value: failover.clone(),
                });
            }
        }
    }

    let positive = [
        ("provider.connect_timeout_secs", provider.connect_timeout_secs),
        ("provider.query_timeout_secs", provider.query_timeout_secs),
        ("provider.event_poll_interval_ms", provider.event_poll_interval_ms),
        ("polling.interval_secs", config.polling.interval_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if let Some(chain_id) = &config.session.preferred_chain_id {
        if normalize_chain_id(chain_id).parse::<u64>().is_err() {
            errors.push(ValidationError::InvalidChainId(chain_id.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
