//! Horizon account-state provider with multi-URL failover

use super::{AccountState, AccountStateProvider};
use crate::config::HorizonConfig;
use crate::error::ProviderError;
use crate::ledger::parse_stroops;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Multi-endpoint Horizon client
pub struct HorizonProvider {
    /// Horizon base URLs, tried in order on failure
    urls: Vec<String>,
    client: Client,
    /// Current active URL index
    current: AtomicUsize,
}

impl HorizonProvider {
    /// Create a new provider
    pub fn new(config: &HorizonConfig) -> Result<Self, ProviderError> {
        if config.urls.is_empty() {
            return Err(ProviderError::AllProvidersFailed(0));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ProviderError::Http {
                url: config.urls[0].clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            urls: config
                .urls
                .iter()
                .map(|u| u.trim_end_matches('/').to_string())
                .collect(),
            client,
            current: AtomicUsize::new(0),
        })
    }

    /// Get the active base URL
    pub fn base_url(&self) -> &str {
        let idx = self.current.load(Ordering::Relaxed);
        &self.urls[idx % self.urls.len()]
    }

    /// Switch to next available URL
    pub fn failover(&self) {
        let current = self.current.load(Ordering::Relaxed);
        let next = (current + 1) % self.urls.len();
        self.current.store(next, Ordering::Relaxed);
        warn!("Horizon failover to {}", self.urls[next]);
        crate::metrics::record_horizon_failover();
    }

    /// Health check against the active URL
    pub async fn health_check(&self) -> bool {
        let url = self.base_url().to_string();
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                error!("Health check failed for {}: status {}", url, resp.status());
                false
            }
            Err(e) => {
                error!("Health check failed for {}: {}", url, e);
                false
            }
        }
    }

    async fn fetch_account(&self, base: &str, address: &str) -> Result<AccountState, ProviderError> {
        let url = format!("{}/accounts/{}", base, address);
        let http_err = |message: String| ProviderError::Http {
            url: url.clone(),
            message,
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| http_err(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(ProviderError::NotFound(format!("account {address}"))),
            status if !status.is_success() => return Err(http_err(format!("status {status}"))),
            _ => {}
        }

        let body: HorizonAccount = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        body.into_state()
    }
}

#[async_trait]
impl AccountStateProvider for HorizonProvider {
    async fn account(&self, address: &str) -> Result<AccountState, ProviderError> {
        for _ in 0..self.urls.len() {
            let base = self.base_url().to_string();
            match self.fetch_account(&base, address).await {
                Ok(state) => {
                    debug!(
                        "Fetched account {} from {}: sequence {}",
                        address, base, state.sequence
                    );
                    return Ok(state);
                }
                Err(e @ ProviderError::NotFound(_)) => return Err(e),
                Err(e) => {
                    warn!("Failed to fetch account {} from {}: {}", address, base, e);
                    self.failover();
                }
            }
        }

        Err(ProviderError::AllProvidersFailed(self.urls.len()))
    }
}

/// `GET /accounts/{id}` response, fields the adapter needs
#[derive(Debug, Deserialize)]
struct HorizonAccount {
    account_id: String,
    sequence: String,
    #[serde(default)]
    subentry_count: u32,
    #[serde(default)]
    balances: Vec<HorizonBalance>,
}

#[derive(Debug, Deserialize)]
struct HorizonBalance {
    balance: String,
    asset_type: String,
}

impl HorizonAccount {
    fn into_state(self) -> Result<AccountState, ProviderError> {
        let sequence = self
            .sequence
            .parse::<u64>()
            .map_err(|_| ProviderError::Decode(format!("sequence '{}'", self.sequence)))?;

        let native_balance = match self.balances.iter().find(|b| b.asset_type == "native") {
            Some(b) => parse_stroops(&b.balance).map_err(|e| ProviderError::Decode(e.to_string()))?,
            None => 0,
        };

        Ok(AccountState {
            account_id: self.account_id,
            sequence,
            native_balance,
            subentry_count: self.subentry_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_horizon_account() {
        let body = r#"{
            "id": "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ",
            "account_id": "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ",
            "sequence": "3449178640719873",
            "subentry_count": 2,
            "balances": [
                {"balance": "50.0000000", "asset_type": "credit_alphanum4", "asset_code": "USDC"},
                {"balance": "12.5000000", "asset_type": "native"}
            ]
        }"#;
        let account: HorizonAccount = serde_json::from_str(body).unwrap();
        let state = account.into_state().unwrap();
        assert_eq!(state.sequence, 3_449_178_640_719_873);
        assert_eq!(state.native_balance, 125_000_000);
        assert_eq!(state.subentry_count, 2);
    }

    #[test]
    fn test_reject_bad_sequence() {
        let body = r#"{"account_id": "GABC", "sequence": "-1", "balances": []}"#;
        let account: HorizonAccount = serde_json::from_str(body).unwrap();
        assert!(matches!(account.into_state(), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn test_failover_cycles_urls() {
        let provider = HorizonProvider::new(&HorizonConfig {
            urls: vec![
                "https://horizon-a.example/".to_string(),
                "https://horizon-b.example".to_string(),
            ],
            request_timeout_ms: 1_000,
        })
        .unwrap();

        assert_eq!(provider.base_url(), "https://horizon-a.example");
        provider.failover();
        assert_eq!(provider.base_url(), "https://horizon-b.example");
        provider.failover();
        assert_eq!(provider.base_url(), "https://horizon-a.example");
    }

    #[test]
    fn test_requires_urls() {
        let result = HorizonProvider::new(&HorizonConfig {
            urls: vec![],
            request_timeout_ms: 1_000,
        });
        assert!(result.is_err());
    }
}
