//! Typed tracker descriptors, built once from configuration.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::RequestBuilder;

use super::UploadError;
use crate::config::{TrackerAuthConfig, TrackerConfig};

/// Resolved authentication for one tracker.
#[derive(Debug, Clone)]
pub enum TrackerAuth {
    ApiKey { param: String, key: String },
    Header { name: HeaderName, value: HeaderValue },
    Bearer { value: HeaderValue },
    Cookie { value: HeaderValue },
}

impl TrackerAuth {
    fn from_config(code: &str, config: &TrackerAuthConfig) -> Result<Self, UploadError> {
        let header_value = |raw: &str| {
            HeaderValue::from_str(raw).map_err(|e| UploadError::InvalidConfig {
                tracker: code.to_string(),
                message: e.to_string(),
            })
        };

        Ok(match config {
            TrackerAuthConfig::ApiKey { param, key } => TrackerAuth::ApiKey {
                param: param.clone(),
                key: key.clone(),
            },
            TrackerAuthConfig::Header { name, value } => TrackerAuth::Header {
                name: HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    UploadError::InvalidConfig {
                        tracker: code.to_string(),
                        message: e.to_string(),
                    }
                })?,
                value: header_value(value)?,
            },
            TrackerAuthConfig::Bearer { token } => TrackerAuth::Bearer {
                value: header_value(&format!("Bearer {}", token))?,
            },
            TrackerAuthConfig::Cookie { cookie } => TrackerAuth::Cookie {
                value: header_value(cookie)?,
            },
        })
    }

    /// Attach the credential to a request.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            TrackerAuth::ApiKey { param, key } => request.query(&[(param.as_str(), key.as_str())]),
            TrackerAuth::Header { name, value } => request.header(name.clone(), value.clone()),
            TrackerAuth::Bearer { value } => request.header(AUTHORIZATION, value.clone()),
            TrackerAuth::Cookie { value } => request.header(COOKIE, value.clone()),
        }
    }
}

/// One destination tracker.
#[derive(Debug, Clone)]
pub struct TrackerDescriptor {
    pub code: String,
    pub upload_url: String,
    pub auth: TrackerAuth,
    pub timeout: Duration,
    has_credentials: bool,
}

impl TrackerDescriptor {
    pub fn has_credentials(&self) -> bool {
        self.has_credentials
    }
}

/// All configured trackers, keyed by upper-case code.
#[derive(Debug, Clone, Default)]
pub struct TrackerRegistry {
    descriptors: HashMap<String, TrackerDescriptor>,
}

impl TrackerRegistry {
    pub fn from_config(trackers: &[TrackerConfig]) -> Result<Self, UploadError> {
        let mut descriptors = HashMap::new();
        for tracker in trackers {
            let code = tracker.code.to_uppercase();
            let descriptor = TrackerDescriptor {
                code: code.clone(),
                upload_url: tracker.upload_url.clone(),
                auth: TrackerAuth::from_config(&code, &tracker.auth)?,
                timeout: Duration::from_secs(tracker.timeout_secs as u64),
                has_credentials: !tracker.auth.secret().trim().is_empty(),
            };
            descriptors.insert(code, descriptor);
        }
        Ok(Self { descriptors })
    }

    pub fn get(&self, code: &str) -> Option<&TrackerDescriptor> {
        self.descriptors.get(&code.to_uppercase())
    }

    /// Codes of trackers with non-empty credentials.
    pub fn valid_codes(&self) -> HashSet<String> {
        self.descriptors
            .values()
            .filter(|d| d.has_credentials())
            .map(|d| d.code.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(code: &str, auth: TrackerAuthConfig) -> TrackerConfig {
        TrackerConfig {
            code: code.to_string(),
            upload_url: format!("https://{}.example/upload", code.to_lowercase()),
            auth,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_registry_valid_codes() {
        let registry = TrackerRegistry::from_config(&[
            tracker(
                "tsp",
                TrackerAuthConfig::ApiKey {
                    param: "api_token".to_string(),
                    key: "k".to_string(),
                },
            ),
            tracker(
                "ATH",
                TrackerAuthConfig::Bearer {
                    token: String::new(),
                },
            ),
            tracker(
                "BHD",
                TrackerAuthConfig::Cookie {
                    cookie: "uid=1; pass=2".to_string(),
                },
            ),
        ])
        .unwrap();

        assert_eq!(registry.len(), 3);
        assert!(registry.get("TSP").is_some());
        assert!(registry.get("tsp").is_some());

        let valid = registry.valid_codes();
        assert!(valid.contains("TSP"));
        assert!(valid.contains("BHD"));
        assert!(!valid.contains("ATH"));
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let result = TrackerRegistry::from_config(&[tracker(
            "TSP",
            TrackerAuthConfig::Header {
                name: "bad header".to_string(),
                value: "v".to_string(),
            },
        )]);
        assert!(matches!(result, Err(UploadError::InvalidConfig { .. })));
    }

    #[test]
    fn test_apply_bearer() {
        let registry = TrackerRegistry::from_config(&[tracker(
            "BHD",
            TrackerAuthConfig::Bearer {
                token: "secret".to_string(),
            },
        )])
        .unwrap();
        let descriptor = registry.get("BHD").unwrap();

        let client = reqwest::Client::new();
        let request = descriptor
            .auth
            .apply(client.post(&descriptor.upload_url))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer secret"
        );
    }

    #[test]
    fn test_apply_api_key() {
        let registry = TrackerRegistry::from_config(&[tracker(
            "TSP",
            TrackerAuthConfig::ApiKey {
                param: "api_token".to_string(),
                key: "abc".to_string(),
            },
        )])
        .unwrap();
        let descriptor = registry.get("TSP").unwrap();

        let request = descriptor
            .auth
            .apply(reqwest::Client::new().post(&descriptor.upload_url))
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("api_token=abc"));
    }
}
