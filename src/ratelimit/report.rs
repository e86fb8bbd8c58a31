//! Load report for operational visibility.

use serde::Serialize;

use super::policy::RateLimitPolicy;

/// Active clients at a point in time, plus the policy they run under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    #[serde(rename = "totalActiveIPs")]
    pub total_active_ips: usize,
    #[serde(rename = "activeIPs")]
    pub active_ips: Vec<ClientLoad>,
    pub config: PolicyReport,
}

/// One client's usage of its current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientLoad {
    pub ip: String,
    pub count: u64,
    /// Window end in epoch milliseconds
    pub reset_time: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyReport {
    pub window_ms: u64,
    pub max_requests: u64,
    pub message: String,
    pub status_code: u16,
}

impl From<&RateLimitPolicy> for PolicyReport {
    fn from(policy: &RateLimitPolicy) -> Self {
        Self {
            window_ms: policy.window_ms,
            max_requests: policy.max_requests,
            message: policy.message.clone(),
            status_code: policy.status_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_shape() {
        let report = LoadReport {
            total_active_ips: 1,
            active_ips: vec![ClientLoad {
                ip: "1.2.3.4".to_string(),
                count: 3,
                reset_time: 61_000,
                remaining: 27,
            }],
            config: PolicyReport::from(&RateLimitPolicy::default()),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalActiveIPs"], 1);
        assert_eq!(json["activeIPs"][0]["ip"], "1.2.3.4");
        assert_eq!(json["activeIPs"][0]["resetTime"], 61_000);
        assert_eq!(json["activeIPs"][0]["remaining"], 27);
        assert_eq!(json["config"]["windowMs"], 60_000);
        assert_eq!(json["config"]["maxRequests"], 30);
        assert_eq!(json["config"]["statusCode"], 429);
    }
}
