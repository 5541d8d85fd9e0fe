//! Push gateway client.
//!
//! Snapshots go to `<url>/metrics/job/<job>`, using POST to merge into the
//! group (`add`) or PUT to replace it (`replace`).

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, ProtobufEncoder, TextEncoder};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use tracing::debug;

use super::labels::JOB_LABEL;
use crate::config::{PushConfig, PushFormat, PushMethod};
use crate::error::{MetricsError, Result};

const BASE64_SUFFIX: &str = "@base64";

/// A push target resolved from its configuration.
pub struct Pusher {
    client: reqwest::Client,
    url: Url,
    method: PushMethod,
    format: PushFormat,
}

impl Pusher {
    /// `default_job` is used when the configuration names no job.
    pub fn new(config: &PushConfig, default_job: &str) -> Result<Self> {
        let job = config.job.as_deref().unwrap_or(default_job);
        let url = grouping_url(&config.url, job)?;
        let mut builder = reqwest::Client::builder();
        // 0 disables the timeout
        if config.timeout_in_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_in_ms));
        }
        let client = builder
            .build()
            .map_err(|source| MetricsError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(Pusher {
            client,
            url,
            method: config.method,
            format: config.format,
        })
    }

    /// Full URL of the job group.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Sends `families` in one request. A non-2xx answer is an error; there is no retry.
    pub async fn push(&self, families: &[MetricFamily]) -> Result<()> {
        check_grouping_labels(families, &[JOB_LABEL])?;
        let (body, content_type) = encode(families, self.format)?;
        let method = match self.method {
            PushMethod::Add => Method::POST,
            PushMethod::Replace => Method::PUT,
        };

        debug!(
            event_name = "metrics.push.request",
            event_domain = "metrics",
            url = self.url(),
            method = %method,
            content_type = content_type.as_str(),
            bytes = body.len(),
            "sending metrics to push gateway"
        );

        let response = self
            .client
            .request(method, self.url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|source| MetricsError::Transport {
                url: self.url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MetricsError::PushRejected {
                url: self.url.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Returns the path component for a grouping value and the suffix to put
/// after the label name. Values the gateway cannot take as a plain path
/// segment are sent base64-encoded.
fn encode_component(value: &str) -> (String, &'static str) {
    if value.is_empty() {
        ("=".to_string(), BASE64_SUFFIX)
    } else if value.contains('/') {
        (general_purpose::URL_SAFE_NO_PAD.encode(value), BASE64_SUFFIX)
    } else {
        (value.to_string(), "")
    }
}

/// Builds `<base>/metrics/job/<job>`. A base without scheme gets `http://`.
pub fn grouping_url(base: &str, job: &str) -> Result<Url> {
    let invalid = |reason: String| MetricsError::InvalidUrl {
        url: base.to_string(),
        reason,
    };

    let absolute = if base.contains("://") {
        base.to_string()
    } else {
        format!("http://{}", base)
    };
    let mut url = Url::parse(absolute.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;

    let (value, suffix) = encode_component(job);
    url.path_segments_mut()
        .map_err(|_| invalid("url cannot be a base".to_string()))?
        .pop_if_empty()
        .push("metrics")
        .push(&format!("{}{}", JOB_LABEL, suffix))
        .push(&value);
    Ok(url)
}

/// The gateway adds the grouping labels itself; series must not carry them.
pub fn check_grouping_labels(families: &[MetricFamily], grouping: &[&str]) -> Result<()> {
    for family in families {
        for metric in family.get_metric() {
            if let Some(label) = metric
                .get_label()
                .iter()
                .find(|label| grouping.contains(&label.get_name()))
            {
                return Err(MetricsError::GroupingLabelCollision {
                    metric: family.get_name().to_string(),
                    label: label.get_name().to_string(),
                });
            }
        }
    }
    Ok(())
}

fn encode(families: &[MetricFamily], format: PushFormat) -> Result<(Vec<u8>, String)> {
    let mut buffer = Vec::new();
    let content_type = match format {
        PushFormat::Text => {
            let encoder = TextEncoder::new();
            encoder.encode(families, &mut buffer)?;
            encoder.format_type().to_string()
        }
        PushFormat::Protobuf => {
            let encoder = ProtobufEncoder::new();
            encoder.encode(families, &mut buffer)?;
            encoder.format_type().to_string()
        }
    };
    Ok((buffer, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use prometheus::{GaugeVec, Opts, Registry};

    fn push_config(url: String) -> PushConfig {
        PushConfig {
            url,
            job: None,
            format: PushFormat::Text,
            method: PushMethod::Add,
            timeout_in_ms: 2_000,
        }
    }

    fn sample_families(label: &str) -> Vec<MetricFamily> {
        let registry = Registry::new();
        let gauge = GaugeVec::new(Opts::new("sample_gauge", "A sample gauge."), &[label]).unwrap();
        registry.register(Box::new(gauge.clone())).unwrap();
        gauge.with_label_values(&["home"]).set(3.0);
        registry.gather()
    }

    #[test]
    fn test_grouping_url() {
        let url = grouping_url("http://gateway:9091", "home").unwrap();
        assert_eq!(url.as_str(), "http://gateway:9091/metrics/job/home");

        let url = grouping_url("gateway:9091/", "home").unwrap();
        assert_eq!(url.as_str(), "http://gateway:9091/metrics/job/home");

        let url = grouping_url("https://example.com/prefix/", "nightly run").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/prefix/metrics/job/nightly%20run"
        );
    }

    #[test]
    fn test_grouping_url_encodes_slashes_and_empty_job() {
        let url = grouping_url("http://gateway:9091", "a/b").unwrap();
        assert_eq!(url.as_str(), "http://gateway:9091/metrics/job@base64/YS9i");

        let url = grouping_url("http://gateway:9091", "").unwrap();
        assert_eq!(url.as_str(), "http://gateway:9091/metrics/job@base64/=");
    }

    #[test]
    fn test_job_label_on_series_is_rejected() {
        let result = check_grouping_labels(&sample_families("job"), &[JOB_LABEL]);
        assert!(matches!(
            result,
            Err(MetricsError::GroupingLabelCollision { label, .. }) if label == "job"
        ));
        assert!(check_grouping_labels(&sample_families("profile"), &[JOB_LABEL]).is_ok());
    }

    #[tokio::test]
    async fn test_push_text_with_post() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/metrics/job/home")
            .match_header("content-type", Matcher::Regex("^text/plain".to_string()))
            .match_body(Matcher::Regex(r#"sample_gauge\{profile="home"\} 3"#.to_string()))
            .with_status(200)
            .create_async()
            .await;

        let pusher = Pusher::new(&push_config(server.url()), "home").unwrap();
        let result = pusher.push(&sample_families("profile")).await;

        m.assert_async().await;
        assert!(result.is_ok(), "Expected push to succeed: {:?}", result);
    }

    #[tokio::test]
    async fn test_push_protobuf_with_put() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("PUT", "/metrics/job/nightly")
            .match_header(
                "content-type",
                Matcher::Regex("^application/vnd.google.protobuf".to_string()),
            )
            .with_status(202)
            .create_async()
            .await;

        let mut config = push_config(server.url());
        config.job = Some("nightly".to_string());
        config.format = PushFormat::Protobuf;
        config.method = PushMethod::Replace;

        let pusher = Pusher::new(&config, "home").unwrap();
        let result = pusher.push(&sample_families("profile")).await;

        m.assert_async().await;
        assert!(result.is_ok(), "Expected push to succeed: {:?}", result);
    }

    #[tokio::test]
    async fn test_zero_timeout_means_no_timeout() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/metrics/job/home")
            .with_status(200)
            .create_async()
            .await;

        let mut config = push_config(server.url());
        config.timeout_in_ms = 0;
        let pusher = Pusher::new(&config, "home").unwrap();
        let result = pusher.push(&sample_families("profile")).await;

        m.assert_async().await;
        assert!(result.is_ok(), "Expected push to succeed: {:?}", result);
    }

    #[tokio::test]
    async fn test_push_rejected_by_gateway() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/metrics/job/home")
            .with_status(400)
            .with_body("pushed metrics are invalid")
            .create_async()
            .await;

        let pusher = Pusher::new(&push_config(server.url()), "home").unwrap();
        let result = pusher.push(&sample_families("profile")).await;

        match result {
            Err(MetricsError::PushRejected { status, body, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "pushed metrics are invalid");
            }
            other => panic!("Expected PushRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_push_to_unreachable_gateway() {
        let pusher = Pusher::new(&push_config("http://127.0.0.1:1".to_string()), "home").unwrap();
        let result = pusher.push(&sample_families("profile")).await;
        assert!(matches!(result, Err(MetricsError::Transport { .. })));
    }
}
