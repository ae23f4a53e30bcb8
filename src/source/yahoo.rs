//! Yahoo Finance chart client
//!
//! Public chart endpoint, no API key required. Intraday history is limited by
//! the vendor (1m bars for roughly the last week, 5m for about two months),
//! which is why [`super::SeriesFetcher`] falls back to a coarser interval.

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::debug;

use super::{Interval, TimeSeriesSource};
use crate::common::{RateLimiter, RateLimiterConfig};
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::{RawBar, Symbol};

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Decode a chart payload into raw bars.
///
/// A result with no timestamps (no trades in range) is an empty series, not an
/// error. Null closes are kept here and dropped when the series is built.
pub fn parse_chart(body: &str) -> Result<Vec<RawBar>, FetchError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        return Err(FetchError::Upstream {
            code: err.code,
            description: err.description,
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(FetchError::Decode(format!(
            "{} timestamps but {} closes",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let bars = result
        .timestamp
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| DateTime::from_timestamp(ts, 0).map(|dt| RawBar::new(dt, close)))
        .collect();

    Ok(bars)
}

/// HTTP client for the chart endpoint
#[derive(Debug, Clone)]
pub struct YahooChartClient {
    client: Client,
    base_url: Url,
    limiter: RateLimiter,
    timeout: StdDuration,
}

impl YahooChartClient {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let timeout = StdDuration::from_secs(config.timeout_secs.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| FetchError::InvalidBaseUrl(config.base_url.clone()))?;

        Ok(YahooChartClient {
            client,
            base_url,
            limiter: RateLimiter::new(
                RateLimiterConfig::default().with_rate(config.rate_limit_per_sec),
            ),
            timeout,
        })
    }

    /// Chart endpoint for `symbol`, with the symbol percent-encoded as one path segment
    pub fn chart_url(&self, symbol: &Symbol) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol.as_str()]);
        Ok(url)
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http(e)
        }
    }
}

impl TimeSeriesSource for YahooChartClient {
    async fn query(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<Vec<RawBar>, FetchError> {
        self.limiter.acquire().await;

        let params = [
            ("period1", start.timestamp().to_string()),
            ("period2", end.timestamp().to_string()),
            ("interval", interval.as_str().to_string()),
            ("includePrePost", "false".to_string()),
        ];

        debug!(
            "Fetching chart: symbol={}, interval={}, start={}, end={}",
            symbol, interval, start, end
        );

        let response = self
            .client
            .get(self.chart_url(symbol)?)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        // Unknown symbols come back as 404 with a chart.error body; prefer that message
        if !status.is_success() {
            return match parse_chart(&body) {
                Err(upstream @ FetchError::Upstream { .. }) => Err(upstream),
                _ => Err(FetchError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                }),
            };
        }

        parse_chart(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_keeps_nulls_as_none() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"RY.TO"},
            "timestamp":[1709564400,1709564460,1709564520],
            "indicators":{"quote":[{"close":[131.5,null,131.9],"open":[131.4,null,131.6]}]}}],
            "error":null}}"#;

        let bars = parse_chart(body).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].close, Some(131.5));
        assert_eq!(bars[1].close, None);
        assert_eq!(bars[2].datetime.timestamp(), 1709564520);
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match parse_chart(body) {
            Err(FetchError::Upstream { code, .. }) => assert_eq!(code, "Not Found"),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chart_without_trades_is_empty() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_rejects_garbage() {
        assert!(matches!(parse_chart("<html>"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_chart_url() {
        let config = SourceConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..SourceConfig::default()
        };
        let client = YahooChartClient::new(&config).unwrap();
        assert_eq!(
            client.chart_url(&Symbol::new("BNS.TO")).unwrap().as_str(),
            "http://localhost:9000/v8/finance/chart/BNS.TO"
        );
    }

    #[test]
    fn test_chart_url_encodes_symbol() {
        let client = YahooChartClient::new(&SourceConfig::default()).unwrap();
        let url = client.chart_url(&Symbol::new("BRK/B#1 ?")).unwrap();

        assert_eq!(url.path(), "/v8/finance/chart/BRK%2FB%231%20%3F");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        for base_url in ["not a url", "mailto:quotes@example.com"] {
            let config = SourceConfig {
                base_url: base_url.to_string(),
                ..SourceConfig::default()
            };
            assert!(matches!(
                YahooChartClient::new(&config),
                Err(FetchError::InvalidBaseUrl(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_stalled_body_is_a_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Server sends headers promising a body, then stalls
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 4096\r\n\r\n{\"chart\":")
                .await
                .unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(StdDuration::from_secs(10)).await;
        });

        let config = SourceConfig {
            base_url: format!("http://{}", addr),
            timeout_secs: 1,
            ..SourceConfig::default()
        };
        let client = YahooChartClient::new(&config).unwrap();
        let end = Utc::now();

        let err = client
            .query(
                &Symbol::new("RY.TO"),
                end - chrono::Duration::minutes(70),
                end,
                Interval::OneMinute,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(t) if t == StdDuration::from_secs(1)));
    }
}
