use std::{num::NonZeroU32, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use futures::TryStreamExt;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Streams remote videos that refuse hot-linked requests. Upstream requests
/// never carry a Referer.
pub struct VideoProxy {
    client: reqwest::Client,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl VideoProxy {
    pub fn new(client: reqwest::Client, rps: u32) -> Self {
        let rps = NonZeroU32::new(rps.max(1)).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, limiter }
    }

    pub async fn fetch(
        &self,
        url: Option<&str>,
        range: Option<&HeaderValue>,
    ) -> AppResult<Response> {
        let url = parse_target(url)?;

        self.limiter.until_ready().await;

        debug!(url = %url, range = ?range, "proxying video");

        let mut req = self.client.get(url.clone());
        if let Some(range) = range {
            req = req.header(header::RANGE, range.clone());
        }

        let upstream = req.send().await?;
        let status = upstream.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "video upstream rejected request");
            return Err(AppError::BadGateway { status: status.as_u16() });
        }

        let headers = response_headers(upstream.headers());
        let stream = upstream
            .bytes_stream()
            .inspect_err(move |e| warn!(url = %url, error = %e, "video stream interrupted"));
        let mut resp = Response::new(Body::from_stream(stream));
        *resp.status_mut() = if status == StatusCode::PARTIAL_CONTENT {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        };
        *resp.headers_mut() = headers;
        Ok(resp)
    }
}

/// Outbound client for the proxy. Redirects must not add a Referer either.
pub fn build_client(connect_timeout: Duration) -> AppResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .referer(false)
        .connect_timeout(connect_timeout)
        .build()?)
}

fn parse_target(url: Option<&str>) -> AppResult<reqwest::Url> {
    let Some(raw) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Err(AppError::validation("缺少视频URL参数"));
    };
    let parsed = reqwest::Url::parse(raw).map_err(|_| AppError::validation("视频URL格式错误"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::validation("视频URL格式错误"));
    }
    Ok(parsed)
}

fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = upstream
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    for name in [header::CONTENT_LENGTH, header::CONTENT_RANGE] {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }

    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600"));
    headers
}
