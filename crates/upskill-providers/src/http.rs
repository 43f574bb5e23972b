//! Status handling shared by the HTTP providers.

use reqwest::header::HeaderMap;
use reqwest::Response;

use crate::ProviderError;

/// Seconds to wait on a 429 that carries no usable `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub(crate) fn client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .expect("failed to build HTTP client")
}

pub(crate) fn send_error(e: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

/// `retry-after` in milliseconds; only the delay-seconds form is understood.
pub(crate) fn retry_after_ms(headers: &HeaderMap) -> u64 {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
        .saturating_mul(1000)
}

/// Pass successful responses through; map everything else to a [`ProviderError`].
pub(crate) async fn check_status(response: Response, model: &str) -> Result<Response, ProviderError> {
    let status = response.status().as_u16();
    match status {
        429 => Err(ProviderError::RateLimited {
            retry_after_ms: retry_after_ms(response.headers()),
        }),
        401 | 403 => Err(ProviderError::AuthenticationFailed(
            response.text().await.unwrap_or_default(),
        )),
        404 => Err(ProviderError::ModelNotFound(model.to_string())),
        s if s >= 400 => {
            let body = response.text().await.unwrap_or_default();
            // Gemini reports a bad key as a 400 with this reason.
            if body.contains("API_KEY_INVALID") {
                Err(ProviderError::AuthenticationFailed(body))
            } else {
                Err(ProviderError::ApiError {
                    status,
                    message: body,
                })
            }
        }
        _ => Ok(response),
    }
}

pub(crate) fn parse_error(e: reqwest::Error) -> ProviderError {
    ProviderError::ApiError {
        status: 0,
        message: format!("failed to parse response: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("7"));
        assert_eq!(retry_after_ms(&headers), 7000);
    }

    #[test]
    fn retry_after_missing_or_http_date() {
        assert_eq!(retry_after_ms(&HeaderMap::new()), 5000);

        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        assert_eq!(retry_after_ms(&headers), 5000);
    }

    #[test]
    fn huge_retry_after_saturates() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("18446744073709551615"),
        );
        assert_eq!(retry_after_ms(&headers), u64::MAX);
    }
}
