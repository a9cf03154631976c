//! Response handling shared by the REST providers.

use reqwest::Response;
use reqwest::StatusCode;

use crate::error::{ProviderError, Result};

/// Default `retry-after` when the header is missing or unparseable.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Map a non-success response onto a [`ProviderError`].
pub(crate) async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

        return Err(ProviderError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiRequest(format!(
            "API error ({status}): {error_text}"
        )));
    }

    Ok(response)
}
