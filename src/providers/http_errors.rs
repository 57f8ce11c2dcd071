use anyhow::anyhow;
use std::error::Error as StdError;
use std::io::ErrorKind;

fn error_chain_has_io_kind(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

/// Map a transport failure into an actionable message. API-level failures
/// (non-success statuses) are handled by the provider instead.
pub(crate) fn api_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> anyhow::Error {
    if err.is_timeout() || error_chain_has_io_kind(&err, ErrorKind::TimedOut, "timed out") {
        return anyhow!(
            "Request timed out after {}s while calling '{}'. \
             Increase PLEXI_REQUEST_TIMEOUT_SECS or try again.",
            timeout_secs,
            api_url
        );
    }

    if err.is_connect() {
        if error_chain_has_io_kind(&err, ErrorKind::ConnectionRefused, "connection refused") {
            return anyhow!(
                "Connection refused by '{}'. \
                 Check PLEXI_API_BASE_URL and that the endpoint is reachable.",
                api_url
            );
        }

        return anyhow!(
            "Failed to connect to '{}'. \
             Check PLEXI_API_BASE_URL and network connectivity.",
            api_url
        );
    }

    anyhow!("Failed to call '{}': {}", api_url, err)
}
