pub mod discord;
pub mod email;
pub mod slack;
pub mod webhook;

use crate::error::NotifyError;
use serde_json::Value;

/// POST a JSON payload and map the response onto the notify error
/// taxonomy. Shared by the webhook-family notifiers.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    url: &str,
    payload: &Value,
) -> Result<(), NotifyError> {
    let resp = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(payload)
        .send()
        .await?;

    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }

    let body = resp.text().await.unwrap_or_default();
    Err(NotifyError::Endpoint {
        status: status.as_u16(),
        body: crate::channels::truncate(&body, 500),
    })
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &s[..end])
    }
}
