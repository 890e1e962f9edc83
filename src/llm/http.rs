//! HTTP plumbing for the generation client.

use crate::llm::GenError;
use reqwest::Client as HttpClient;
use serde_json::Value;

/// Sends an HTTP POST request with a JSON body and returns the parsed
/// JSON response.
///
/// Non-success statuses become `GenError::Api` with a sanitized body:
/// HTML error pages from proxies are elided and long bodies truncated,
/// so the message is safe to echo into a chat.
///
/// # Errors
///
/// Returns `GenError::Network` on connectivity issues, `GenError::Api`
/// on non-success status codes, or `GenError::Json` if parsing fails.
pub async fn send_json_request(
    client: &HttpClient,
    url: &str,
    body: &Value,
) -> Result<Value, GenError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| GenError::Network(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();

        // Detect HTML error pages from Nginx/proxies
        let is_html = error_text.trim_start().starts_with("<!DOCTYPE")
            || error_text.trim_start().starts_with("<html")
            || error_text.trim_start().starts_with("<HTML");

        let clean_message = if is_html {
            format!("API error: {status} (Server returned HTML error page)")
        } else {
            let truncated = if error_text.len() > 500 {
                format!("{}... (truncated)", &error_text[..500])
            } else {
                error_text
            };
            format!("API error: {status} - {truncated}")
        };

        return Err(GenError::Api(clean_message));
    }

    response
        .json()
        .await
        .map_err(|e| GenError::Json(e.to_string()))
}
