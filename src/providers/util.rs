use anyhow::{Context, Result, bail};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Joins `path` onto `base_url` and appends `params` as a query string.
pub fn build_url(base_url: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let url = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params)
    };
    url.with_context(|| format!("Invalid request URL: {raw}"))
}

/// Fails on a non-2xx status, otherwise decodes the body as JSON.
///
/// The raw body is logged when it cannot be decoded.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response, provider: &str) -> Result<T> {
    let status = response.status();
    let url = response.url().clone();
    let response_text = response
        .text()
        .await
        .with_context(|| format!("Failed to get {provider} response text"))?;

    if !status.is_success() {
        bail!("{provider} API returned {status} for {}: {response_text}", url.path());
    }
    debug!(provider, path = url.path(), bytes = response_text.len(), "Received response");

    match serde_json::from_str(&response_text) {
        Ok(data) => Ok(data),
        Err(e) => {
            error!(
                error = ?e,
                response = %response_text,
                "Failed to parse {provider} response"
            );
            Err(e).with_context(|| format!("Failed to parse {provider} response"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: i64,
    }

    #[test]
    fn test_build_url() {
        let url = build_url("http://localhost:8080/", "/v1/tags", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/tags");

        let url = build_url(
            "http://localhost:8080",
            "/v1/transactions",
            &[("start_date", "2024-01-01"), ("limit", "10000")],
        )
        .unwrap();
        assert_eq!(url.path(), "/v1/transactions");
        assert_eq!(url.query(), Some("start_date=2024-01-01&limit=10000"));
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(build_url("not a url", "/x", &[]).is_err());
    }

    #[tokio::test]
    async fn test_read_json_status_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": 7}"#))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let get = |p: &str| reqwest::get(format!("{}{p}", mock_server.uri()));

        let ok: Payload = read_json(get("/ok").await.unwrap(), "Test").await.unwrap();
        assert_eq!(ok.value, 7);

        let err = read_json::<Payload>(get("/denied").await.unwrap(), "Test")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad token"));

        let err = read_json::<Payload>(get("/garbage").await.unwrap(), "Test")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse Test response"));
    }
}
