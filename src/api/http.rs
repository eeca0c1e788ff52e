use super::{ProbeOutcome, SentimentApi};
use crate::error::AnalyzeError;
use crate::model::{ApiErrorBody, Classification, ClassifyRequest, ClassifyResponse, Sentiment};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, warn};

const HEALTH_PATH: &str = "/actuator/health";
const SENTIMENT_PATH: &str = "/sentiment";

/// reqwest-backed client for the sentiment service.
///
/// No request timeout is configured; deadlines are left to the transport.
#[derive(Debug, Clone)]
pub struct HttpSentimentApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSentimentApi {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .user_agent(format!("sentiment-cli/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SentimentApi for HttpSentimentApi {
    async fn probe(&self) -> ProbeOutcome {
        match self.http.get(self.url(HEALTH_PATH)).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(status = %resp.status(), "health endpoint ok");
                return ProbeOutcome::Reachable;
            }
            Ok(resp) => debug!(status = %resp.status(), "health endpoint not ok, trying base url"),
            Err(e) => debug!(error = %e, "health endpoint unreachable, trying base url"),
        }

        // Any HTTP response from the base address counts as reachable.
        match self.http.get(&self.base_url).send().await {
            Ok(resp) => {
                debug!(status = %resp.status(), "base url reachable");
                ProbeOutcome::Reachable
            }
            Err(e) => {
                debug!(error = %e, "base url unreachable");
                ProbeOutcome::Unreachable
            }
        }
    }

    async fn classify(&self, text: &str) -> Result<Classification, AnalyzeError> {
        let response = self
            .http
            .post(self.url(SENTIMENT_PATH))
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "classification request failed");
                AnalyzeError::Transport(e.to_string())
            })?;

        let status = response.status();
        debug!(status = %status, "classification response received");

        let body = response
            .text()
            .await
            .map_err(|e| AnalyzeError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(http_error(status, &body));
        }

        parse_classification(&body)
    }
}

/// Build the user-facing error for a non-success status.
fn http_error(status: reqwest::StatusCode, body: &str) -> AnalyzeError {
    let base = format!("HTTP {}", status.as_u16());
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed
            .erro
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(base),
        Err(_) => format!("{base}: {}", status.canonical_reason().unwrap_or("Unknown")),
    };
    AnalyzeError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Validate a success body: non-empty known label and a probability in [0, 1].
pub(crate) fn parse_classification(body: &str) -> Result<Classification, AnalyzeError> {
    let parsed: ClassifyResponse =
        serde_json::from_str(body).map_err(|_| AnalyzeError::InvalidResponse)?;
    let label = parsed
        .previsao
        .filter(|l| !l.trim().is_empty())
        .ok_or(AnalyzeError::InvalidResponse)?;
    let probability = parsed
        .probabilidade
        .filter(|p| (0.0..=1.0).contains(p))
        .ok_or(AnalyzeError::InvalidResponse)?;
    let sentiment = Sentiment::from_label(&label).ok_or_else(|| {
        warn!(label = %label, "unrecognized classification label");
        AnalyzeError::InvalidResponse
    })?;
    Ok(Classification {
        sentiment,
        probability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpSentimentApi {
        HttpSentimentApi::new(&server.uri()).unwrap()
    }

    #[tokio::test]
    async fn classify_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .and(body_json(serde_json::json!({"text": "Adorei o produto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "previsao": "Positivo",
                "probabilidade": 0.91,
                "mensagem": "Análise realizada com sucesso",
                "timestamp": "2026-10-18T10:00:00"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server).classify("Adorei o produto").await.unwrap();
        assert_eq!(c.sentiment, Sentiment::Positive);
        assert_eq!(c.probability, 0.91);
    }

    #[tokio::test]
    async fn classify_surfaces_erro_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"erro": "texto inválido"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).classify("qualquer").await.unwrap_err();
        assert_eq!(err.to_string(), "texto inválido");
        assert!(matches!(err, AnalyzeError::Http { status: 400, .. }));
    }

    #[tokio::test]
    async fn classify_falls_back_to_status_and_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
            .mount(&server)
            .await;

        let err = client(&server).classify("qualquer").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    }

    #[tokio::test]
    async fn classify_json_error_without_erro_uses_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(serde_json::json!({"detail": "down"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).classify("qualquer").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503");
    }

    #[tokio::test]
    async fn classify_rejects_missing_probability() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"previsao": "negativo"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).classify("qualquer").await.unwrap_err();
        assert_eq!(err, AnalyzeError::InvalidResponse);
    }

    #[tokio::test]
    async fn probe_uses_health_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/actuator/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "UP"})))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(client(&server).probe().await, ProbeOutcome::Reachable);
    }

    #[tokio::test]
    async fn probe_falls_back_to_base_url() {
        // No mocks mounted: every path answers 404, which still proves reachability.
        let server = MockServer::start().await;
        assert_eq!(client(&server).probe().await, ProbeOutcome::Reachable);
    }

    #[tokio::test]
    async fn probe_reports_unreachable() {
        let api = HttpSentimentApi::new("http://127.0.0.1:1").unwrap();
        assert_eq!(api.probe().await, ProbeOutcome::Unreachable);
    }

    #[test]
    fn parse_rejects_empty_label_and_out_of_range() {
        assert_eq!(
            parse_classification(r#"{"previsao": "", "probabilidade": 0.5}"#),
            Err(AnalyzeError::InvalidResponse)
        );
        assert_eq!(
            parse_classification(r#"{"previsao": "positivo", "probabilidade": 1.5}"#),
            Err(AnalyzeError::InvalidResponse)
        );
        assert_eq!(
            parse_classification(r#"{"previsao": "neutro", "probabilidade": 0.5}"#),
            Err(AnalyzeError::InvalidResponse)
        );
    }
}
