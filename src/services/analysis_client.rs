// src/services/analysis_client.rs
use crate::config::ClientConfig;
use crate::errors::CarscanError;
use crate::models::*;
use crate::services::ImageProcessor;
use crate::validation::validate_user_id;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::path::Path;
use std::time::Instant;

pub const UPLOAD_FILENAME: &str = "image.jpg";

/// Client for the remote damage detection service.
///
/// Each call is one independent request; the struct only holds the base URL
/// and a pooled HTTP client, so it can be shared behind an `Arc`. Dropping a
/// returned future cancels the request. No retries are attempted.
pub struct AnalysisClient {
    base_url: Url,
    max_image_dimension: u32,
    client: Client,
    image_processor: ImageProcessor,
}

impl AnalysisClient {
    pub fn new(config: &ClientConfig) -> Result<Self, CarscanError> {
        let base_url = Url::parse(&config.api_url).map_err(|e| {
            CarscanError::Validation(format!("invalid API URL '{}': {}", config.api_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CarscanError::Validation(format!(
                "API URL '{}' cannot carry a path",
                config.api_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CarscanError::Validation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            max_image_dimension: config.max_image_dimension,
            client,
            image_processor: ImageProcessor::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Uploads the image at `image_path` for analysis on behalf of `user_id`.
    pub async fn submit_analysis(
        &self,
        image_path: impl AsRef<Path>,
        user_id: &str,
    ) -> Result<DamageAnalysis, CarscanError> {
        validate_user_id(user_id)?;

        let image_path = image_path.as_ref();
        let image_data = tokio::fs::read(image_path).await.map_err(|e| {
            CarscanError::AnalysisFailed(format!(
                "failed to read image {}: {}",
                image_path.display(),
                e
            ))
        })?;

        self.submit_analysis_bytes(&image_data, user_id).await
    }

    /// Same as [`submit_analysis`](Self::submit_analysis) for a capture already in memory.
    pub async fn submit_analysis_bytes(
        &self,
        image_data: &[u8],
        user_id: &str,
    ) -> Result<DamageAnalysis, CarscanError> {
        validate_user_id(user_id)?;

        let payload = self
            .image_processor
            .prepare_upload(image_data, self.max_image_dimension)
            .map_err(|e| CarscanError::AnalysisFailed(e.to_string()))?;

        let start = Instant::now();
        info!("Submitting {} byte image for user {}", payload.len(), user_id);

        let file_part = Part::bytes(payload)
            .file_name(UPLOAD_FILENAME)
            .mime_str("image/jpeg")
            .map_err(|e| CarscanError::AnalysisFailed(format!("invalid upload part: {}", e)))?;
        let form = Form::new()
            .part("file", file_part)
            .text("user_id", user_id.to_string());

        let url = self.endpoint(&["analyze"]).map_err(CarscanError::AnalysisFailed)?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| CarscanError::AnalysisFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Analysis rejected with {}: {}", status, error_text);
            return Err(CarscanError::AnalysisFailed(format!(
                "service returned {}",
                status
            )));
        }

        let record: AnalysisRecord = response
            .json()
            .await
            .map_err(|e| CarscanError::AnalysisFailed(format!("failed to parse response: {}", e)))?;

        let analysis = DamageAnalysis::try_from(record).map_err(|e| {
            CarscanError::AnalysisFailed(format!("malformed analysis: {}", e))
        })?;

        info!(
            "Analysis {} completed in {} ms: damage_detected={}, findings={}",
            analysis.id,
            start.elapsed().as_millis(),
            analysis.damage_detected,
            analysis.damage_type.len()
        );

        Ok(analysis)
    }

    /// Lists the analyses stored for `user_id`, in the order the service returns them.
    pub async fn fetch_history(&self, user_id: &str) -> Result<Vec<DamageAnalysis>, CarscanError> {
        validate_user_id(user_id)?;

        let url = self
            .endpoint(&["history", user_id])
            .map_err(CarscanError::HistoryUnavailable)?;
        debug!("Fetching history from {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CarscanError::HistoryUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("History request rejected with {}: {}", status, error_text);
            return Err(CarscanError::HistoryUnavailable(format!(
                "service returned {}",
                status
            )));
        }

        let records: Vec<AnalysisRecord> = response.json().await.map_err(|e| {
            CarscanError::HistoryUnavailable(format!("failed to parse response: {}", e))
        })?;

        let history = records
            .into_iter()
            .map(|record| {
                let id = record.id.clone();
                DamageAnalysis::try_from(record).map_err(|e| {
                    CarscanError::HistoryUnavailable(format!("malformed analysis {}: {}", id, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("Fetched {} analyses for user {}", history.len(), user_id);
        Ok(history)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| format!("base URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use mockito::Matcher;
    use std::io::Cursor;
    use std::time::Duration;

    const SCENARIO_BODY: &str = r#"{"id":"a1","user_id":"u1","image_path":"/img/a1.jpg","analysis_date":"2024-01-01T10:00:00Z","damage_detected":true,"confidence":0.92,"analysis_data":{"damage_types":[{"type":"Scratch","location":"Rear bumper","severity":"Minor","coordinates":{"x":150,"y":250,"width":100,"height":20}}],"cost_estimation":{"totalCost":450,"laborCost":200,"partsCost":150,"paintCost":100,"breakdown":[]}}}"#;

    fn jpeg_bytes() -> Vec<u8> {
        let img = RgbImage::from_fn(120, 90, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, 128]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
            .unwrap();
        out
    }

    fn client_for(server: &mockito::ServerGuard) -> AnalysisClient {
        let config = ClientConfig::new(format!("{}/api", server.url()))
            .with_timeout(Duration::from_secs(5));
        AnalysisClient::new(&config).unwrap()
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = AnalysisClient::new(&ClientConfig::new("not a url")).err().unwrap();
        assert!(matches!(err, CarscanError::Validation(_)));
    }

    #[test]
    fn endpoints_extend_the_base_path() {
        let client = AnalysisClient::new(&ClientConfig::new("http://localhost:8000/api/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.endpoint(&["analyze"]).unwrap().as_str(),
            "http://localhost:8000/api/analyze"
        );
        assert_eq!(
            client.endpoint(&["history", "a b/c"]).unwrap().as_str(),
            "http://localhost:8000/api/history/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn submit_maps_reference_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/analyze")
            .match_header("accept", "application/json")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SCENARIO_BODY)
            .create_async()
            .await;

        let analysis = client_for(&server)
            .submit_analysis_bytes(&jpeg_bytes(), "u1")
            .await
            .unwrap();

        assert_eq!(analysis.status, AnalysisStatus::Completed);
        assert_eq!(analysis.severity, Severity::Minor);
        assert_eq!(analysis.damage_type.len(), 1);
        assert_eq!(analysis.cost_estimation.total_cost, 450.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_becomes_analysis_failed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/analyze")
            .with_status(500)
            .with_body(r#"{"detail":"Error analyzing image"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .submit_analysis_bytes(&jpeg_bytes(), "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, CarscanError::AnalysisFailed(_)), "{:?}", err);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_body_becomes_analysis_failed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{not json")
            .create_async()
            .await;

        let err = client_for(&server)
            .submit_analysis_bytes(&jpeg_bytes(), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, CarscanError::AnalysisFailed(_)));
    }

    #[tokio::test]
    async fn out_of_range_confidence_becomes_analysis_failed() {
        let mut server = mockito::Server::new_async().await;
        let body = SCENARIO_BODY.replace("0.92", "1.7");
        let _mock = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let err = client_for(&server)
            .submit_analysis_bytes(&jpeg_bytes(), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, CarscanError::AnalysisFailed(ref m) if m.contains("confidence")));
    }

    #[tokio::test]
    async fn undecodable_image_fails_before_upload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/analyze")
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server)
            .submit_analysis_bytes(b"not a jpeg", "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, CarscanError::AnalysisFailed(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_file_becomes_analysis_failed() {
        let server = mockito::Server::new_async().await;
        let err = client_for(&server)
            .submit_analysis("/definitely/not/here.jpg", "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, CarscanError::AnalysisFailed(_)));
    }

    #[tokio::test]
    async fn empty_user_id_never_reaches_the_network() {
        let mut server = mockito::Server::new_async().await;
        let analyze = server
            .mock("POST", "/api/analyze")
            .expect(0)
            .create_async()
            .await;
        let history = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.fetch_history("").await,
            Err(CarscanError::Validation(_))
        ));
        assert!(matches!(
            client.submit_analysis_bytes(&jpeg_bytes(), "").await,
            Err(CarscanError::Validation(_))
        ));

        analyze.assert_async().await;
        history.assert_async().await;
    }

    #[tokio::test]
    async fn history_preserves_server_order() {
        let mut server = mockito::Server::new_async().await;
        let second = SCENARIO_BODY
            .replace("\"a1\"", "\"a0\"")
            .replace("\"damage_detected\":true", "\"damage_detected\":false");
        let body = format!("[{},{}]", SCENARIO_BODY, second);
        let mock = server
            .mock("GET", "/api/history/u1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let first_call = client.fetch_history("u1").await.unwrap();
        let second_call = client.fetch_history("u1").await.unwrap();

        assert_eq!(first_call.len(), 2);
        assert_eq!(first_call[0].id, "a1");
        assert_eq!(first_call[1].id, "a0");
        assert!(first_call[1].damage_type.is_empty());
        assert!(first_call[1].cost_estimation.is_zero());
        assert_eq!(first_call, second_call);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn history_failures_become_history_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _not_found = server
            .mock("GET", "/api/history/u1")
            .with_status(404)
            .create_async()
            .await;
        let _garbled = server
            .mock("GET", "/api/history/u2")
            .with_status(200)
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.fetch_history("u1").await,
            Err(CarscanError::HistoryUnavailable(_))
        ));
        assert!(matches!(
            client.fetch_history("u2").await,
            Err(CarscanError::HistoryUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_service_becomes_history_unavailable() {
        let config = ClientConfig::new("http://127.0.0.1:9/api")
            .with_timeout(Duration::from_secs(2));
        let client = AnalysisClient::new(&config).unwrap();
        assert!(matches!(
            client.fetch_history("u1").await,
            Err(CarscanError::HistoryUnavailable(_))
        ));
    }
}
