//! 基于 HTTP/JSON 的人脸服务客户端

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::image::encode_image;
use super::{FaceMatch, FaceMatcher};
use crate::config::FaceMatchConfig;
use crate::errors::{AttendanceError, Result};

#[derive(Serialize)]
struct SearchRequest<'a> {
    image: &'a str,
    max_faces: u32,
    threshold: f64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<SearchMatch>,
}

#[derive(Deserialize)]
struct SearchMatch {
    external_id: String,
    similarity: f64,
}

#[derive(Serialize)]
struct EnrollRequest<'a> {
    image: &'a str,
    external_id: &'a str,
}

#[derive(Deserialize)]
struct EnrollResponse {
    face_id: String,
}

pub struct HttpFaceMatcher {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection_id: String,
    threshold: f64,
}

impl HttpFaceMatcher {
    pub fn new(config: &FaceMatchConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(AttendanceError::external_service(
                "face_match.base_url must be set when face matching is enabled",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: Some(config.api_key.clone()).filter(|k| !k.is_empty()),
            collection_id: config.collection_id.clone(),
            threshold: config.similarity_threshold,
        })
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection_id, suffix)
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

fn service_error(action: &str, status: StatusCode) -> AttendanceError {
    AttendanceError::external_service(format!("Face service {action} failed with status {status}"))
}

fn best_match(matches: Vec<SearchMatch>) -> Option<FaceMatch> {
    matches
        .into_iter()
        .max_by(|a, b| a.similarity.total_cmp(&b.similarity))
        .map(|m| FaceMatch {
            external_id: m.external_id,
            similarity: m.similarity,
        })
}

#[async_trait]
impl FaceMatcher for HttpFaceMatcher {
    async fn ensure_collection(&self) -> Result<()> {
        let response = self.post(self.collection_url("")).send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            // 集合已存在
            StatusCode::CONFLICT => Ok(()),
            status => Err(service_error("collection setup", status)),
        }
    }

    async fn search(&self, image: &[u8]) -> Result<Option<FaceMatch>> {
        let encoded = encode_image(image);
        let body = SearchRequest {
            image: &encoded,
            max_faces: 1,
            threshold: self.threshold,
        };

        let response = self
            .post(self.collection_url("/search"))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(service_error("search", response.status()));
        }

        let result: SearchResponse = response.json().await?;
        let found = best_match(result.matches);
        debug!("Face search returned {:?}", found);
        Ok(found)
    }

    async fn enroll(&self, image: &[u8], external_id: &str) -> Result<String> {
        let encoded = encode_image(image);
        let body = EnrollRequest {
            image: &encoded,
            external_id,
        };

        let response = self
            .post(self.collection_url("/faces"))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            warn!("Enrollment of {} rejected: {}", external_id, response.status());
            return Err(service_error("enroll", response.status()));
        }

        let result: EnrollResponse = response.json().await?;
        Ok(result.face_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, HttpServer, web};

    fn test_config(base_url: String) -> FaceMatchConfig {
        FaceMatchConfig {
            enabled: true,
            base_url,
            api_key: "secret".to_string(),
            collection_id: "smart_attendance_collection".to_string(),
            similarity_threshold: 85.0,
            timeout: 5,
        }
    }

    #[test]
    fn test_best_match_picks_highest_similarity() {
        let matches = vec![
            SearchMatch {
                external_id: "111".into(),
                similarity: 86.5,
            },
            SearchMatch {
                external_id: "123".into(),
                similarity: 97.0,
            },
        ];
        assert_eq!(
            best_match(matches),
            Some(FaceMatch {
                external_id: "123".into(),
                similarity: 97.0
            })
        );
        assert_eq!(best_match(Vec::new()), None);
    }

    #[test]
    fn test_requires_base_url() {
        assert!(HttpFaceMatcher::new(&test_config("  ".into())).is_err());
    }

    #[actix_web::test]
    async fn test_client_against_stub_service() {
        let server = HttpServer::new(|| {
            App::new()
                .route(
                    "/collections/{id}",
                    web::post().to(|| async { HttpResponse::Conflict().finish() }),
                )
                .route(
                    "/collections/{id}/search",
                    web::post().to(|req: actix_web::HttpRequest| async move {
                        let authorized = req
                            .headers()
                            .get("Authorization")
                            .and_then(|v| v.to_str().ok())
                            == Some("Bearer secret");
                        if !authorized {
                            return HttpResponse::Unauthorized().finish();
                        }
                        HttpResponse::Ok().json(serde_json::json!({
                            "matches": [{"external_id": "123", "similarity": 90.0}]
                        }))
                    }),
                )
                .route(
                    "/collections/{id}/faces",
                    web::post().to(|| async {
                        HttpResponse::Ok().json(serde_json::json!({"face_id": "face-1"}))
                    }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let running = server.run();
        let handle = running.handle();
        actix_web::rt::spawn(running);

        let matcher = HttpFaceMatcher::new(&test_config(format!("http://{addr}/"))).unwrap();
        matcher.ensure_collection().await.unwrap();

        let found = matcher.search(b"image-bytes").await.unwrap().unwrap();
        assert_eq!(found.external_id, "123");
        assert_eq!(found.similarity, 90.0);

        assert_eq!(matcher.enroll(b"image-bytes", "123").await.unwrap(), "face-1");

        handle.stop(true).await;
    }
}
