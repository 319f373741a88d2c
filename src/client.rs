//! Typed HTTP client for the `/api/v2` backend.
//!
//! One method per endpoint. Each method either returns the decoded body or a
//! [`MinutesError`] naming the operation that failed; nothing is retried.
//!
//! ## Endpoints
//!
//! | Method | Path                                   | Client method          |
//! |--------|----------------------------------------|------------------------|
//! | POST   | `/meetings/upload`                     | [`ApiClient::upload_meeting`] |
//! | PATCH  | `/meetings/{id}`                       | [`ApiClient::update_meeting`] |
//! | DELETE | `/meetings/{id}`                       | [`ApiClient::delete_meeting`] |
//! | GET    | `/meetings/{id}`                       | [`ApiClient::get_meeting`] |
//! | GET    | `/meetings/{id}/transcript`            | [`ApiClient::get_transcript`] |
//! | POST   | `/tasks`                               | [`ApiClient::create_task`] |
//! | GET    | `/tasks/{id}`                          | [`ApiClient::get_task`] |
//! | GET    | `/minutes/{id}`                        | [`ApiClient::get_minutes`] |
//! | GET    | `/minutes/{id}/download?extension=...` | [`ApiClient::download_minutes`] |

use crate::config::ClientConfig;
use crate::error::MinutesError;
use crate::models::{Created, DownloadFormat, Meeting, MeetingDetails, Minutes, Task, Transcript};
use crate::recording::resolve_recording;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Client for the meeting-minutes backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, MinutesError> {
        let http = Client::builder()
            .user_agent(concat!("meeting-minutes/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }

    // ── Meetings ─────────────────────────────────────────────────────────

    /// Upload a recording; the backend answers with the new meeting.
    pub async fn upload_meeting(&self, path: impl AsRef<Path>) -> Result<Meeting, MinutesError> {
        let recording = resolve_recording(path)?;
        let upload_failed = |reason: String| MinutesError::UploadFailed {
            path: recording.path.clone(),
            reason,
        };

        let data = tokio::fs::read(&recording.path)
            .await
            .map_err(|e| upload_failed(e.to_string()))?;
        info!(
            "Uploading {} ({} bytes)",
            recording.path.display(),
            data.len()
        );

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(recording.file_name.clone())
            .mime_str(recording.mime)
            .map_err(|e| upload_failed(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("meetings/upload"))
            .timeout(self.config.transfer_timeout())
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_failed(e.to_string()))?;

        let meeting: Meeting = decode(response)
            .await
            .map_err(|e| upload_failed(e.to_string()))?;
        info!("Uploaded as meeting {}", meeting.id);
        Ok(meeting)
    }

    /// Attach a title and participants to a meeting.
    pub async fn update_meeting(
        &self,
        meeting_id: &str,
        details: &MeetingDetails,
    ) -> Result<(), MinutesError> {
        let response = self
            .http
            .patch(self.url(&format!("meetings/{meeting_id}")))
            .json(details)
            .send()
            .await
            .and_then(Response::error_for_status);
        match response {
            Ok(_) => {
                debug!("Updated meeting {}", meeting_id);
                Ok(())
            }
            Err(e) => Err(MinutesError::MeetingUpdateFailed {
                meeting_id: meeting_id.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Delete a meeting and its media on the backend.
    pub async fn delete_meeting(&self, meeting_id: &str) -> Result<(), MinutesError> {
        let response = self
            .http
            .delete(self.url(&format!("meetings/{meeting_id}")))
            .send()
            .await?;
        ensure_success(response).await?;
        info!("Deleted meeting {}", meeting_id);
        Ok(())
    }

    pub async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, MinutesError> {
        self.get_json(&format!("meetings/{meeting_id}"))
            .await
            .map_err(|e| fetch_failed("meeting info", e))
    }

    pub async fn get_transcript(&self, meeting_id: &str) -> Result<Transcript, MinutesError> {
        self.get_json(&format!("meetings/{meeting_id}/transcript"))
            .await
            .map_err(|e| fetch_failed("transcript", e))
    }

    // ── Tasks ────────────────────────────────────────────────────────────

    /// Queue minutes generation for an uploaded meeting.
    pub async fn create_task(&self, meeting_id: &str) -> Result<Created, MinutesError> {
        let created: Created = self
            .post_json("tasks", &serde_json::json!({ "meeting_id": meeting_id }))
            .await
            .map_err(|e| MinutesError::TaskCreationFailed {
                meeting_id: meeting_id.to_string(),
                reason: e.to_string(),
            })?;
        info!("Created task {} for meeting {}", created.id, meeting_id);
        Ok(created)
    }

    /// Read the current state of a task. Errors are returned as-is; the
    /// poller decides what they mean.
    pub async fn get_task(&self, task_id: &str) -> Result<Task, MinutesError> {
        self.get_json(&format!("tasks/{task_id}")).await
    }

    // ── Minutes ──────────────────────────────────────────────────────────

    /// Fetch the generated minutes.
    ///
    /// Any non-success answer means the minutes are not available yet.
    pub async fn get_minutes(&self, meeting_id: &str) -> Result<Minutes, MinutesError> {
        let response = self
            .http
            .get(self.url(&format!("minutes/{meeting_id}")))
            .send()
            .await
            .map_err(|e| fetch_failed("minutes", e.into()))?;
        if !response.status().is_success() {
            debug!(
                "Minutes for {} unavailable: HTTP {}",
                meeting_id,
                response.status()
            );
            return Err(MinutesError::MinutesNotReady {
                meeting_id: meeting_id.to_string(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| fetch_failed("minutes", e.into()))
    }

    /// Download the rendered minutes file.
    pub async fn download_minutes(
        &self,
        meeting_id: &str,
        format: DownloadFormat,
    ) -> Result<Vec<u8>, MinutesError> {
        let download_failed = |reason: String| MinutesError::DownloadFailed {
            meeting_id: meeting_id.to_string(),
            reason,
        };

        let response = self
            .http
            .get(self.url(&format!("minutes/{meeting_id}/download")))
            .query(&[("extension", format.extension())])
            .timeout(self.config.transfer_timeout())
            .send()
            .await
            .map_err(|e| download_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_failed(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_failed(e.to_string()))?;
        info!(
            "Downloaded {} minutes for {} ({} bytes)",
            format.extension(),
            meeting_id,
            bytes.len()
        );
        Ok(bytes.to_vec())
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MinutesError> {
        let response = self.http.get(self.url(path)).send().await?;
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, MinutesError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        decode(response).await
    }
}

/// Turn a non-success response into [`MinutesError::Server`].
async fn ensure_success(response: Response) -> Result<Response, MinutesError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MinutesError::Server {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, MinutesError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

fn fetch_failed(what: &'static str, e: MinutesError) -> MinutesError {
    MinutesError::FetchFailed {
        what,
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_api_prefix() {
        let config = ClientConfig::builder()
            .base_url("http://backend:8001/")
            .build()
            .unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(
            client.url("tasks/abc"),
            "http://backend:8001/api/v2/tasks/abc"
        );
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_file_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        // Port 9 (discard) is never contacted: validation fails first.
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = ApiClient::new(&config).unwrap();
        let err = client.upload_meeting(&path).await.unwrap_err();
        assert!(matches!(err, MinutesError::UnsupportedMedia { .. }));
    }
}
