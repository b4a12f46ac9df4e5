use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};

use super::types::{InferenceTransport, PredictRequest};
use super::InferenceError;

/// File name used when the upload arrived without one.
const DEFAULT_FILE_NAME: &str = "xray.jpg";
/// Part type used when the declared media type does not parse.
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// HTTP client for the remote `/predict/` endpoint.
pub struct HttpInferenceClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpInferenceClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InferenceError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/predict/", self.base_url)
    }

    fn build_form(request: &PredictRequest<'_>) -> Result<Form, InferenceError> {
        let image = request.image;
        let file_name = if image.file_name.trim().is_empty() {
            DEFAULT_FILE_NAME.to_string()
        } else {
            image.file_name.clone()
        };

        let part = match Part::bytes(image.bytes.clone())
            .file_name(file_name.clone())
            .mime_str(&image.media_type)
        {
            Ok(part) => part,
            Err(e) => {
                tracing::warn!(
                    media_type = %image.media_type,
                    error = %e,
                    "Inference: unparseable media type, sending as octet-stream"
                );
                Part::bytes(image.bytes.clone())
                    .file_name(file_name)
                    .mime_str(FALLBACK_MEDIA_TYPE)
                    .map_err(|e| InferenceError::InvalidRequest(e.to_string()))?
            }
        };

        let form = request
            .patient
            .form_fields()
            .into_iter()
            .fold(Form::new().part("file", part), |form, (key, value)| {
                form.text(key, value)
            });

        Ok(form)
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            InferenceError::Connection(self.base_url.clone())
        } else {
            InferenceError::HttpClient(e.to_string())
        }
    }
}

impl InferenceTransport for HttpInferenceClient {
    fn predict(&self, request: &PredictRequest<'_>) -> Result<String, InferenceError> {
        let url = self.endpoint();
        let form = Self::build_form(request)?;

        tracing::info!(
            url = %url,
            bytes = request.image.bytes.len(),
            reference = request.patient.reference_number.as_deref().unwrap_or(""),
            "Inference request sent"
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(InferenceError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientContext, UploadedFile};
    use crate::pipeline::inference::test_http::{one_shot_server, unused_local_url};

    fn jpeg() -> UploadedFile {
        UploadedFile::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10], "image/jpeg", "chest.jpg")
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = HttpInferenceClient::new("http://localhost:8000/", 30).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
        assert_eq!(client.endpoint(), "http://localhost:8000/predict/");
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn posts_multipart_with_patient_fields() {
        let (url, handle) = one_shot_server(200, r#"{"diagnosis":"Normal","confidence":0.97}"#);
        let client = HttpInferenceClient::new(&url, 10).unwrap();
        let patient = PatientContext {
            name: Some("Ana Reyes".into()),
            age: Some("54".into()),
            gender: None,
            reference_number: Some("XR-260309-0042".into()),
        };

        let body = client
            .predict(&PredictRequest {
                image: &jpeg(),
                patient: &patient,
            })
            .unwrap();
        assert!(body.contains("\"Normal\""));

        let request = handle.join().unwrap();
        assert!(request.starts_with("POST /predict/ HTTP/1.1"));
        assert!(request.contains("multipart/form-data"));
        assert!(request.contains("name=\"file\"; filename=\"chest.jpg\""));
        assert!(request.contains("name=\"patient_name\""));
        assert!(request.contains("XR-260309-0042"));
        assert!(!request.contains("name=\"patient_gender\""));
    }

    #[test]
    fn non_success_status_is_service_error() {
        let (url, handle) = one_shot_server(503, "model warming up");
        let client = HttpInferenceClient::new(&url, 10).unwrap();
        let err = client
            .predict(&PredictRequest {
                image: &jpeg(),
                patient: &PatientContext::default(),
            })
            .unwrap_err();
        handle.join().unwrap();
        match err {
            InferenceError::ServiceError { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model warming up");
            }
            other => panic!("expected ServiceError, got {other:?}"),
        }
    }

    #[test]
    fn refused_connection_is_reported() {
        let client = HttpInferenceClient::new(&unused_local_url(), 5).unwrap();
        let err = client
            .predict(&PredictRequest {
                image: &jpeg(),
                patient: &PatientContext::default(),
            })
            .unwrap_err();
        assert!(matches!(err, InferenceError::Connection(_)), "{err:?}");
    }

    #[test]
    fn unparseable_media_type_is_sent_as_octet_stream() {
        let (url, handle) = one_shot_server(200, r#"{"diagnosis":"Normal","confidence":0.9}"#);
        let client = HttpInferenceClient::new(&url, 10).unwrap();
        let odd = UploadedFile::new(vec![0xFF, 0xD8, 0xFF], "jpeg", "chest.jpg");

        let body = client
            .predict(&PredictRequest {
                image: &odd,
                patient: &PatientContext::default(),
            })
            .unwrap();
        assert!(body.contains("Normal"));

        let request = handle.join().unwrap();
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: application/octet-stream"));
    }

    #[test]
    fn silent_server_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let holder = std::thread::spawn(move || {
            // Accept and hold the socket open without replying
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(std::time::Duration::from_secs(3));
            drop(stream);
        });

        let client = HttpInferenceClient::new(&url, 1).unwrap();
        let err = client
            .predict(&PredictRequest {
                image: &jpeg(),
                patient: &PatientContext::default(),
            })
            .unwrap_err();
        holder.join().unwrap();
        assert!(matches!(err, InferenceError::Timeout(1)), "{err:?}");
    }
}
