//! HTTP front end: the upload form, the classification page and a JSON API.

mod page;

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use sortbin_core::{ClassifyError, Classification, SortbinError, Sorter};
use tower_http::trace::TraceLayer;

/// Multipart field carrying the uploaded photo.
const IMAGE_FIELD: &str = "image";

type ErrorResponse = (StatusCode, String);

#[derive(Clone)]
struct AppState {
    sorter: Arc<Sorter>,
}

/// Build the application router around a shared sorter.
pub fn router(sorter: Arc<Sorter>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index).post(classify_form))
        .route("/api/classify", post(classify_api))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { sorter })
}

async fn health() -> &'static str {
    "OK"
}

async fn index() -> Html<String> {
    Html(page::render(None))
}

async fn classify_form(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, ErrorResponse> {
    let Some(upload) = read_upload(multipart).await? else {
        return Ok(Html(page::render(None)));
    };

    let result = classify(&state, upload).await?;
    Ok(Html(page::render(Some(&result))))
}

async fn classify_api(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Classification>, ErrorResponse> {
    let Some(upload) = read_upload(multipart).await? else {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Missing `{IMAGE_FIELD}` file field"),
        ));
    };

    Ok(Json(classify(&state, upload).await?))
}

struct Upload {
    bytes: Vec<u8>,
    filename: Option<String>,
}

/// Pull the image file out of the form. `None` when there is no usable file.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<Upload>, ErrorResponse> {
    let Ok(mut multipart) = multipart else {
        return Ok(None);
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (e.status(), e.body_text()))?;

        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Upload {
            bytes: bytes.to_vec(),
            filename,
        }));
    }

    Ok(None)
}

async fn classify(state: &AppState, upload: Upload) -> Result<Classification, ErrorResponse> {
    state
        .sorter
        .classify_upload(&upload.bytes, upload.filename.as_deref())
        .await
        .map_err(error_response)
}

fn error_response(err: SortbinError) -> ErrorResponse {
    match &err {
        SortbinError::Relay(e) => {
            tracing::warn!("Image relay failed: {e}");
            (StatusCode::BAD_GATEWAY, format!("Image upload failed: {e}"))
        }
        SortbinError::Classify(
            e @ (ClassifyError::Decode { .. } | ClassifyError::ImageTooLarge { .. }),
        ) => {
            tracing::warn!("Rejected image: {e}");
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        SortbinError::Classify(e @ ClassifyError::ScoreLengthMismatch { .. }) => {
            tracing::error!("Classifier output does not match the label index: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        _ => {
            tracing::error!("Classification failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use sortbin_core::config::LimitsConfig;
    use sortbin_core::{HostedImage, ImageRelay, LabelIndex, RelayError, TaxonomyTable, ZeroShotClassifier};
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "sortbin-test-boundary";

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    struct FakeRelay {
        fail: bool,
        fetched: Vec<u8>,
    }

    #[async_trait]
    impl ImageRelay for FakeRelay {
        fn name(&self) -> &str {
            "fake"
        }

        async fn upload(
            &self,
            _bytes: &[u8],
            _filename: Option<&str>,
        ) -> Result<HostedImage, RelayError> {
            if self.fail {
                return Err(RelayError::Transport("connection reset".to_string()));
            }
            Ok(HostedImage {
                url: "https://i.ibb.co/test/can.png".to_string(),
                delete_url: None,
            })
        }

        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, RelayError> {
            Ok(self.fetched.clone())
        }
    }

    struct FixedClassifier(Vec<f32>);

    impl ZeroShotClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn classify(&self, _image: &DynamicImage, _labels: &[String]) -> Result<Vec<f32>, ClassifyError> {
            Ok(self.0.clone())
        }
    }

    fn app(relay: FakeRelay, scores: Vec<f32>) -> Router {
        let index = LabelIndex::build(&TaxonomyTable::new([
            ("aluminum", vec!["aluminum can", "tin foil"]),
            ("glass", vec!["glass bottle"]),
        ]))
        .unwrap();
        let sorter = Sorter::new(
            index,
            Arc::new(relay),
            Arc::new(FixedClassifier(scores)),
            LimitsConfig::default(),
        );
        router(Arc::new(sorter), 1024 * 1024)
    }

    fn ok_relay() -> FakeRelay {
        FakeRelay {
            fail: false,
            fetched: png_bytes(),
        }
    }

    fn multipart_request(uri: &str, field: &str, file: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"can.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app(ok_relay(), vec![])
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn get_renders_empty_form() {
        let response = app(ok_relay(), vec![])
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("<form"));
        assert!(!html.contains("<table>"));
    }

    #[tokio::test]
    async fn post_renders_ranked_categories() {
        let response = app(ok_relay(), vec![0.6, 0.1, 0.3])
            .oneshot(multipart_request("/", "image", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("https://i.ibb.co/test/can.png"));
        assert!(html.contains("Most likely: aluminum"));
        let aluminum = html.find("<td>aluminum</td>").unwrap();
        let glass = html.find("<td>glass</td>").unwrap();
        assert!(aluminum < glass);
    }

    #[tokio::test]
    async fn empty_file_rerenders_form() {
        let response = app(ok_relay(), vec![0.6, 0.1, 0.3])
            .oneshot(multipart_request("/", "image", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!body_text(response).await.contains("<table>"));
    }

    #[tokio::test]
    async fn wrong_field_rerenders_form() {
        let response = app(ok_relay(), vec![0.6, 0.1, 0.3])
            .oneshot(multipart_request("/", "photo", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!body_text(response).await.contains("<table>"));
    }

    #[tokio::test]
    async fn relay_failure_is_bad_gateway() {
        let relay = FakeRelay {
            fail: true,
            fetched: Vec::new(),
        };
        let response = app(relay, vec![0.6, 0.1, 0.3])
            .oneshot(multipart_request("/", "image", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.contains("connection reset"));
    }

    #[tokio::test]
    async fn undecodable_image_is_unprocessable() {
        let relay = FakeRelay {
            fail: false,
            fetched: b"<html>not an image</html>".to_vec(),
        };
        let response = app(relay, vec![0.6, 0.1, 0.3])
            .oneshot(multipart_request("/", "image", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn score_length_mismatch_is_server_error() {
        let response = app(ok_relay(), vec![1.0])
            .oneshot(multipart_request("/", "image", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(response).await;
        assert!(text.contains('3'));
        assert!(text.contains('1'));
    }

    #[tokio::test]
    async fn api_returns_json() {
        let response = app(ok_relay(), vec![0.1, 0.1, 0.8])
            .oneshot(multipart_request("/api/classify", "image", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["image_url"], "https://i.ibb.co/test/can.png");
        assert_eq!(json["scores"][0]["category"], "glass");
        assert_eq!(json["top_descriptor"], "glass bottle");
    }

    #[tokio::test]
    async fn api_requires_image() {
        let response = app(ok_relay(), vec![])
            .oneshot(multipart_request("/api/classify", "photo", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
