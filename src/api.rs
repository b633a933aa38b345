// Axum integration (requires the `server` feature)
#[cfg(feature = "server")]
pub mod server {
    use std::sync::Arc;

    use axum::{
        extract::{rejection::JsonRejection, State},
        http::StatusCode,
        response::{Html, IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::Value;
    use tower::ServiceBuilder;
    use tower_http::cors::CorsLayer;
    use tower_http::limit::RequestBodyLimitLayer;

    use crate::handlers::{ApiError, PredictHandler};
    use crate::validation::{FieldError, ValidationErrors};

    pub struct AppState {
        pub predict_handler: Arc<PredictHandler>,
    }

    /// Largest accepted request body; a prediction request is a few hundred bytes.
    pub const MAX_BODY_BYTES: usize = 16 * 1024;

    pub fn create_router(handler: Arc<PredictHandler>) -> Router {
        let state = Arc::new(AppState {
            predict_handler: handler,
        });

        Router::new()
            .route("/", get(root_handler))
            .route("/predict", post(predict_handler))
            .route("/model", get(model_handler))
            .route("/health", get(health_check))
            .layer(
                ServiceBuilder::new()
                    .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                    .layer(CorsLayer::permissive()),
            )
            .with_state(state)
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(self.body())).into_response()
        }
    }

    async fn predict_handler(
        State(state): State<Arc<AppState>>,
        payload: Result<Json<Value>, JsonRejection>,
    ) -> Response {
        let body = match payload {
            Ok(Json(body)) => body,
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                log::info!("🚫 Prediction body over {} bytes", MAX_BODY_BYTES);
                return rejection.into_response();
            }
            Err(rejection) => {
                log::info!("🚫 Unreadable prediction body: {}", rejection.body_text());
                let error = FieldError::json_invalid(rejection.body_text());
                return ApiError::from(ValidationErrors::single(error)).into_response();
            }
        };

        match state.predict_handler.handle(&body) {
            Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
            Err(e) => e.into_response(),
        }
    }

    async fn model_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
        Json(state.predict_handler.model_info())
    }

    async fn root_handler() -> Html<&'static str> {
        Html(include_str!("../static/index.html"))
    }

    async fn health_check() -> &'static str {
        "OK"
    }

    #[cfg(test)]
    mod tests {
        use axum::body::{to_bytes, Body};
        use axum::http::{header, Request};
        use serde_json::json;
        use tower::ServiceExt;

        use super::*;
        use crate::models::RiskLabel;
        use crate::services::artifact::{LoadedModel, ModelArtifact};
        use crate::services::inference::mock::MockPredictor;
        use crate::services::{InferenceError, InferenceService, Predictor};

        fn app_with(predictor: Arc<dyn Predictor>) -> Router {
            create_router(Arc::new(PredictHandler::new(InferenceService::new(predictor))))
        }

        fn bundled_app() -> Router {
            let artifact =
                ModelArtifact::from_slice(include_bytes!("../models/acne_model.json")).unwrap();
            app_with(Arc::new(LoadedModel::from_artifact(artifact).unwrap()))
        }

        fn valid_body() -> Value {
            json!({
                "age": 22,
                "gender": "male",
                "weight_kg": 55,
                "diet": "unhealthy",
                "sleep_hours": 2.0,
                "water_intake_liters": 0.1,
                "smoking_or_vaping": "yes"
            })
        }

        fn post_json(body: String) -> Request<Body> {
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap()
        }

        async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }

        #[tokio::test]
        async fn test_predict_created() {
            let (status, body) = send(bundled_app(), post_json(valid_body().to_string())).await;

            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body, json!({ "message": "You have acne risk." }));
        }

        #[tokio::test]
        async fn test_predict_is_idempotent() {
            let app = bundled_app();
            let mut messages = Vec::new();
            for _ in 0..3 {
                let (status, body) = send(app.clone(), post_json(valid_body().to_string())).await;
                assert_eq!(status, StatusCode::CREATED);
                messages.push(body["message"].clone());
            }

            assert!(messages.windows(2).all(|w| w[0] == w[1]));
        }

        #[tokio::test]
        async fn test_message_is_one_of_two_verdicts() {
            let app = bundled_app();
            for (age, diet, sleep) in [(15, "unhealthy", 4.0), (60, "healthy", 9.0), (35, "healthy", 6.5)] {
                let mut body = valid_body();
                body["age"] = json!(age);
                body["diet"] = json!(diet);
                body["sleep_hours"] = json!(sleep);

                let (status, body) = send(app.clone(), post_json(body.to_string())).await;
                assert_eq!(status, StatusCode::CREATED);
                let message = body["message"].as_str().unwrap();
                assert!(
                    message == "You have acne risk." || message == "You have no acne risk.",
                    "unexpected message {}",
                    message
                );
            }
        }

        #[tokio::test]
        async fn test_validation_failure_is_422_without_inference() {
            let predictor = Arc::new(MockPredictor::returning(RiskLabel::Risk));
            let app = app_with(predictor.clone());

            let mut body = valid_body();
            body["age"] = json!(-1);
            body["gender"] = json!("robot");
            let (status, body) = send(app, post_json(body.to_string())).await;

            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            let detail = body["detail"].as_array().unwrap();
            assert_eq!(detail.len(), 2);
            assert_eq!(detail[0]["loc"], json!(["body", "age"]));
            assert_eq!(detail[1]["loc"], json!(["body", "gender"]));
            assert_eq!(predictor.calls(), 0);
        }

        #[tokio::test]
        async fn test_malformed_json_is_422() {
            let (status, body) = send(bundled_app(), post_json("{\"age\": ".to_string())).await;

            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["detail"][0]["type"], "json_invalid");
        }

        #[tokio::test]
        async fn test_inference_failure_is_500() {
            let app = app_with(Arc::new(MockPredictor::failing(InferenceError::Model(
                "predictor unavailable".to_string(),
            ))));

            let (status, body) = send(app, post_json(valid_body().to_string())).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({ "Error": "predictor unavailable" }));
        }

        #[tokio::test]
        async fn test_health_and_model_info() {
            let app = bundled_app();

            let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let request = Request::builder().uri("/model").body(Body::empty()).unwrap();
            let (status, body) = send(app, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["name"], "acne-risk-classifier");
            assert_eq!(body["features"][6], "smoking_or_vaping");
        }

        #[tokio::test]
        async fn test_root_serves_form() {
            let request = Request::builder().uri("/").body(Body::empty()).unwrap();
            let response = bundled_app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let html = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(html.contains("Acne Risk Predictor"));
        }

        #[tokio::test]
        async fn test_extreme_magnitudes_still_get_a_verdict() {
            let mut body = valid_body();
            body["sleep_hours"] = json!(1.79e308);
            body["water_intake_liters"] = json!(1.79e308);

            let (status, body) = send(bundled_app(), post_json(body.to_string())).await;

            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body, json!({ "message": "You have no acne risk." }));
        }

        #[tokio::test]
        async fn test_numeric_strings_are_accepted() {
            let mut body = valid_body();
            body["age"] = json!("22");
            body["weight_kg"] = json!("55");

            let (status, body) = send(bundled_app(), post_json(body.to_string())).await;

            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body, json!({ "message": "You have acne risk." }));
        }

        #[tokio::test]
        async fn test_missing_content_type_is_422() {
            let request = Request::builder()
                .method("POST")
                .uri("/predict")
                .body(Body::from(valid_body().to_string()))
                .unwrap();

            let (status, body) = send(bundled_app(), request).await;

            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["detail"][0]["type"], "json_invalid");
            assert_eq!(body["detail"][0]["loc"], json!(["body"]));
        }

        #[tokio::test]
        async fn test_oversized_body_is_413() {
            let padding = "x".repeat(MAX_BODY_BYTES);
            let mut body = valid_body();
            body["note"] = json!(padding);
            let body = body.to_string();

            let request = Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap();
            let response = bundled_app().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        }
    }
}
