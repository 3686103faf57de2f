use actix_web::{web, HttpResponse, Result, ResponseError};
use crate::config::ServerConfig;
use crate::models::*;
use crate::services::OtpService;

#[utoipa::path(
    post,
    path = "/api/send-otp",
    tag = "otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP sent", body = SendOtpResponse),
        (status = 400, description = "Missing or invalid phone number", body = ErrorResponse),
        (status = 500, description = "SMS delivery failed; the issued OTP stays valid", body = ErrorResponse)
    )
)]
pub async fn send_otp(
    otp_service: web::Data<OtpService>,
    server: Option<web::Data<ServerConfig>>,
    request: web::Json<SendOtpRequest>,
) -> Result<HttpResponse> {
    match otp_service.send_otp(request.phone.as_deref()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        // 未注册服务配置时按生产环境处理
        Err(e) if server.as_ref().is_some_and(|s| !s.is_production()) => {
            Ok(e.error_response_with_detail())
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/verify-otp",
    tag = "otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP verified, session token issued", body = VerifyOtpResponse),
        (status = 400, description = "Missing input, no pending OTP, expired or invalid OTP", body = ErrorResponse),
        (status = 429, description = "Too many invalid attempts", body = ErrorResponse)
    )
)]
pub async fn verify_otp(
    otp_service: web::Data<OtpService>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    match otp_service
        .verify_otp(request.phone.as_deref(), request.otp.as_deref())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn otp_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/send-otp", web::post().to(send_otp))
        .route("/verify-otp", web::post().to(verify_otp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryOtpStore, OtpStore};
    use crate::external::sms::testing::RecordingSender;
    use crate::config::{OtpConfig, ServerConfig};
    use crate::handlers::json_config;
    use crate::utils::JwtService;
    use actix_web::{App, http::StatusCode, test};
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn build_service(store: &MemoryOtpStore, sender: Arc<RecordingSender>) -> OtpService {
        OtpService::new(
            Arc::new(store.clone()),
            sender,
            JwtService::new("test-secret", 7 * 24 * 3600),
            OtpConfig {
                hash_cost: 4,
                ..OtpConfig::default()
            },
        )
    }

    macro_rules! init_app {
        ($service:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($service))
                    .app_data(json_config())
                    .service(web::scope("/api").configure(otp_config)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_send_and_verify_flow() {
        let store = MemoryOtpStore::new();
        let sender = Arc::new(RecordingSender::default());
        let app = init_app!(build_service(&store, sender.clone()));

        let req = test::TestRequest::post()
            .uri("/api/send-otp")
            .set_json(json!({ "phone": "+919876543210" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "OTP sent successfully via SMS");

        let code = sender.last_code();
        let req = test::TestRequest::post()
            .uri("/api/verify-otp")
            .set_json(json!({ "phone": "9876543210", "otp": code }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "OTP verified successfully");
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

        // 同一验证码第二次使用
        let req = test::TestRequest::post()
            .uri("/api/verify-otp")
            .set_json(json!({ "phone": "9876543210", "otp": code }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "OTP expired or invalid");
    }

    #[actix_web::test]
    async fn test_send_otp_validation_errors() {
        let store = MemoryOtpStore::new();
        let app = init_app!(build_service(&store, Arc::new(RecordingSender::default())));

        let req = test::TestRequest::post()
            .uri("/api/send-otp")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Phone number required");

        let req = test::TestRequest::post()
            .uri("/api/send-otp")
            .set_json(json!({ "phone": "123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid phone number");

        assert!(store.is_empty().await);
    }

    #[actix_web::test]
    async fn test_malformed_json_is_validation_error() {
        let store = MemoryOtpStore::new();
        let app = init_app!(build_service(&store, Arc::new(RecordingSender::default())));

        let req = test::TestRequest::post()
            .uri("/api/send-otp")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[actix_web::test]
    async fn test_delivery_failure_reports_error_but_code_verifies() {
        let store = MemoryOtpStore::new();
        let sender = Arc::new(RecordingSender::failing());
        let app = init_app!(build_service(&store, sender.clone()));

        let req = test::TestRequest::post()
            .uri("/api/send-otp")
            .set_json(json!({ "phone": "9876543210" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Failed to send SMS. Please try again.");
        assert!(body.get("detail").is_none());

        let req = test::TestRequest::post()
            .uri("/api/verify-otp")
            .set_json(json!({ "phone": "9876543210", "otp": sender.last_code() }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_verify_expired_then_not_found() {
        let store = MemoryOtpStore::new();
        store
            .insert(OtpRecord::new(
                "9876543210".to_string(),
                crate::utils::hash_code("482913", 4).unwrap(),
                Utc::now() - Duration::minutes(11),
            ))
            .await
            .unwrap();
        let app = init_app!(build_service(&store, Arc::new(RecordingSender::default())));

        let req = test::TestRequest::post()
            .uri("/api/verify-otp")
            .set_json(json!({ "phone": "9876543210", "otp": "482913" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "OTP expired");

        let req = test::TestRequest::post()
            .uri("/api/verify-otp")
            .set_json(json!({ "phone": "9876543210", "otp": "482913" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "OTP expired or invalid");
    }

    #[actix_web::test]
    async fn test_verify_missing_code() {
        let store = MemoryOtpStore::new();
        let app = init_app!(build_service(&store, Arc::new(RecordingSender::default())));

        let req = test::TestRequest::post()
            .uri("/api/verify-otp")
            .set_json(json!({ "phone": "9876543210" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Phone and OTP required");
    }

    fn server_config(environment: &str) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            environment: environment.to_string(),
        }
    }

    async fn send_with_failing_sender(environment: &str) -> (StatusCode, Value) {
        let store = MemoryOtpStore::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(build_service(
                    &store,
                    Arc::new(RecordingSender::failing()),
                )))
                .app_data(web::Data::new(server_config(environment)))
                .app_data(json_config())
                .service(web::scope("/api").configure(otp_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/send-otp")
            .set_json(json!({ "phone": "9876543210" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn test_delivery_failure_detail_only_in_development() {
        let (status, body) = send_with_failing_sender("development").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "DELIVERY_ERROR");
        assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));

        let (status, body) = send_with_failing_sender("production").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to send SMS. Please try again.");
        assert!(body.get("detail").is_none());
    }
}
