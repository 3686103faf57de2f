use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::SmsConfig;
use crate::error::{AppError, AppResult};
use crate::external::SmsSender;

#[derive(Debug, Serialize)]
struct SendOtpSmsRequest<'a> {
    route: &'a str,
    numbers: &'a str,
    variables_values: &'a str,
    flash: u8, // 0 普通短信，1 闪信
}

#[derive(Debug, Deserialize)]
struct SendOtpSmsResponse {
    #[serde(rename = "return")]
    ok: bool,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    message: serde_json::Value,
}

impl SendOtpSmsResponse {
    fn message_text(&self) -> String {
        match &self.message {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            serde_json::Value::Null => "Failed to send OTP".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Fast2SmsService {
    client: Client,
    config: SmsConfig,
}

impl Fast2SmsService {
    pub fn new(config: SmsConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent("southbay-backend/fast2sms")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build SMS client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}

/// 解析服务商响应：HTTP 成功且 JSON 中 `return` 为 true 才算投递成功
fn interpret_response(status: StatusCode, body: &str) -> AppResult<Option<String>> {
    let parsed: SendOtpSmsResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Err(AppError::DeliveryError(format!(
                "Malformed SMS provider response (HTTP {}): {e}",
                status.as_u16()
            )));
        }
    };

    if !status.is_success() || !parsed.ok {
        return Err(AppError::DeliveryError(format!(
            "SMS provider rejected request (HTTP {}): {}",
            status.as_u16(),
            parsed.message_text()
        )));
    }

    Ok(parsed.request_id)
}

#[async_trait]
impl SmsSender for Fast2SmsService {
    async fn deliver(&self, phone: &str, code: &str) -> AppResult<()> {
        if !self.is_enabled() {
            return Err(AppError::DeliveryError(
                "FAST2SMS_API_KEY is not configured".to_string(),
            ));
        }

        let body = SendOtpSmsRequest {
            route: &self.config.route,
            numbers: phone,
            variables_values: code,
            flash: 0,
        };

        log::info!("Attempting to send OTP to: {phone}");

        let response = self
            .client
            .post(&self.config.base_url)
            .header("authorization", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::DeliveryError(format!(
                        "SMS provider timed out after {}s",
                        self.config.timeout_secs
                    ))
                } else {
                    AppError::DeliveryError(format!("SMS request failed: {e}"))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::DeliveryError(format!("Failed to read SMS response: {e}")))?;

        let request_id = interpret_response(status, &text)?;
        log::info!(
            "OTP SMS sent successfully: {phone}, request_id: {}",
            request_id.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_interpret_success() {
        let id = interpret_response(
            StatusCode::OK,
            r#"{"return":true,"request_id":"abc123","message":["SMS sent successfully."]}"#,
        )
        .unwrap();
        assert_eq!(id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_interpret_provider_rejection() {
        let err = interpret_response(
            StatusCode::OK,
            r#"{"return":false,"status_code":412,"message":"Invalid Authentication"}"#,
        )
        .unwrap_err();
        match err {
            AppError::DeliveryError(msg) => assert!(msg.contains("Invalid Authentication")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_error_status_and_malformed_body() {
        assert!(matches!(
            interpret_response(StatusCode::BAD_GATEWAY, r#"{"return":true}"#),
            Err(AppError::DeliveryError(_))
        ));
        assert!(matches!(
            interpret_response(StatusCode::OK, "<html>oops</html>"),
            Err(AppError::DeliveryError(_))
        ));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>);

    async fn fake_provider(
        req: HttpRequest,
        body: web::Json<serde_json::Value>,
        captured: web::Data<Captured>,
    ) -> HttpResponse {
        let auth = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.0.lock().unwrap().push((auth, body.into_inner()));
        HttpResponse::Ok().json(serde_json::json!({
            "return": true,
            "request_id": "req-1",
            "message": ["SMS sent successfully."]
        }))
    }

    #[actix_web::test]
    async fn test_deliver_posts_expected_payload() {
        let captured = Captured::default();
        let data = web::Data::new(captured.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/dev/bulkV2", web::post().to(fake_provider))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let handle = server.run();
        let server_handle = handle.handle();
        actix_web::rt::spawn(handle);

        let service = Fast2SmsService::new(SmsConfig {
            api_key: "test-key".to_string(),
            base_url: format!("http://{addr}/dev/bulkV2"),
            ..SmsConfig::default()
        })
        .unwrap();

        service.deliver("9876543210", "482913").await.unwrap();

        {
            let calls = captured.0.lock().unwrap();
            assert_eq!(calls.len(), 1);
            let (auth, body) = &calls[0];
            assert_eq!(auth.as_deref(), Some("test-key"));
            assert_eq!(body["route"], "otp");
            assert_eq!(body["numbers"], "9876543210");
            assert_eq!(body["variables_values"], "482913");
            assert_eq!(body["flash"], 0);
        }

        server_handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_deliver_without_api_key_fails() {
        let service = Fast2SmsService::new(SmsConfig::default()).unwrap();
        assert!(matches!(
            service.deliver("9876543210", "482913").await,
            Err(AppError::DeliveryError(_))
        ));
    }
}
