use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const SESSION_TOKEN_TYPE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // normalized phone
    pub phone: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, session_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_expires_in,
        }
    }

    /// 为已验证的手机号签发会话令牌
    pub fn issue_session_token(&self, phone: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.session_expires_in);

        let claims = Claims {
            sub: phone.to_string(),
            phone: phone.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: SESSION_TOKEN_TYPE.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_session_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != SESSION_TOKEN_TYPE {
            return Err(AppError::AuthError("Invalid session token type".to_string()));
        }

        Ok(claims)
    }

    pub fn session_expires_in(&self) -> i64 {
        self.session_expires_in
    }
}
