use crate::error::AppError;
use crate::models::AuthenticatedPhone;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// 校验 `Authorization: Bearer <token>` 会话令牌，挂在需要登录的 scope 上
pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let Some(token) = token else {
            let error = AppError::AuthError("Unauthorized: No JWT provided".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        match self.jwt_service.verify_session_token(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(AuthenticatedPhone {
                    phone: claims.sub,
                    expires_at: claims.exp,
                });
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(e) => {
                log::warn!("Error verifying JWT: {e}");
                let error = AppError::AuthError("Unauthorized: Invalid JWT".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// 获取当前已认证手机号
pub fn get_authenticated_phone(req: &HttpRequest) -> Option<AuthenticatedPhone> {
    req.extensions().get::<AuthenticatedPhone>().cloned()
}
