use actix_cors::Cors;

/// 生产环境允许的前端域名
const PRODUCTION_ORIGINS: &[&str] = &[
    "https://vattaram-8cn5.vercel.app",
    "https://vattaram-backend.onrender.com",
];

const DEVELOPMENT_ORIGIN: &str = "http://localhost:3000";

pub fn create_cors(production: bool) -> Cors {
    let cors = if production {
        PRODUCTION_ORIGINS
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    } else {
        Cors::default().allowed_origin(DEVELOPMENT_ORIGIN)
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}
