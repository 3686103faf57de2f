use actix_web::{App, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines
use std::sync::Arc;

use southbay_backend::{
    config::Config,
    database::{
        DbPool, MemoryOtpStore, OtpStore, SeaOrmOtpStore, close_pool, create_pool, run_migrations,
    },
    external::Fast2SmsService,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::OtpService,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    log::error!("{context}: {err}");
    std::io::Error::other(format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config =
        Config::from_toml().map_err(|e| startup_error("Failed to load configuration", e))?;

    // 选择存储：memory:// 使用进程内存储，其余走数据库
    let (store, pool): (Arc<dyn OtpStore>, Option<DbPool>) = if config.database.is_memory() {
        log::warn!("Using in-memory OTP store; records are lost on restart");
        let store: Arc<dyn OtpStore> = Arc::new(MemoryOtpStore::new());
        (store, None)
    } else {
        // 创建数据库连接池
        let pool = create_pool(&config.database)
            .await
            .map_err(|e| startup_error("Failed to create database connection pool", e))?;

        // 运行数据库迁移
        run_migrations(&pool)
            .await
            .map_err(|e| startup_error("Failed to run database migrations", e))?;

        let store: Arc<dyn OtpStore> = Arc::new(SeaOrmOtpStore::new(pool.clone()));
        (store, Some(pool))
    };

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.session_expires_in);

    // 创建外部服务
    let sms_service = Fast2SmsService::new(config.sms.clone())
        .map_err(|e| startup_error("Failed to create SMS client", e))?;
    if !sms_service.is_enabled() {
        log::warn!("FAST2SMS_API_KEY is not set; OTP delivery will fail");
    }

    // 创建服务
    let otp_service = OtpService::new(
        store,
        Arc::new(sms_service),
        jwt_service.clone(),
        config.otp.clone(),
    );

    // 启动后台定时任务
    tasks::spawn_all(otp_service.clone(), config.otp.purge_interval_secs);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{} ({})",
        config.server.host,
        config.server.port,
        config.server.environment
    );

    let production = config.server.is_production();
    let server_config = web::Data::new(config.server.clone());
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(production))
            .app_data(web::Data::new(otp_service.clone()))
            .app_data(server_config.clone())
            .app_data(handlers::json_config())
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api")
                    .configure(handlers::otp_config)
                    .service(
                        web::scope("/session")
                            .wrap(AuthMiddleware::new(jwt_service.clone()))
                            .configure(handlers::session_config),
                    ),
            )
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    if let Some(pool) = pool {
        close_pool(pool)
            .await
            .map_err(|e| startup_error("Failed to close database connection", e))?;
    }
    Ok(())
}
