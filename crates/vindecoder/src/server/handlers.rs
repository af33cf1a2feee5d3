//! Request handlers.

use std::path::{Path, PathBuf};

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::decoder::Decoder;
use crate::error::Error;
use crate::storage::{Storage, StorageStats};

/// Body of `POST /api/decode`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodeRequest {
    /// The VIN to decode.
    #[serde(default)]
    pub vin: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `UP` when the database answers.
    pub status: &'static str,
    /// Table sizes.
    #[serde(flatten)]
    pub stats: StorageStats,
}

/// Run `f` against the shared storage on the blocking pool.
async fn with_storage<T, F>(state: web::Data<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Storage) -> crate::error::Result<T> + Send + 'static,
{
    let result = web::block(move || {
        let storage = state
            .storage
            .lock()
            .map_err(|_| Error::internal("storage lock poisoned"))?;
        f(&storage)
    })
    .await?;
    Ok(result?)
}

/// Decode a VIN.
#[post("/api/decode")]
pub async fn decode(
    state: web::Data<AppState>,
    body: web::Json<DecodeRequest>,
) -> Result<HttpResponse, ApiError> {
    let vin = body.into_inner().vin;
    let decoded = with_storage(state, move |storage| Decoder::new(storage).decode(&vin)).await?;
    Ok(HttpResponse::Ok().json(decoded))
}

/// Generate and decode a random VIN.
#[post("/api/generate")]
pub async fn generate(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let decoded = with_storage(state, |storage| {
        Decoder::new(storage).generate(&mut rand::rng())
    })
    .await?;
    Ok(HttpResponse::Ok().json(decoded))
}

/// Every factory with its logo status.
#[get("/api/factories/logos")]
pub async fn factory_logos(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let overview = with_storage(state, Storage::logo_overview).await?;
    Ok(HttpResponse::Ok().json(overview))
}

/// Whether `name` is a plain file name that cannot leave its directory.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

fn content_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Read `filename` from `dir` and return it with its content type.
async fn image_file(dir: PathBuf, filename: String, kind: &str) -> Result<HttpResponse, ApiError> {
    if !is_safe_file_name(&filename) {
        return Err(ApiError::bad_request(format!("invalid file name: {filename}")));
    }

    let file = dir.join(&filename);
    let bytes = web::block(move || std::fs::read(file)).await?;
    match bytes {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type(content_type(&filename))
            .body(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found(format!("{kind} not found: {filename}")))
        }
        Err(e) => Err(ApiError::internal(&e)),
    }
}

/// Serve a logo thumbnail.
#[get("/img/logos/{filename}")]
pub async fn logo_file(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    image_file(state.logo_dir.clone(), path.into_inner(), "logo").await
}

/// Serve a region icon.
#[get("/img/regions/{filename}")]
pub async fn region_icon_file(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    image_file(state.region_icon_dir.clone(), path.into_inner(), "region icon").await
}

/// Liveness check with table sizes.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let stats = with_storage(state, Storage::stats).await?;
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "UP",
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{test as actix_test, App};

    use super::*;
    use crate::server::configure;
    use crate::storage::{Country, WmiFactory};

    const HONDA: &str = "1HGCM82633A004352";

    /// State serving images from `root/logos` and `root/regions`.
    fn state(root: &Path) -> web::Data<AppState> {
        let storage = Storage::open_in_memory().unwrap();
        let us = storage
            .insert_country(&Country {
                iso_alpha2: "US".to_string(),
                name: "United States".to_string(),
                common_name: Some("United States".to_string()),
                region: Some("North America".to_string()),
                ..Country::default()
            })
            .unwrap();
        storage.insert_region_code("1H", us).unwrap();
        let honda = storage
            .insert_factory(&WmiFactory {
                wmi: "1HG".to_string(),
                name: "Honda".to_string(),
                country_id: Some(us),
                ..WmiFactory::default()
            })
            .unwrap();
        storage.insert_logo(honda, "honda.png").unwrap();
        let mut config = crate::config::Config::default();
        config.logos.output_dir = Some(root.join("logos"));
        config.region_icons.output_dir = Some(root.join("regions"));
        web::Data::new(AppState::new(storage, &config))
    }

    #[actix_web::test]
    async fn test_decode_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/decode")
            .set_json(serde_json::json!({ "vin": HONDA }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["wmi"], "1HG");
        assert_eq!(body["manufacturer"], "Honda");
        assert_eq!(body["manufacturer_logos"][0], "honda.png");
        assert_eq!(body["check_digit_valid"], true);
    }

    #[actix_web::test]
    async fn test_decode_invalid_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/decode")
            .set_json(serde_json::json!({ "vin": "1HGCM8263IA004352" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid character \"I\" found");
    }

    #[actix_web::test]
    async fn test_decode_missing_vin() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/decode")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_generate() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/api/generate").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["wmi"], "1HG");
        assert_eq!(body["check_digit_valid"], true);
        assert_eq!(body["vin"].as_str().unwrap().len(), 17);
    }

    #[actix_web::test]
    async fn test_factory_logos() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/factories/logos")
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body[0]["wmi"], "1HG");
        assert_eq!(body[0]["country"], "United States");
        assert_eq!(body[0]["hasLogos"], true);
        assert_eq!(body[0]["logoCount"], 1);
    }

    #[actix_web::test]
    async fn test_logo_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("logos")).unwrap();
        std::fs::write(dir.path().join("logos").join("honda.png"), b"png-bytes").unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/img/logos/honda.png")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("content-type").unwrap(), "image/png");
        let body = actix_test::read_body(resp).await;
        assert_eq!(&body[..], b"png-bytes");

        let req = actix_test::TestRequest::get()
            .uri("/img/logos/missing.png")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_region_icon_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("regions")).unwrap();
        std::fs::write(dir.path().join("regions").join("europe.png"), b"icon").unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/img/regions/europe.png")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(&actix_test::read_body(resp).await[..], b"icon");

        // Logos are not served from the region directory
        let req = actix_test::TestRequest::get()
            .uri("/img/regions/honda.png")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "region icon not found: honda.png");
    }

    #[actix_web::test]
    async fn test_logo_file_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/img/logos/..%2Fsecret.db")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());
    }

    #[actix_web::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = actix_test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "UP");
        assert_eq!(body["wmi_factories"], 1);
        assert_eq!(body["factory_logos"], 1);
    }

    #[test]
    fn test_is_safe_file_name() {
        assert!(is_safe_file_name("ford.png"));
        assert!(is_safe_file_name("general_motors.svg"));
        assert!(!is_safe_file_name("../vin.db"));
        assert!(!is_safe_file_name("a/b.png"));
        assert!(!is_safe_file_name(".hidden"));
        assert!(!is_safe_file_name(""));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a.PNG"), "image/png");
        assert_eq!(content_type("a.jpeg"), "image/jpeg");
        assert_eq!(content_type("a.svg"), "image/svg+xml");
        assert_eq!(content_type("a.bin"), "application/octet-stream");
    }
}
