//! Integration tests for scms-api endpoints
//!
//! Each test builds the router over a fresh database in a temporary root
//! folder and drives it with `oneshot`.

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use scms_api::uploads::UploadStore;
use scms_api::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "scms-test-boundary";

struct TestApp {
    app: Router,
    pool: SqlitePool,
    uploads_dir: PathBuf,
    _root: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_body_limit(10 * 1024 * 1024).await
    }

    async fn with_body_limit(max_body_bytes: usize) -> Self {
        let root = tempfile::tempdir().unwrap();
        let pool = scms_common::db::init_database(&root.path().join("scms.db"))
            .await
            .unwrap();
        let uploads_dir = root.path().join("uploads");
        let uploads = UploadStore::new(uploads_dir.clone());
        let app = build_router(AppState::new(pool.clone(), uploads, max_body_bytes));
        Self {
            app,
            pool,
            uploads_dir,
            _root: root,
        }
    }

    /// Names of the files currently in the uploads folder
    fn stored_uploads(&self) -> Vec<String> {
        match std::fs::read_dir(&self.uploads_dir) {
            Ok(entries) => entries
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn multipart(&self, method: &str, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

/// Minimal multipart/form-data encoder
#[derive(Default)]
struct Form {
    body: Vec<u8>,
}

impl Form {
    fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, name: &str, file_name: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "scms-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_build_info_endpoint() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/build_info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "scms-api");
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

// =============================================================================
// Singleton sections
// =============================================================================

#[tokio::test]
async fn test_section_listing_and_unknown_section() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/sections").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["about", "vmv", "footer", "hero"]);

    let (status, body) = app.get("/api/sections/sponsors").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_section_without_record_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/api/sections/about").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_first_write_creates_canonical_record() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/sections/about",
            json!({"badge": "Hero", "whoWeAre": {"badge": "Story"}}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["warnings"], json!([]));

    let (status, record) = app.get("/api/sections/about").await;
    assert_eq!(status, StatusCode::OK);

    let expected = json!({
        "badge": "Hero",
        "title": "",
        "description": "",
        "statistic": "",
        "mission": "",
        "vision": "",
        "values": [],
        "whoWeAre": {"badge": "Story", "title": "", "description": "", "image": ""},
        "isActive": true,
    });
    for (key, value) in expected.as_object().unwrap() {
        assert_eq!(&record[key], value, "field {}", key);
    }
    assert_eq!(record["id"], body["record"]["id"]);
}

#[tokio::test]
async fn test_second_write_merges_without_clobbering() {
    let app = TestApp::new().await;
    app.json(
        "POST",
        "/api/sections/about",
        json!({"badge": "Hero", "whoWeAre": {"badge": "Story"}}),
    )
    .await;

    let (status, body) = app
        .json("POST", "/api/sections/about", json!({"mission": "Our mission"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, record) = app.get("/api/sections/about").await;
    assert_eq!(record["badge"], "Hero");
    assert_eq!(record["whoWeAre"]["badge"], "Story");
    assert_eq!(record["mission"], "Our mission");
    assert_eq!(record["id"], body["record"]["id"]);

    let (_, records) = app.get("/api/sections/about/records").await;
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_list_is_reported_and_keeps_stored_value() {
    let app = TestApp::new().await;
    app.json(
        "POST",
        "/api/sections/vmv",
        json!({"values": [{"title": "Care", "description": "We care"}]}),
    )
    .await;

    let (status, body) = app
        .json("POST", "/api/sections/vmv", json!({"values": "{bad json"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["record"]["values"],
        json!([{"title": "Care", "description": "We care"}])
    );
}

#[tokio::test]
async fn test_multipart_flat_keys_and_file_part() {
    let app = TestApp::new().await;
    app.json(
        "POST",
        "/api/sections/about",
        json!({"badge": "Hero", "whoWeAre": {"badge": "Story", "image": "/img/old.png"}}),
    )
    .await;

    let form = Form::default()
        .text("whoWeAreTitle", "Who we are")
        .text("values", r#"[{"title":"Curiosity","description":"Ask why"}]"#)
        .file("whoWeAreImage", "team photo.png", b"PNGDATA")
        .file("file", "", b"")
        .finish();
    let (status, body) = app.multipart("POST", "/api/sections/about", form).await;
    assert_eq!(status, StatusCode::OK);

    let record = &body["record"];
    assert_eq!(record["badge"], "Hero");
    assert_eq!(record["whoWeAre"]["badge"], "Story");
    assert_eq!(record["whoWeAre"]["title"], "Who we are");
    assert_eq!(record["values"][0]["title"], "Curiosity");

    let image = record["whoWeAre"]["image"].as_str().unwrap().to_string();
    assert!(image.starts_with("/uploads/"), "{}", image);
    assert!(image.ends_with("-team-photo.png"), "{}", image);

    let response = app
        .app
        .clone()
        .oneshot(Request::get(image.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"PNGDATA");

    let stored = app.stored_uploads();
    assert_eq!(stored.len(), 1);
    assert_eq!(image, format!("/uploads/{}", stored[0]));
}

#[tokio::test]
async fn test_hero_image_upload_alias() {
    let app = TestApp::new().await;
    let form = Form::default()
        .text("title", "Build the future")
        .text("image", "https://cdn.example/hero.jpg")
        .file("heroImage", "hero.jpg", b"JPEG")
        .finish();

    let (status, body) = app.multipart("POST", "/api/sections/hero", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["record"]["image"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/"));
    assert_eq!(
        body["record"]["heroData"],
        json!({"badge": "", "title": "", "description": "", "image": ""})
    );
}

#[tokio::test]
async fn test_footer_flag_from_multipart_text() {
    let app = TestApp::new().await;
    let form = Form::default()
        .text("organizationName", "STEM Kids")
        .text("showNewsletter", "on")
        .finish();

    let (status, body) = app.multipart("POST", "/api/sections/footer", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["showNewsletter"], json!(true));
    assert_eq!(body["record"]["programs"], json!([]));
}

#[tokio::test]
async fn test_non_object_json_body_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json("POST", "/api/sections/about", json!(["not", "an", "object"]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let request = Request::post("/api/sections/about")
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from("badge=Hero"))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = TestApp::with_body_limit(1024).await;
    let (status, body) = app
        .json(
            "POST",
            "/api/sections/about",
            json!({"description": "x".repeat(4096)}),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_records_by_id_activate_and_delete() {
    let app = TestApp::new().await;
    let (_, first) = app
        .json("POST", "/api/sections/hero", json!({"title": "First"}))
        .await;
    let first_id = first["record"]["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .json(
            "PUT",
            &format!("/api/sections/hero/records/{}", first_id),
            json!({"subtitle": "Sub"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["record"]["title"], "First");
    assert_eq!(updated["record"]["subtitle"], "Sub");

    // A second record, created directly and inactive
    let second_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO section_records (guid, section, is_active, data, created_at, updated_at) VALUES (?, 'hero', 0, ?, ?, ?)",
    )
    .bind(&second_id)
    .bind(json!({"title": "Second"}).to_string())
    .bind(&now)
    .bind(&now)
    .execute(&app.pool)
    .await
    .unwrap();

    let (status, activated) = app
        .json(
            "POST",
            &format!("/api/sections/hero/records/{}/activate", second_id),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["isActive"], true);

    let (_, current) = app.get("/api/sections/hero").await;
    assert_eq!(current["title"], "Second");

    let (_, records) = app.get("/api/sections/hero/records").await;
    let active: Vec<&Value> = records
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["isActive"] == true)
        .collect();
    assert_eq!(active.len(), 1);

    let (status, _) = app
        .delete(&format!("/api/sections/hero/records/{}", first_id))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .delete(&format!("/api/sections/hero/records/{}", first_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete("/api/sections/hero/records/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_drifted_record_reads_back_canonical() {
    let app = TestApp::new().await;
    let now = chrono::Utc::now().to_rfc3339();
    let drifted = json!({
        "badge": "Hero",
        "whoWeAre": json!({"badge": "Story", "title": "Us"}).to_string(),
        "values": json!([{"title": "Care", "description": "We care"}]).to_string(),
    });
    sqlx::query(
        "INSERT INTO section_records (guid, section, is_active, data, created_at, updated_at) VALUES (?, 'about', 1, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(drifted.to_string())
    .bind(&now)
    .bind(&now)
    .execute(&app.pool)
    .await
    .unwrap();

    let (status, record) = app.get("/api/sections/about").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        record["whoWeAre"],
        json!({"badge": "Story", "title": "Us", "description": "", "image": ""})
    );
    assert_eq!(
        record["values"],
        json!([{"title": "Care", "description": "We care"}])
    );

    // A write over the drifted record stores it canonically
    app.json("POST", "/api/sections/about", json!({"title": "About"}))
        .await;
    let stored: String = sqlx::query_scalar("SELECT data FROM section_records WHERE section = 'about'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let stored: Value = serde_json::from_str(&stored).unwrap();
    assert!(stored["whoWeAre"].is_object());
    assert!(stored["values"].is_array());
}

// =============================================================================
// Collections
// =============================================================================

#[tokio::test]
async fn test_collection_crud_round_trip() {
    let app = TestApp::new().await;

    let (status, created) = app
        .json(
            "POST",
            "/api/collections/testimonials",
            json!({"quote": "My kid loves robotics", "author": "Sam", "rating": 5}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["isActive"], true);
    assert_eq!(created["sortOrder"], 0);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = app
        .get(&format!("/api/collections/testimonials/items/{}", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["quote"], "My kid loves robotics");

    let (status, updated) = app
        .json(
            "PUT",
            &format!("/api/collections/testimonials/items/{}", id),
            json!({"role": "Parent", "isActive": false}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "Parent");
    assert_eq!(updated["author"], "Sam");

    let (_, all) = app.get("/api/collections/testimonials").await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    let (_, active) = app.get("/api/collections/testimonials?active=true").await;
    assert!(active.as_array().unwrap().is_empty());

    let (status, _) = app
        .delete(&format!("/api/collections/testimonials/items/{}", id))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .get(&format!("/api/collections/testimonials/items/{}", id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collection_validation_and_unknown_collection() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json("POST", "/api/collections/staff", json!({"position": "Director"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("name"));

    let (status, _) = app
        .json("POST", "/api/collections/sponsors", json!({"name": "Acme"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "PUT",
            &format!("/api/collections/staff/items/{}", uuid::Uuid::new_v4()),
            json!({"name": "Nobody"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collection_multipart_image_and_reorder() {
    let app = TestApp::new().await;

    let form = Form::default()
        .text("name", "Grace")
        .text("isActive", "true")
        .file("image", "grace.jpg", b"JPEG")
        .finish();
    let (status, grace) = app.multipart("POST", "/api/collections/staff", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(grace["image"].as_str().unwrap().starts_with("/uploads/"));

    let (_, ada) = app
        .json("POST", "/api/collections/staff", json!({"name": "Ada"}))
        .await;
    assert_eq!(ada["sortOrder"], 1);

    let (status, ordered) = app
        .json(
            "PUT",
            "/api/collections/staff/order",
            json!({"ids": [ada["id"], grace["id"]]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = ordered
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ada", "Grace"]);

    let (status, _) = app
        .json(
            "PUT",
            "/api/collections/staff/order",
            json!({"ids": [uuid::Uuid::new_v4()]}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collection_list_survives_unreadable_item() {
    let app = TestApp::new().await;
    let (_, ada) = app
        .json("POST", "/api/collections/staff", json!({"name": "Ada"}))
        .await;
    let (_, grace) = app
        .json("POST", "/api/collections/staff", json!({"name": "Grace"}))
        .await;

    sqlx::query("UPDATE collection_items SET data = '\"oops\"' WHERE guid = ?")
        .bind(grace["id"].as_str().unwrap())
        .execute(&app.pool)
        .await
        .unwrap();

    let (status, items) = app.get("/api/collections/staff").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = items.as_array().unwrap().iter().map(|i| &i["id"]).collect();
    assert_eq!(ids, vec![&ada["id"]]);
}

// =============================================================================
// Uploads left behind by writes
// =============================================================================

#[tokio::test]
async fn test_rejected_multipart_writes_leave_no_files() {
    let app = TestApp::new().await;

    let form = Form::default()
        .text("title", "Nope")
        .file("image", "stray.png", b"PNG")
        .finish();
    let (status, _) = app.multipart("POST", "/api/sections/sponsors", form).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.stored_uploads().is_empty());

    let form = Form::default()
        .text("position", "Director")
        .file("image", "nameless.jpg", b"JPEG")
        .finish();
    let (status, _) = app.multipart("POST", "/api/collections/staff", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.stored_uploads().is_empty());

    let form = Form::default()
        .text("name", "Nobody")
        .file("image", "nobody.jpg", b"JPEG")
        .finish();
    let uri = format!("/api/collections/staff/items/{}", uuid::Uuid::new_v4());
    let (status, _) = app.multipart("PUT", &uri, form).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.stored_uploads().is_empty());
}

#[tokio::test]
async fn test_unused_file_parts_are_discarded() {
    let app = TestApp::new().await;

    // `image` is not an upload name of the about section
    let form = Form::default()
        .text("badge", "Our story")
        .file("image", "unused.png", b"PNG")
        .finish();
    let (status, body) = app.multipart("POST", "/api/sections/about", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["badge"], "Our story");
    assert!(app.stored_uploads().is_empty());

    let form = Form::default()
        .text("slug", "gallery")
        .text("title", "Gallery")
        .file("image", "cover.jpg", b"JPEG")
        .finish();
    let (status, _) = app.multipart("POST", "/api/pages", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(app.stored_uploads().is_empty());

    // Only the part the record points at is kept
    let form = Form::default()
        .text("name", "Grace")
        .file("image", "grace.jpg", b"JPEG")
        .file("file", "spare.jpg", b"JPEG")
        .finish();
    let (status, grace) = app.multipart("POST", "/api/collections/staff", form).await;
    assert_eq!(status, StatusCode::CREATED);
    let stored = app.stored_uploads();
    assert_eq!(stored.len(), 1);
    assert_eq!(grace["image"], format!("/uploads/{}", stored[0]));
}

// =============================================================================
// Dynamic pages
// =============================================================================

#[tokio::test]
async fn test_page_create_get_and_duplicate_slug() {
    let app = TestApp::new().await;
    let page = json!({
        "slug": "summer-camp",
        "title": "Summer Camp",
        "isPublished": true,
        "blocks": [
            {"type": "text", "heading": "Join us", "body": "Two weeks of science"},
            {"type": "cards", "cards": [{"title": "Robotics"}]}
        ]
    });

    let (status, created) = app.json("POST", "/api/pages", page.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["blocks"][1]["cards"][0]["description"], "");

    let (status, fetched) = app.get("/api/pages/summer-camp").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Summer Camp");
    assert_eq!(fetched["blocks"][0]["type"], "text");

    let (status, body) = app.json("POST", "/api/pages", page).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_page_rejects_unknown_block_type() {
    let app = TestApp::new().await;
    let (status, _) = app
        .json(
            "POST",
            "/api/pages",
            json!({"slug": "media", "title": "Media", "blocks": [{"type": "video"}]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/pages/media").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_page_update_list_and_delete() {
    let app = TestApp::new().await;
    app.json(
        "POST",
        "/api/pages",
        json!({"slug": "draft", "title": "Draft"}),
    )
    .await;

    let (_, published) = app.get("/api/pages?published=true").await;
    assert!(published.as_array().unwrap().is_empty());

    let form = Form::default()
        .text("isPublished", "true")
        .text("blocks", r#"[{"type":"stats","stats":[{"label":"Kids","value":"300"}]}]"#)
        .finish();
    let (status, updated) = app.multipart("PUT", "/api/pages/draft", form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Draft");
    assert_eq!(updated["blocks"][0]["stats"][0]["value"], "300");

    let (_, published) = app.get("/api/pages?published=true").await;
    assert_eq!(published.as_array().unwrap().len(), 1);

    let (status, _) = app.delete("/api/pages/draft").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete("/api/pages/draft").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Uploads
// =============================================================================

#[tokio::test]
async fn test_standalone_upload() {
    let app = TestApp::new().await;

    let form = Form::default()
        .text("note", "ignored")
        .file("logo", "logo.svg", b"<svg/>")
        .finish();
    let (status, body) = app.multipart("POST", "/api/uploads", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["files"][0]["field"], "logo");
    assert!(body["files"][0]["path"]
        .as_str()
        .unwrap()
        .ends_with("-logo.svg"));

    let empty = Form::default().text("note", "no files").finish();
    let (status, _) = app.multipart("POST", "/api/uploads", empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
