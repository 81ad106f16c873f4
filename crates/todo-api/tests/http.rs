/// End-to-end tests: drive the full router against an in-memory database and
/// a throwaway upload directory.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::FixedOffset;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use todo_api::{AppContext, AppState, router};
use todo_db::Database;
use todo_media::MediaStore;
use todo_types::api::Envelope;
use todo_types::models::{NewCategory, NewTodo, Todo};

const BOUNDARY: &str = "todo-test-boundary";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

struct Harness {
    _tmp: TempDir,
    state: AppState,
}

impl Harness {
    async fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let media = MediaStore::new(tmp.path().join("static").join("uploads"))
            .await
            .unwrap();
        let db = Database::open_in_memory().unwrap();
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let state = AppContext::new(db, media, offset).unwrap();
        Self { _tmp: tmp, state }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router(self.state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn post(&self, uri: &str) -> (StatusCode, Envelope) {
        let req = Request::post(uri).body(Body::empty()).unwrap();
        let (status, body) = self.send(req).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn add(&self, parts: &[Part<'_>]) -> (StatusCode, Envelope) {
        let req = Request::post("/add")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart(parts)))
            .unwrap();
        let (status, body) = self.send(req).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn todos(&self) -> Vec<Todo> {
        self.state.db.list_todos().unwrap()
    }

    fn upload_files(&self) -> Vec<String> {
        std::fs::read_dir(self.state.media.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect()
    }

    fn seed(&self, content: &str, image_path: Option<String>) -> Todo {
        self.state
            .db
            .insert_todo(&NewTodo {
                content: content.into(),
                created_at: chrono::Utc::now().fixed_offset(),
                image_path,
                category_id: None,
            })
            .unwrap()
    }
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn add_plain_todo_via_urlencoded_form() {
    let h = Harness::new().await;
    let req = Request::post("/add")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("content=Buy+milk"))
        .unwrap();

    let (status, body) = h.send(req).await;
    let envelope: Envelope = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(envelope.success);

    let todos = h.todos();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].content, "Buy milk");
    assert!(!todos[0].completed);
    assert_eq!(todos[0].image_path, None);
    assert_eq!(todos[0].created_at.offset().local_minus_utc(), 8 * 3600);
}

#[tokio::test]
async fn add_without_content_is_a_server_error() {
    let h = Harness::new().await;
    let (status, envelope) = h.add(&[Part::Text("pasted_image", "")]).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!envelope.success);
    assert!(envelope.message.contains("content"));
    assert!(h.todos().is_empty());
}

#[tokio::test]
async fn add_with_uploaded_image_stores_file() {
    let h = Harness::new().await;
    let (status, envelope) = h
        .add(&[
            Part::Text("content", "Frame it"),
            Part::File("image", "holiday.PNG", PNG_MAGIC),
        ])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(envelope.success);

    let image_path = h.todos()[0].image_path.clone().unwrap();
    assert!(image_path.starts_with("uploads/"));
    assert!(image_path.ends_with("_holiday.PNG"));

    let files = h.upload_files();
    assert_eq!(files.len(), 1);
    assert_eq!(format!("uploads/{}", files[0]), image_path);
}

#[tokio::test]
async fn disallowed_upload_still_creates_todo_without_image() {
    let h = Harness::new().await;
    let (status, envelope) = h
        .add(&[
            Part::Text("content", "Read notes"),
            Part::File("image", "notes.txt", b"plain text"),
        ])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(envelope.success);
    assert_eq!(h.todos()[0].image_path, None);
    assert!(h.upload_files().is_empty());
}

#[tokio::test]
async fn empty_file_input_is_ignored() {
    let h = Harness::new().await;
    let (status, _) = h
        .add(&[Part::Text("content", "No file chosen"), Part::File("image", "", b"")])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.todos()[0].image_path, None);
    assert!(h.upload_files().is_empty());
}

#[tokio::test]
async fn pasted_image_wins_over_upload() {
    let h = Harness::new().await;
    let pasted = format!("data:image/png;base64,{}", STANDARD.encode(PNG_MAGIC));
    let (status, _) = h
        .add(&[
            Part::Text("content", "Both"),
            Part::Text("pasted_image", &pasted),
            Part::File("image", "other.jpg", b"jpeg bytes"),
        ])
        .await;
    assert_eq!(status, StatusCode::OK);

    let image_path = h.todos()[0].image_path.clone().unwrap();
    assert!(image_path.starts_with("uploads/pasted_"));

    let files = h.upload_files();
    assert_eq!(files.len(), 1);
    let stored = std::fs::read(h.state.media.dir().join(&files[0])).unwrap();
    assert_eq!(stored, PNG_MAGIC);
}

#[tokio::test]
async fn undecodable_paste_creates_todo_without_image() {
    let h = Harness::new().await;
    let (status, envelope) = h
        .add(&[
            Part::Text("content", "Broken paste"),
            Part::Text("pasted_image", "data:image/png;base64,%%%"),
            Part::File("image", "fallback.png", PNG_MAGIC),
        ])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(envelope.success);
    assert_eq!(h.todos()[0].image_path, None);
    assert!(h.upload_files().is_empty());
}

#[tokio::test]
async fn add_with_known_and_unknown_category() {
    let h = Harness::new().await;
    let category = h
        .state
        .db
        .insert_category(&NewCategory {
            name: "Errands".into(),
            description: None,
            created_at: chrono::Utc::now().fixed_offset(),
        })
        .unwrap();

    let id = category.id.to_string();
    let (status, _) = h
        .add(&[Part::Text("content", "Post office"), Part::Text("category_id", &id)])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.todos()[0].category_id, Some(category.id));

    let (status, envelope) = h
        .add(&[Part::Text("content", "Nowhere"), Part::Text("category_id", "999")])
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(envelope.message, "Category not found");
    assert_eq!(h.todos().len(), 1);
}

#[tokio::test]
async fn toggle_twice_restores_original_state() {
    let h = Harness::new().await;
    let id = h.seed("Walk dog", None).id;

    let (status, envelope) = h.post(&format!("/complete/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(envelope.success);
    assert!(h.todos()[0].completed);

    h.post(&format!("/complete/{id}")).await;
    assert!(!h.todos()[0].completed);
}

#[tokio::test]
async fn toggle_unknown_id_is_not_found() {
    let h = Harness::new().await;

    let (status, envelope) = h.post("/complete/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(envelope, Envelope::err("Task not found"));
    assert!(h.todos().is_empty());

    let (status, _) = h.post("/complete/not-a-number").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_record_and_image() {
    let h = Harness::new().await;
    let pasted = STANDARD.encode(PNG_MAGIC);
    h.add(&[Part::Text("content", "With image"), Part::Text("pasted_image", &pasted)])
        .await;
    let todo = h.todos().remove(0);
    assert_eq!(h.upload_files().len(), 1);

    let (status, envelope) = h.post(&format!("/delete/{}", todo.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(envelope.success);
    assert!(h.todos().is_empty());
    assert!(h.upload_files().is_empty());
}

#[tokio::test]
async fn delete_without_image_leaves_other_files() {
    let h = Harness::new().await;
    std::fs::write(h.state.media.dir().join("unrelated.png"), PNG_MAGIC).unwrap();
    let id = h.seed("Plain", None).id;

    let (status, _) = h.post(&format!("/delete/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.todos().is_empty());
    assert_eq!(h.upload_files(), ["unrelated.png"]);
}

#[tokio::test]
async fn delete_succeeds_when_image_already_gone() {
    let h = Harness::new().await;
    let id = h.seed("Drifted", Some("uploads/missing.png".into())).id;

    let (status, envelope) = h.post(&format!("/delete/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(envelope.success);
    assert!(h.todos().is_empty());
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let h = Harness::new().await;
    let (status, envelope) = h.post("/delete/7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!envelope.success);
}

#[tokio::test]
async fn index_lists_todos_and_serves_images() {
    let h = Harness::new().await;
    h.add(&[
        Part::Text("content", "Look at <this>"),
        Part::File("image", "cat.gif", b"GIF89a"),
    ])
    .await;
    let file = h.upload_files().remove(0);

    let (status, body) = h.send(Request::get("/").body(Body::empty()).unwrap()).await;
    let html = String::from_utf8(body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Look at &lt;this&gt;"));
    assert!(html.contains(&format!("/static/uploads/{file}")));

    let (status, body) = h
        .send(
            Request::get(format!("/static/uploads/{file}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"GIF89a");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let h = Harness::new().await;
    let body = format!("content={}", "a".repeat(todo_api::MAX_CONTENT_LENGTH + 1));
    let req = Request::post("/add")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();

    let (status, _) = h.send(req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.todos().is_empty());
}
