//! HTTP endpoint tests for the posesión efectiva server
//!
//! Exercises the full router against a synthetic four-page template
//! and a temporary drafts directory.

mod http_endpoint_tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        http::StatusCode,
        routing::{get, post},
        Router,
    };
    use axum_test::TestServer;
    use lopdf::{Dictionary, Document, Object, Stream};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    use posesion_core::LayoutRegistry;

    use crate::api::{
        handle_generate_pdf, handle_health, handle_list_drafts, handle_load_draft,
        handle_save_draft,
    };
    use crate::AppState;

    /// Minimal in-memory stand-in for the real form template,
    /// letter-portrait with a 90 degree rotation.
    fn test_template(num_pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let catalog_id = doc.new_object_id();

        let mut kids = Vec::new();
        for page_num in 0..num_pages {
            let content_id = doc.new_object_id();
            let content = format!("BT /F1 10 Tf 50 700 Td (Base-{}) Tj ET", page_num + 1);
            doc.objects.insert(
                content_id,
                Object::Stream(Stream::new(Dictionary::new(), content.into_bytes())),
            );

            let page_id = doc.new_object_id();
            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("Contents", Object::Reference(content_id));
            page.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            );
            page.set("Rotate", Object::Integer(90));
            doc.objects.insert(page_id, Object::Dictionary(page));
            kids.push(Object::Reference(page_id));
        }

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(num_pages as i64));
        pages.set("Kids", Object::Array(kids));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        doc.objects.insert(catalog_id, Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    struct TestContext {
        server: TestServer,
        template_path: PathBuf,
        drafts_dir: PathBuf,
        _dir: TempDir,
    }

    /// Create a test server with the full router over temporary
    /// template and drafts paths.
    fn create_test_server() -> TestContext {
        let dir = TempDir::new().unwrap();
        let template_path = dir.path().join("formulario_2_1.pdf");
        std::fs::write(&template_path, test_template(4)).unwrap();
        let drafts_dir = dir.path().join("borradores");
        std::fs::create_dir_all(&drafts_dir).unwrap();

        let state = AppState {
            template_path: template_path.clone(),
            drafts_dir: drafts_dir.clone(),
            registry: Arc::new(LayoutRegistry::builtin().clone()),
        };

        let app = Router::new()
            .route("/health", get(handle_health))
            .route("/api/generar-pdf", post(handle_generate_pdf))
            .route("/api/guardar-borrador", post(handle_save_draft))
            .route("/api/borradores", get(handle_list_drafts))
            .route("/api/cargar-borrador/:archivo", get(handle_load_draft))
            .with_state(state);

        TestContext {
            server: TestServer::new(app).unwrap(),
            template_path,
            drafts_dir,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn health_returns_200() {
        let ctx = create_test_server();
        let response = ctx.server.get("/health").await;
        response.assert_status_ok();

        let json = response.json::<serde_json::Value>();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "posesion-server");
    }

    #[tokio::test]
    async fn generate_returns_pdf_attachment() {
        let ctx = create_test_server();

        let response = ctx
            .server
            .post("/api/generar-pdf")
            .json(&json!({
                "oficina": "Santiago",
                "causante": {
                    "rut": "9.876.543-5",
                    "nombres": "Pedro",
                    "primer_apellido": "Soto"
                },
                "herederos": [
                    {"rut": "12.345.678-9", "nombres": "Juana", "calidad": "Hija"}
                ]
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/pdf");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=posesion_efectiva_completada.pdf"
        );

        let body = response.as_bytes();
        assert!(body.starts_with(b"%PDF"));
        let doc = Document::load_mem(body).unwrap();
        assert_eq!(doc.get_pages().len(), 4);
    }

    #[tokio::test]
    async fn generate_fails_cleanly_without_template() {
        let ctx = create_test_server();
        std::fs::remove_file(&ctx.template_path).unwrap();

        let response = ctx.server.post("/api/generar-pdf").json(&json!({})).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let json = response.json::<serde_json::Value>();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "TEMPLATE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn generate_rejects_malformed_body() {
        let ctx = create_test_server();

        let response = ctx
            .server
            .post("/api/generar-pdf")
            .json(&json!({"herederos": "not a list"}))
            .await;

        assert!(response.status_code().is_client_error());
    }

    #[tokio::test]
    async fn draft_save_list_load_roundtrip() {
        let ctx = create_test_server();
        let draft = json!({"oficina": "Temuco", "numero": "77"});

        let saved = ctx.server.post("/api/guardar-borrador").json(&draft).await;
        saved.assert_status_ok();
        let body = saved.json::<serde_json::Value>();
        assert_eq!(body["success"], true);

        let archivo = body["archivo"].as_str().unwrap().to_string();
        assert!(archivo.starts_with("borrador_"));
        assert!(archivo.ends_with(".json"));
        assert!(ctx.drafts_dir.join(&archivo).is_file());

        let listed = ctx.server.get("/api/borradores").await;
        listed.assert_status_ok();
        let listing = listed.json::<serde_json::Value>();
        assert_eq!(
            listing["borradores"][0]["archivo"].as_str(),
            Some(archivo.as_str())
        );

        let loaded = ctx
            .server
            .get(&format!("/api/cargar-borrador/{archivo}"))
            .await;
        loaded.assert_status_ok();
        assert_eq!(loaded.json::<serde_json::Value>(), draft);
    }

    #[tokio::test]
    async fn draft_listing_is_newest_first() {
        let ctx = create_test_server();

        let first = ctx
            .server
            .post("/api/guardar-borrador")
            .json(&json!({"numero": "1"}))
            .await
            .json::<serde_json::Value>();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = ctx
            .server
            .post("/api/guardar-borrador")
            .json(&json!({"numero": "2"}))
            .await
            .json::<serde_json::Value>();

        let listing = ctx.server.get("/api/borradores").await.json::<serde_json::Value>();
        let archivos: Vec<&str> = listing["borradores"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["archivo"].as_str().unwrap())
            .collect();
        assert_eq!(
            archivos,
            vec![
                second["archivo"].as_str().unwrap(),
                first["archivo"].as_str().unwrap()
            ]
        );
    }

    #[tokio::test]
    async fn load_rejects_path_traversal() {
        let ctx = create_test_server();

        let response = ctx
            .server
            .get("/api/cargar-borrador/borrador_..escape.json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let json = response.json::<serde_json::Value>();
        assert_eq!(json["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn load_missing_draft_is_404() {
        let ctx = create_test_server();

        let response = ctx
            .server
            .get("/api/cargar-borrador/borrador_inexistente.json")
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let json = response.json::<serde_json::Value>();
        assert_eq!(json["code"], "DRAFT_NOT_FOUND");
    }
}
