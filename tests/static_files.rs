mod common;

use flyer::http::StatusCode;
use flyer::http::header::{CACHE_CONTROL, CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED};
use flyer::{App, Context, Request, Response, Url, handler};
use std::fs;
use tempfile::TempDir;

use common::builder;

fn app(folder: &TempDir) -> App {
    let mut app = builder(());

    app.set("static_folder", static_folder(folder));
    app.build().unwrap()
}

fn static_folder(folder: &TempDir) -> String {
    folder.path().join("static").to_string_lossy().into_owned()
}

fn folder() -> TempDir {
    let folder = tempfile::tempdir().unwrap();
    let root = folder.path();

    fs::create_dir_all(root.join("static/css")).unwrap();
    fs::write(root.join("static/css/site.css"), "body { margin: 0 }").unwrap();
    fs::write(root.join("static/logo.bin"), [0u8, 1, 2]).unwrap();
    fs::write(root.join("secret.txt"), "secret").unwrap();
    folder
}

#[test]
fn files_are_served_with_cache_headers() {
    let folder = folder();
    let app = app(&folder);
    let response = app
        .dispatch(Request::builder().uri("/static/css/site.css"))
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text_body(), "body { margin: 0 }");
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "text/css; charset=utf-8"
    );
    assert_eq!(
        response.headers().get(CACHE_CONTROL).unwrap(),
        "public, max-age=43200"
    );
    assert!(response.headers().contains_key(LAST_MODIFIED));

    let response = app.dispatch(Request::builder().uri("/static/logo.bin")).unwrap();

    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
}

#[test]
fn unchanged_files_are_not_sent_again() {
    let folder = folder();
    let app = app(&folder);
    let response = app
        .dispatch(Request::builder().uri("/static/css/site.css"))
        .unwrap();

    let last_modified = response.headers().get(LAST_MODIFIED).unwrap().to_str().unwrap();
    let response = app
        .dispatch(
            Request::builder()
                .uri("/static/css/site.css")
                .header(IF_MODIFIED_SINCE, last_modified),
        )
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(response.body().is_empty());
}

#[test]
fn paths_outside_the_folder_are_not_found() {
    let folder = folder();
    let app = app(&folder);

    for uri in [
        "/static/../secret.txt",
        "/static/css/../../secret.txt",
        "/static/%2e%2e/secret.txt",
        "/static/missing.css",
        "/static/css",
    ] {
        let response = app.dispatch(Request::builder().uri(uri)).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[test]
fn the_static_endpoint_can_be_replaced() {
    let folder = folder();
    let mut app = builder(());

    app.set("static_folder", static_folder(&folder)).route(Url::new(
        "/static/{*filename}",
        "static",
        handler::get(|_: &mut Context| Ok(Response::text("custom".to_owned()))),
    ));

    let app = app.build().unwrap();
    let response = app
        .dispatch(Request::builder().uri("/static/css/site.css"))
        .unwrap();

    assert_eq!(response.text_body(), "custom");
    assert_eq!(
        app.url_for("static", &[("filename", "css/site.css")]).unwrap(),
        "/static/css/site.css"
    );
}

#[test]
fn static_url_paths_gain_a_leading_slash() {
    let folder = folder();
    let mut app = builder(());

    app.set("static_folder", static_folder(&folder))
        .set("static_url_path", "assets/");

    let app = app.build().unwrap();
    let response = app
        .dispatch(Request::builder().uri("/assets/css/site.css"))
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text_body(), "body { margin: 0 }");
    assert_eq!(
        app.url_for("static", &[("filename", "logo.bin")]).unwrap(),
        "/assets/logo.bin"
    );
}
