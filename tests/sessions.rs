mod common;

use flyer::http::StatusCode;
use flyer::{App, Context, FlashMessage, Request, Response, Result, Url, handler};
use serde_json::Map;

use common::{Browser, builder};

fn count(cx: &mut Context) -> Result {
    let next = cx.session().get_as::<u64>("count").unwrap_or(0) + 1;

    cx.session_mut().insert("count", next);
    Ok(Response::text(next.to_string()))
}

fn peek(cx: &mut Context) -> Result {
    let current = cx.session().get_as::<u64>("count").unwrap_or(0);
    Ok(Response::text(current.to_string()))
}

fn remember(cx: &mut Context) -> Result {
    cx.session_mut().insert("user", "ada");
    cx.session_mut().set_permanent(true);
    Ok(Response::text("remembered".to_owned()))
}

fn logout(cx: &mut Context) -> Result {
    cx.session_mut().clear();
    Ok(Response::text("bye".to_owned()))
}

fn save(cx: &mut Context) -> Result {
    cx.flash("Saved.");
    cx.flash_with(FlashMessage::new("Check your inbox.").with_category("info"));
    cx.redirect("/show")
}

fn show(cx: &mut Context) -> Result {
    let data = cx.render_data(&Map::new(), &Map::new(), Map::new())?;
    let messages = data["flash_messages"]
        .as_array()
        .map(|messages| {
            messages
                .iter()
                .filter_map(|message| message["message"].as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .unwrap_or_default();

    Ok(Response::text(messages))
}

fn app() -> App {
    let mut app = builder(());

    app.route(Url::new("/count", "count", handler::get(count)))
        .route(Url::new("/peek", "peek", handler::get(peek)))
        .route(Url::new("/remember", "remember", handler::get(remember)))
        .route(Url::new("/logout", "logout", handler::get(logout)))
        .route(Url::new("/save", "save", handler::get(save)))
        .route(Url::new("/show", "show", handler::get(show)));

    app.build().unwrap()
}

#[test]
fn sessions_persist_across_requests() {
    let app = app();
    let mut browser = Browser::default();

    assert_eq!(browser.get(&app, "/count").text_body(), "1");
    assert_eq!(browser.get(&app, "/count").text_body(), "2");
    assert_eq!(browser.get(&app, "/peek").text_body(), "2");
    assert_eq!(browser.get(&app, "/count").text_body(), "3");

    assert!(browser.cookie("s").is_some());
}

#[test]
fn sessions_without_data_are_never_written() {
    let app = app();
    let response = app.dispatch(Request::builder().uri("/peek")).unwrap();

    assert_eq!(response.text_body(), "0");
    assert_eq!(response.cookies().delta().count(), 0);
}

#[test]
fn sessions_with_data_are_signed_again() {
    let app = app();
    let mut browser = Browser::default();

    browser.get(&app, "/count");

    let response = browser.get(&app, "/peek");

    assert_eq!(response.text_body(), "1");
    assert!(response.cookies().delta().any(|cookie| cookie.name() == "s"));
}

#[test]
fn tampered_cookies_start_a_fresh_session() {
    let app = app();
    let mut browser = Browser::default();

    browser.get(&app, "/count");
    browser.get(&app, "/count");

    let value = browser.cookie("s").unwrap().to_owned();
    let tampered = format!("{}x", value);

    let response = app
        .dispatch(Request::builder().uri("/count").cookie("s", tampered))
        .unwrap();

    assert_eq!(response.text_body(), "1");

    let response = app
        .dispatch(Request::builder().uri("/count").cookie("s", value))
        .unwrap();

    assert_eq!(response.text_body(), "3");
}

#[test]
fn permanent_sessions_carry_an_expiry() {
    let app = app();
    let response = app.dispatch(Request::builder().uri("/remember")).unwrap();
    let cookie = response.cookies().delta().find(|cookie| cookie.name() == "s").unwrap();

    assert!(cookie.expires().is_some());
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
}

#[test]
fn emptied_sessions_remove_the_cookie() {
    let app = app();
    let mut browser = Browser::default();

    browser.get(&app, "/count");
    assert!(browser.cookie("s").is_some());

    browser.get(&app, "/logout");
    assert!(browser.cookie("s").is_none());

    assert_eq!(browser.get(&app, "/peek").text_body(), "0");
}

#[test]
fn flash_messages_are_shown_once() {
    let app = app();
    let mut browser = Browser::default();

    let response = browser.get(&app, "/save");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(browser.cookie("m").is_some());

    let response = browser.get(&app, "/show");

    assert_eq!(response.text_body(), "Saved. | Check your inbox.");
    assert!(browser.cookie("m").is_none());

    let response = browser.get(&app, "/show");

    assert_eq!(response.text_body(), "");
}

#[test]
fn unread_flash_messages_wait_for_a_render() {
    let app = app();
    let mut browser = Browser::default();

    browser.get(&app, "/save");

    let response = browser.get(&app, "/peek");

    assert!(response.cookies().delta().all(|cookie| cookie.name() != "m"));
    assert!(browser.cookie("m").is_some());

    assert_eq!(
        browser.get(&app, "/show").text_body(),
        "Saved. | Check your inbox."
    );
}

#[test]
fn flash_messages_queued_while_rendering_are_shown_immediately() {
    fn save_and_show(cx: &mut Context) -> Result {
        cx.flash("Right away.");
        show(cx)
    }

    let mut app = builder(());

    app.route(Url::new("/", "index", handler::get(save_and_show)));

    let app = app.build().unwrap();
    let mut browser = Browser::default();

    assert_eq!(browser.get(&app, "/").text_body(), "Right away.");
    assert!(browser.cookie("m").is_none());
}
