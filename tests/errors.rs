mod common;

use flyer::http::StatusCode;
use flyer::{Context, Error, Request, Response, Result, Url, handler, raise};

use common::{Browser, builder};

#[derive(Debug, thiserror::Error)]
#[error("the ledger is out of balance")]
struct LedgerError;

#[derive(Debug, thiserror::Error)]
#[error("storage is offline")]
struct StorageError;

fn forbidden(_: &mut Context) -> Result {
    raise!(403, message = "Members only.");
}

fn ledger(_: &mut Context) -> Result {
    Err(LedgerError.into())
}

fn storage(_: &mut Context) -> Result {
    Err(StorageError.into())
}

fn not_found(cx: &mut Context) -> Result {
    let status = cx.error().and_then(Error::status_code);
    let mut response = Response::text(format!(
        "custom {:?} for {}",
        status,
        cx.request().path()
    ));

    response.set_status(StatusCode::NOT_FOUND);
    Ok(response)
}

fn broken(_: &mut Context) -> Result {
    Err(std::io::Error::other("the error handler is broken").into())
}

fn routes(app: &mut flyer::Builder<()>) {
    app.route(Url::new("/forbidden", "forbidden", handler::get(forbidden)))
        .route(Url::new("/ledger", "ledger", handler::get(ledger)))
        .route(Url::new("/storage", "storage", handler::get(storage)));
}

#[test]
fn status_handlers_receive_the_original_error() {
    let mut app = builder(());

    routes(&mut app);
    app.error_handler(StatusCode::NOT_FOUND, not_found);

    let app = app.build().unwrap();
    let response = app.dispatch(Request::builder().uri("/missing")).unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text_body(), "custom Some(404) for /missing");
}

#[test]
fn unhandled_http_errors_render_themselves() {
    let mut app = builder(());

    routes(&mut app);

    let app = app.build().unwrap();
    let response = app.dispatch(Request::builder().uri("/missing")).unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text_body().contains("<h1>Not Found</h1>"));

    let response = app.dispatch(Request::builder().uri("/forbidden")).unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.text_body().contains("Members only."));
}

#[test]
fn registering_a_status_again_replaces_the_handler() {
    let mut app = builder(());

    routes(&mut app);
    app.error_handler(StatusCode::FORBIDDEN, |_: &mut Context| -> Result {
        Ok(Response::text("first".to_owned()))
    })
    .error_handler(StatusCode::FORBIDDEN, |_: &mut Context| -> Result {
        Ok(Response::text("second".to_owned()))
    });

    let app = app.build().unwrap();
    let response = app.dispatch(Request::builder().uri("/forbidden")).unwrap();

    assert_eq!(response.text_body(), "second");
}

#[test]
fn error_types_are_matched_in_registration_order() {
    let mut app = builder(());

    routes(&mut app);
    app.rescue_if(
        |error: &Error| error.status_code().is_none(),
        |cx: &mut Context| -> Result {
            let error = cx.error().map(ToString::to_string).unwrap_or_default();
            Ok(Response::text(format!("any: {}", error)))
        },
    )
    .rescue::<LedgerError, _>(|_: &mut Context| -> Result {
        Ok(Response::text("ledger".to_owned()))
    });

    let app = app.build().unwrap();

    let response = app.dispatch(Request::builder().uri("/ledger")).unwrap();
    assert_eq!(response.text_body(), "any: the ledger is out of balance");

    let mut app = builder(());

    routes(&mut app);
    app.rescue::<LedgerError, _>(|_: &mut Context| -> Result {
        Ok(Response::text("ledger".to_owned()))
    });

    let app = app.build().unwrap();

    let response = app.dispatch(Request::builder().uri("/ledger")).unwrap();
    assert_eq!(response.text_body(), "ledger");

    let response = app.dispatch(Request::builder().uri("/storage")).unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn unhandled_errors_use_the_500_handler() {
    let mut app = builder(());

    routes(&mut app);
    app.error_handler(StatusCode::INTERNAL_SERVER_ERROR, |cx: &mut Context| -> Result {
        let error = cx.error().map(ToString::to_string).unwrap_or_default();
        let mut response = Response::text(format!("sorry: {}", error));

        response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        Ok(response)
    });

    let app = app.build().unwrap();
    let response = app.dispatch(Request::builder().uri("/storage")).unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text_body(), "sorry: storage is offline");
}

#[test]
fn errors_propagate_in_testing_mode() {
    let mut app = builder(());

    routes(&mut app);
    app.set("testing", true);

    let app = app.build().unwrap();
    let error = app.dispatch(Request::builder().uri("/storage")).unwrap_err();

    assert!(error.is::<StorageError>());

    let mut app = builder(());

    routes(&mut app);
    app.set("testing", true).set("propagate_exceptions", false);

    let app = app.build().unwrap();
    let response = app.dispatch(Request::builder().uri("/storage")).unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text_body().contains("storage is offline"));
}

#[test]
fn failing_error_handlers_become_a_generic_500() {
    let mut app = builder(());

    routes(&mut app);
    app.set("testing", true)
        .error_handler(StatusCode::NOT_FOUND, broken)
        .rescue::<StorageError, _>(broken);

    let app = app.build().unwrap();

    let response = app.dispatch(Request::builder().uri("/missing")).unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text_body().contains("broken"));

    let response = app.dispatch(Request::builder().uri("/storage")).unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn error_handlers_do_not_reopen_the_session() {
    fn remember(cx: &mut Context) -> Result {
        cx.session_mut().insert("user", "ada");
        cx.flash("Signed in.");
        Ok(Response::text("ok".to_owned()))
    }

    fn lost(cx: &mut Context) -> Result {
        let flashes = cx.flash_messages().len();
        let session = cx.session();
        let mut response = Response::text(format!(
            "null={} len={} flashes={}",
            session.is_null(),
            session.len(),
            flashes
        ));

        response.set_status(StatusCode::NOT_FOUND);
        Ok(response)
    }

    let mut app = builder(());

    app.route(Url::new("/remember", "remember", handler::get(remember)))
        .error_handler(StatusCode::NOT_FOUND, lost);

    let app = app.build().unwrap();
    let mut browser = Browser::default();

    browser.get(&app, "/remember");
    assert!(browser.cookie("s").is_some());
    assert!(browser.cookie("m").is_some());

    let response = browser.get(&app, "/missing");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text_body(), "null=true len=0 flashes=0");
    assert_eq!(response.cookies().delta().count(), 0);
    assert!(browser.cookie("s").is_some());
    assert!(browser.cookie("m").is_some());
}
