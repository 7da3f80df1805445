use flyer::form::{Form, Schema, Widget, processor};
use flyer::http::StatusCode;
use flyer::{App, BoxError, Context, Error, Handler, Hooks, Response, Result, Server, Url};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::process::ExitCode;
use std::sync::{Mutex, MutexGuard};

/// The state shared by every request.
///
struct Guestbook {
    entries: Mutex<Vec<Entry>>,
    schema: Schema,
}

#[derive(Clone, Serialize)]
struct Entry {
    name: String,
    message: String,
}

struct Index;

impl Guestbook {
    fn new() -> Self {
        let schema = Schema::new()
            .widget(
                Widget::text("name")
                    .required()
                    .with_label("Your name")
                    .with_processor_out(processor::trim())
                    .with_processor_out(processor::length(None, Some(40))),
            )
            .widget(
                Widget::textarea("message")
                    .required()
                    .with_required_message("Leave a message for the next visitor.")
                    .with_label("Message")
                    .with_processor_out(processor::trim()),
            );

        Self {
            entries: Mutex::new(Vec::new()),
            schema,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, Vec<Entry>>> {
        self.entries
            .lock()
            .map_err(|_| Error::internal_server_error())
    }
}

impl Hooks for Guestbook {
    fn defaults() -> Vec<(&'static str, flyer::config::Value)> {
        vec![
            ("logger_name", "guestbook".into()),
            ("session_cookie_name", "guestbook".into()),
        ]
    }

    fn finalize_response(&self, mut response: Response) -> Response {
        if let Ok(value) = "nosniff".parse() {
            response
                .headers_mut()
                .insert("x-content-type-options", value);
        }

        response
    }
}

impl Handler<Guestbook> for Index {
    fn get(&self, cx: &mut Context<Guestbook>) -> Result {
        let form = cx.state().schema.form().finish()?;
        page(cx, &form, Map::new())
    }

    fn post(&self, cx: &mut Context<Guestbook>) -> Result {
        let request = cx.request();
        let form = cx.state().schema.form().request(request).finish()?;

        let fielddata = match form.process(Value::Null, Map::new()) {
            Ok(result) => result["fielddata"].clone(),
            Err(errors) => {
                let messages = errors
                    .messages()
                    .into_iter()
                    .map(|(name, message)| (name, Value::from(message)))
                    .collect();

                let mut response = page(cx, &form.with_errors(errors), messages)?;

                response.set_status(StatusCode::BAD_REQUEST);
                return Ok(response);
            }
        };

        let entry = Entry {
            name: fielddata["name"].as_str().unwrap_or_default().to_owned(),
            message: fielddata["message"].as_str().unwrap_or_default().to_owned(),
        };

        tracing::info!(name = %entry.name, "new guestbook entry");

        cx.state().entries()?.push(entry);

        let signed = cx.session().get_as::<u64>("signed").unwrap_or(0) + 1;

        cx.session_mut().insert("signed", signed);
        cx.flash("Thanks for signing the guestbook!");

        let location = cx.url_for("index", &[])?;
        cx.redirect(&location)
    }
}

fn page(cx: &mut Context<Guestbook>, form: &Form, errors: Map<String, Value>) -> Result {
    let mut fields = Vec::new();

    for widget in form.schema().widgets() {
        if let Some(field) = form.field(widget.name()) {
            let class = if field.error().is_some() { "error" } else { "" };
            let tag = field.tag(class, &[])?;

            fields.push(json!({ "label": widget.label(), "tag": tag }));
        }
    }

    let entries = cx.state().entries()?.clone();
    let mut extra = Map::new();

    extra.insert("entries".to_owned(), serde_json::to_value(entries)?);
    extra.insert("fields".to_owned(), Value::from(fields));
    extra.insert(
        "signed".to_owned(),
        Value::from(cx.session().get_as::<u64>("signed").unwrap_or(0)),
    );

    let data = cx.render_data(&Map::new(), &errors, extra)?;
    cx.render_with("index.html", data)
}

fn not_found(cx: &mut Context<Guestbook>) -> Result {
    let mut extra = Map::new();

    extra.insert("path".to_owned(), Value::from(cx.request().path()));

    let mut response = cx.render("not_found.html", extra)?;

    response.set_status(StatusCode::NOT_FOUND);
    Ok(response)
}

/// Renders the two pages of the guestbook. A real application would wrap a
/// template engine here.
///
fn render(template: &str, data: &Value) -> std::result::Result<String, Error> {
    let mut html = String::from("<!doctype html><html><body>");

    for flash in data["flash_messages"].as_array().into_iter().flatten() {
        html += &format!("<p class=\"flash\">{}</p>", text(&flash["message"]));
    }

    match template {
        "index.html" => {
            html += "<h1>Guestbook</h1><form method=\"post\">";

            for field in data["fields"].as_array().into_iter().flatten() {
                html += &format!(
                    "<label>{}</label>{}",
                    text(&field["label"]),
                    field["tag"].as_str().unwrap_or_default()
                );
            }

            for (name, error) in data["errors"].as_object().into_iter().flatten() {
                html += &format!("<p class=\"error\">{}: {}</p>", name, text(error));
            }

            html += "<button>Sign</button></form><ul>";

            for entry in data["entries"].as_array().into_iter().flatten() {
                html += &format!(
                    "<li><b>{}</b> {}</li>",
                    text(&entry["name"]),
                    text(&entry["message"])
                );
            }

            html += &format!("</ul><p>You signed {} time(s).</p>", data["signed"]);
        }
        "not_found.html" => {
            html += &format!("<h1>Nothing at {}</h1>", text(&data["path"]));
        }
        _ => return Err(Error::internal_server_error()),
    }

    html += "</body></html>";
    Ok(html)
}

fn text(value: &Value) -> String {
    value
        .as_str()
        .unwrap_or_default()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn app() -> Result<App<Guestbook>, BoxError> {
    let mut app = App::builder(Guestbook::new());

    app.route(Url::new("/", "index", Index))
        .renderer(render)
        .error_handler(StatusCode::NOT_FOUND, not_found)
        .config_env();

    Ok(app.build()?)
}

#[tokio::main]
async fn main() -> Result<ExitCode, BoxError> {
    flyer::init_tracing();

    Server::new(app()?).listen(("127.0.0.1", 8080)).await
}
