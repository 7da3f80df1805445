use bytes::Bytes;
use http::StatusCode;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED};
use httpdate::HttpDate;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use super::{Context, Handler};
use crate::error::{Error, Result};
use crate::response::Response;

const UTF_8_PREFERRED_MIME_TYPES: [&str; 6] = [
    "application/javascript",
    "text/html",
    "text/css",
    "text/plain",
    "text/csv",
    "text/tab-separated-values",
];

/// Serves the files in `static_folder`.
///
/// The application registers this handler under the endpoint `static` at
/// `{static_url_path}/{*filename}` unless an endpoint with that name exists.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticFiles;

struct StaticFile {
    data: Vec<u8>,
    mime_type: String,
    modified_at: Option<SystemTime>,
}

impl<S: 'static> Handler<S> for StaticFiles {
    fn get(&self, cx: &mut Context<'_, S>) -> Result {
        let settings = cx.settings();
        let filename = cx.param("filename").unwrap_or_default();

        let Some(path) = resolve_path(&settings.static_folder, filename) else {
            tracing::debug!(filename, "rejecting static file path");
            return Err(Error::not_found());
        };

        let file = match StaticFile::open(&path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => return Err(Error::not_found()),
            Err(error) => return Err(error.into()),
        };

        let mut response = Response::build()
            .header(CONTENT_TYPE, file.mime_type)
            .header(
                CACHE_CONTROL,
                format!("public, max-age={}", settings.static_cache_timeout),
            );

        if let Some(modified_at) = file.modified_at {
            if is_not_modified(cx, modified_at) {
                return response.status(StatusCode::NOT_MODIFIED).finish();
            }

            response = response.header(LAST_MODIFIED, HttpDate::from(modified_at).to_string());
        }

        response.body(Bytes::from(file.data)).finish()
    }
}

impl StaticFile {
    fn open(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;

        if !metadata.is_file() {
            return Err(ErrorKind::NotFound.into());
        }

        let mut mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        if UTF_8_PREFERRED_MIME_TYPES.contains(&mime_type.as_str()) {
            mime_type += "; charset=utf-8";
        }

        Ok(Self {
            data: fs::read(path)?,
            mime_type,
            modified_at: metadata.modified().ok(),
        })
    }
}

/// Joins `filename` to `root`. Returns `None` if `filename` is empty or has
/// a component that is not a plain name, such as `..`.
///
fn resolve_path(root: &Path, filename: &str) -> Option<PathBuf> {
    let filename = Path::new(filename);

    if filename.as_os_str().is_empty() || filename.to_string_lossy().contains('\\') {
        return None;
    }

    filename
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
        .then(|| root.join(filename))
}

fn is_not_modified<S>(cx: &Context<'_, S>, modified_at: SystemTime) -> bool {
    let since = cx
        .request()
        .header(IF_MODIFIED_SINCE.as_str())
        .and_then(|value| value.parse::<HttpDate>().ok());

    since.is_some_and(|since| HttpDate::from(modified_at) <= since)
}
