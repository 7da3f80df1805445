use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::response::Builder;
use http::{HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

use super::Response;
use super::{APPLICATION_JSON, TEXT_HTML, TEXT_PLAIN};
use crate::{Error, Result};

pub struct ResponseBuilder {
    body: Option<Result<Bytes>>,
    inner: Builder,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self {
            body: None,
            inner: Builder::new(),
        }
    }

    pub fn body(self, body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(Ok(body.into())),
            inner: self.inner,
        }
    }

    pub fn html(self, string: String) -> Self {
        self.content(string.into(), TEXT_HTML)
    }

    pub fn text(self, string: String) -> Self {
        self.content(string.into(), TEXT_PLAIN)
    }

    pub fn json<B: Serialize>(self, body: &B) -> Self {
        match serde_json::to_vec(body) {
            Ok(buf) => self.content(buf.into(), APPLICATION_JSON),
            Err(error) => Self {
                body: Some(Err(error.into())),
                inner: self.inner,
            },
        }
    }

    pub fn finish(self) -> Result<Response, Error> {
        let body = match self.body {
            Some(body) => body?,
            None => Bytes::new(),
        };

        Ok(self.inner.body(body)?.into())
    }

    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        Self {
            body: self.body,
            inner: self.inner.header(key, value),
        }
    }

    pub fn status<T>(self, status: T) -> Self
    where
        StatusCode: TryFrom<T>,
        <StatusCode as TryFrom<T>>::Error: Into<http::Error>,
    {
        Self {
            body: self.body,
            inner: self.inner.status(status),
        }
    }

    fn content(self, body: Bytes, content_type: HeaderValue) -> Self {
        let inner = self
            .inner
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, body.len());

        Self {
            body: Some(Ok(body)),
            inner,
        }
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
