use http::StatusCode;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::ErrorHandler;

type Predicate = Box<dyn Fn(&Error) -> bool + Send + Sync>;

/// The error handlers of an application in registration order.
///
pub(crate) struct ErrorHandlers<S> {
    entries: Vec<(ErrorKey, Arc<dyn ErrorHandler<S>>)>,
}

enum ErrorKey {
    Status(StatusCode),
    Matches(Predicate),
}

impl<S> ErrorHandlers<S> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers `handler` for HTTP errors with `status`. A handler that was
    /// registered for the same status before is replaced in place.
    ///
    pub(crate) fn insert_status(&mut self, status: StatusCode, handler: Arc<dyn ErrorHandler<S>>) {
        let existing = self
            .entries
            .iter_mut()
            .find(|(key, _)| matches!(key, ErrorKey::Status(code) if *code == status));

        match existing {
            Some(entry) => entry.1 = handler,
            None => self.entries.push((ErrorKey::Status(status), handler)),
        }
    }

    pub(crate) fn push_predicate(&mut self, predicate: Predicate, handler: Arc<dyn ErrorHandler<S>>) {
        self.entries.push((ErrorKey::Matches(predicate), handler));
    }

    pub(crate) fn for_status(&self, status: StatusCode) -> Option<&Arc<dyn ErrorHandler<S>>> {
        self.entries.iter().find_map(|(key, handler)| match key {
            ErrorKey::Status(code) if *code == status => Some(handler),
            _ => None,
        })
    }

    /// Returns the handler of the first predicate that matches `error`.
    ///
    pub(crate) fn for_error(&self, error: &Error) -> Option<&Arc<dyn ErrorHandler<S>>> {
        self.entries.iter().find_map(|(key, handler)| match key {
            ErrorKey::Matches(predicate) if predicate(error) => Some(handler),
            _ => None,
        })
    }
}
