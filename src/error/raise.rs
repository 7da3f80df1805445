/// Return early from a handler with an HTTP error.
///
/// # Examples
///
/// Return an error that uses the canonical reason phrase of the provided
/// status code.
///
/// ```
/// use flyer::{Context, Response, Result};
///
/// fn show(cx: &mut Context) -> Result {
///     let Some(id) = cx.param("id") else {
///         flyer::raise!(404);
///     };
///
///     Ok(Response::text(format!("item {}", id)))
/// }
/// ```
///
/// ### Attach a message or a source.
///
/// The message is rendered in the body of the error page. A source error is
/// kept for logging and never shown to the client.
///
/// ```
/// # use flyer::raise;
/// fn parse(input: &str) -> flyer::Result<u32> {
///     if input.is_empty() {
///         raise!(400, message = "Expected a number.");
///     }
///
///     input.parse().or_else(|error| raise!(400, error))
/// }
/// ```
///
#[macro_export]
macro_rules! raise {
    (@ctor $status:expr, message = $message:expr $(,)?) => {
        return Err($crate::Error::new($status, $message))
    };
    (@ctor $status:expr, boxed = $source:expr $(,)?) => {
        return Err($crate::Error::with_status($status, $source))
    };
    (@ctor $status:expr, $source:expr $(,)?) => {
        return Err($crate::Error::with_status($status, Box::new($source)))
    };
    (@ctor $status:expr) => {
        return Err($crate::Error::status($status))
    };

    (400 $($args:tt)*) => { $crate::raise!(BAD_REQUEST $($args)*) };
    (401 $($args:tt)*) => { $crate::raise!(UNAUTHORIZED $($args)*) };
    (403 $($args:tt)*) => { $crate::raise!(FORBIDDEN $($args)*) };
    (404 $($args:tt)*) => { $crate::raise!(NOT_FOUND $($args)*) };
    (405 $($args:tt)*) => { $crate::raise!(METHOD_NOT_ALLOWED $($args)*) };
    (409 $($args:tt)*) => { $crate::raise!(CONFLICT $($args)*) };
    (410 $($args:tt)*) => { $crate::raise!(GONE $($args)*) };
    (413 $($args:tt)*) => { $crate::raise!(PAYLOAD_TOO_LARGE $($args)*) };
    (422 $($args:tt)*) => { $crate::raise!(UNPROCESSABLE_ENTITY $($args)*) };
    (429 $($args:tt)*) => { $crate::raise!(TOO_MANY_REQUESTS $($args)*) };
    (500 $($args:tt)*) => { $crate::raise!(INTERNAL_SERVER_ERROR $($args)*) };
    (501 $($args:tt)*) => { $crate::raise!(NOT_IMPLEMENTED $($args)*) };
    (503 $($args:tt)*) => { $crate::raise!(SERVICE_UNAVAILABLE $($args)*) };

    ($status:ident $($args:tt)*) => {
        $crate::raise!(@ctor $crate::error::Status::$status $($args)*)
    };

    ($code:literal $($args:tt)*) => {{
        const CODE: u16 = $code;
        const _: () = assert!(
            CODE >= 400 && CODE <= 599,
            "Status code must be in 400..=599 for errors.",
        );

        let Ok(status) = $crate::error::Status::from_u16(CODE) else {
            unreachable!()
        };

        $crate::raise!(@ctor status $($args)*)
    }};
}
