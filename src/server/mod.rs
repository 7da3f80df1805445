//! Serve an [App](crate::App) over HTTP/1.1.
//!
//! The dispatch core is synchronous. The server reads each request body into
//! memory, calls [`App::call`](crate::App::call) on tokio's blocking pool,
//! and writes the response.
//!

mod accept;
mod server;
mod shutdown;

pub use server::Server;
