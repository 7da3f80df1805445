//! Form handling and validation.
//!
//! A [`Schema`] is an ordered list of [`Widget`]s plus form-level processor
//! chains. For each request a [`Form`] binds the schema to the submitted
//! data and the defaults of the record being edited.
//!
//! ```
//! use flyer::form::{processor, Schema, Widget};
//! use flyer::request::FormData;
//! use serde_json::{json, Map};
//!
//! let schema = Schema::new()
//!     .widget(Widget::text("title").required())
//!     .widget(Widget::text("year").with_processor_out(processor::integer()));
//!
//! let submitted = FormData::parse("title=Dune&year=1965");
//! let form = schema.form().submitted(&submitted).finish().unwrap();
//! let result = form.process(json!(null), Map::new()).unwrap();
//!
//! assert_eq!(result["fielddata"], json!({ "title": "Dune", "year": 1965 }));
//! ```
//!

mod error;
mod form;
mod render;
mod schema;
mod widget;

pub mod processor;

pub use error::{FormError, ProcessError};
pub use form::{Form, FormBuilder};
pub use processor::{Processor, ProcessorContext};
pub use render::RenderContext;
pub use schema::Schema;
pub use widget::{Kind, Widget};
