//! # Parlance Response
//!
//! Uniform JSON responses for web services.
//!
//! Every response carries a numeric [`Code`], a message translated from the
//! code's message id, an optional payload and [`Meta`]data. The
//! [`CodeRegistry`] maps codes to message ids and HTTP statuses, and the
//! [`ResponseBuilder`] renders them for a resolved request locale.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod codes;
pub mod envelope;
pub mod error;
pub mod version;

pub use codes::{
    Code, CodeCategory, CodeDefinition, CodeRegistry, CodeStats, BUILTIN_CODES,
    DEFAULT_HTTP_STATUS, UNKNOWN_ERROR_MESSAGE,
};
pub use envelope::{
    generate_request_id, response_headers, Meta, PageRequest, Pagination, Reply, Response,
    ResponseBuilder, CONTENT_LANGUAGE_HEADER, REQUEST_ID_HEADER, TRACE_ID_HEADER,
};
pub use error::{kind, ApiError, ApiErrorBody};
pub use version::{build_info, is_compatible, BuildInfo, VERSION};
