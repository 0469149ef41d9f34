//! HTTP protocol layer module
//!
//! Protocol helpers shared by the API and static file handlers, decoupled from routing.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, RangeParseResult};
pub use response::{
    build_301_response, build_304_response, build_404_response, build_413_response,
    build_416_response, build_json_response, build_options_response, HttpResponse,
};
