//! Error system shared by the server and its tests
//!
//! - [`ErrorCode`]: numeric codes returned to API callers
//! - [`ErrorCategory`]: grouping by code range, used to decide what gets logged
//! - [`AppError`]: code + message + optional details
//! - [`ApiResponse`]: JSON body for errors
//! - [`AppResponse`]: `{success, data}` envelope for dashboard endpoints
//!
//! Code ranges: 0xxx general, 1xxx auth, 3xxx integration, 4xxx order,
//! 9xxx system.
//!
//! ```
//! use shared::error::{ApiResponse, AppError};
//!
//! let err = AppError::validation("api_key must not be empty").with_detail("field", "api_key");
//! let body = ApiResponse::from(&err);
//! assert_eq!(body.code, 2);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError, AppResponse};
