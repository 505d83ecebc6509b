pub mod types;
pub mod errors;
pub mod authority;
pub mod middleware;
pub mod clients;

pub use types::*;
pub use errors::{AppError, ErrorCode, ErrorKind, AppResult};
