mod tabula;

pub use tabula::{ApiErrorBody, ApiErrorObject, TabulaError};
