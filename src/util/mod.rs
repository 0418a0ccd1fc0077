//! Utility functions shared by configuration and the fetcher.
//!
//! - **URL validation**: configured endpoints must be absolute HTTP(S) URLs
//! - **Link joining**: artifact links are `base` + `/` + filename

mod url_validator;

pub use url_validator::{join_url, validate_url, UrlValidationError};
