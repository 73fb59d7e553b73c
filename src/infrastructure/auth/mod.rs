//! Bearer token validation against the external user service.

pub mod http_token_validator;

pub use http_token_validator::HttpTokenValidator;
