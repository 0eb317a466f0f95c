pub mod auth;
pub mod parking_request;
pub mod slot;
pub mod vehicle;
