//! Web search API client: request/response models, HTTP transport, and hit mapping.

pub(crate) mod client;
pub(crate) mod hits;
pub(crate) mod types;
