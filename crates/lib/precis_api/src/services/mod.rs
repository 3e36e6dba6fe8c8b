pub mod auth;
pub mod summaries;
