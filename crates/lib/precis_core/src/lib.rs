//! # precis_core
//!
//! Core domain logic for Precis: authentication, job records, document
//! parsing, summarisation, and the worker-pool dispatcher. Shared by
//! `precis_api` and the server binary.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod jobs;
pub mod migrate;
pub mod models;
pub mod parse;
pub mod summarise;
