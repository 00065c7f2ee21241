pub mod config;
pub mod error;
pub mod query;
pub mod storage;
pub mod web;
