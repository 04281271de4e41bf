//! Core modules of the aquadesk record store.
//!
//! Scoring is pure and depends on nothing else here; everything else is the
//! adapter layer around the SQLite store.

pub mod auth;
pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod repository;
pub mod schemas;
pub mod scoring;
pub mod store;
pub mod time;
