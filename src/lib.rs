//! Lawbook: a server-rendered community for law students, lawyers and
//! recruiters, with Postgres-backed accounts and sessions.

pub mod app;
pub mod auth;
pub mod config;
pub mod dashboards;
pub mod db;
pub mod error;
pub mod moot;
pub mod pages;
pub mod sessions;
pub mod state;
pub mod users;
pub mod web;
