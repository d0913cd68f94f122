//! Credit Application System
//!
//! HTTP service for registering customers and managing their credit
//! applications, backed by PostgreSQL or an in-memory store.
//!
//! # Modules
//!
//! - `config`: Configuration and credit business rules.
//! - `db`: Database connection pool and migrations.
//! - `db_storage`: PostgreSQL repositories.
//! - `docs`: OpenAPI document and Swagger UI.
//! - `errors`: Error handling types.
//! - `extract`: Request extractors with structured rejections.
//! - `handlers`: HTTP request handlers.
//! - `memory`: In-memory repositories.
//! - `models`: Entities, DTOs and views.
//! - `repository`: Repository traits.
//! - `routes`: Router assembly.
//! - `services`: Customer and credit business logic.

pub mod config;
pub mod db;
pub mod db_storage;
pub mod docs;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
