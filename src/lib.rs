pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod payment;
pub mod services;
pub mod state;
pub mod task;
pub mod validation;
