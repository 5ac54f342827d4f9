pub mod analytics;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod services;
pub mod state;
pub mod web;
