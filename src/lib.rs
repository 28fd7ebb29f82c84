//! Wanderlist - a small travel planner
//!
//! Users register, log in, browse and search a fixed catalog of
//! destinations and keep a personal want-to-go list.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod views;
