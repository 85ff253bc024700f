extern crate diesel;

pub mod auth;
pub mod cache;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod logger;
pub mod models;
pub mod services;
pub mod upload;
pub mod web;
