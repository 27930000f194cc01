pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;
pub mod task_edit;
pub mod ui;
pub mod web;
