pub mod config;
pub mod db;
pub mod error;
pub mod notification;
pub mod push;
pub mod task;
pub mod user;
