pub mod collection;
pub mod controller;
pub mod detail;
pub mod models;
pub mod notification;
pub mod query;
pub mod ui;
