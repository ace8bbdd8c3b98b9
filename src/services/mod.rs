// Service module exports

pub mod config;
pub mod controller;
pub mod grid;
pub mod notification;
pub mod persistence;
pub mod reminder;
pub mod store;
