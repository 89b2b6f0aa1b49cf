// src/models.rs

pub mod appointment;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod clinical;
pub mod dashboard;
pub mod finance;
pub mod patient;
