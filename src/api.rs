// src/api.rs

pub mod client;
pub mod resource;

pub use client::ApiClient;
pub use resource::{Entity, EntityId, RemoteCollection, RestCollection, Searchable};
