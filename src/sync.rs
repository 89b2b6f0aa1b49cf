// src/sync.rs

// Três camadas por tela: cache da coleção remota, visões derivadas e
// reconciliação das mutações.

pub mod derive;
pub mod mutation;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use mutation::{FormDialog, Mutations, ReconcileMode, SubmitOutcome};
pub use store::{CollectionStore, LoadOutcome};
