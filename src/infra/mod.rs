pub mod kafka;
pub mod mongo_store;
pub mod provider;
