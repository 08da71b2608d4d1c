pub mod chat;
pub mod comms;
pub mod pubmed;
pub mod store;
pub mod tools;
