pub mod backend;
pub mod diagnostic_provider;
pub mod document;
pub mod features;
pub mod models;
pub mod session;
