// Creditwatch - prediction monitoring and alerting engine
// Library exports

pub mod alert;
pub mod config;
pub mod engine;
pub mod errors;
pub mod event;
pub mod ingest;
pub mod server;
pub mod snapshot;
pub mod window;
