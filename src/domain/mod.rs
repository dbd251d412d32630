pub mod errors;
pub mod feedback;
pub mod models;
pub mod orientation;
pub mod ports;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod smoothing;
