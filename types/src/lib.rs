pub mod config;
pub mod containers;
pub mod preset;
pub mod primitives;
