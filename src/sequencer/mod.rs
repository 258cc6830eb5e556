pub mod pattern;
pub mod persistence;
pub mod share;
pub mod transport;
