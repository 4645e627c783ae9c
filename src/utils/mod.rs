//! Utility modules

pub mod data_loader;

pub use data_loader::{read_csv_bytes, DataLoader, DataSaver};
