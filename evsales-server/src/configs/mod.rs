pub mod settings;

pub use settings::{Dataset, Logger, Model, Server, Settings};
