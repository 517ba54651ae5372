pub mod sample;

pub use sample::{load_signing_key, SampleData};
