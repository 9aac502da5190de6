pub mod config;
pub mod magnify;
pub mod spectrum;
pub mod synth;
