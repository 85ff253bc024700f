pub mod content;
pub mod properties;
pub mod seed;
pub mod settings;
