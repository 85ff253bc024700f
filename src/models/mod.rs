pub mod content;
pub mod image;
pub mod property;
pub mod settings;
