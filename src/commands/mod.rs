pub mod build;
pub mod detect;
