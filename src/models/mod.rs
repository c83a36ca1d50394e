pub mod command;
pub mod request;

pub use command::CommandDescriptor;
pub use request::{BuildRequest, BuildRequestBuilder, OutputSink, Verbosity};
