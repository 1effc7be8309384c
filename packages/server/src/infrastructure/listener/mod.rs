pub mod logging;

pub use logging::LoggingListener;
