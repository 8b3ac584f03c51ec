pub mod logging;
pub mod testing;

pub use logging::init_logging;
