//! Workers bundled with the runtime, registered in the catalog under their
//! `IMPORT_PATH`.

mod cache;
mod log;
mod token;

pub use cache::MemoryCache;
pub use log::{ConsoleLog, LogLevel};
pub use token::SharedSecretToken;
