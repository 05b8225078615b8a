mod lookup;
mod worker;

pub use lookup::WorkerLookup;
pub use worker::{Worker, WorkerFactory};
