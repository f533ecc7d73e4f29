pub mod update;

pub use update::run_update;
