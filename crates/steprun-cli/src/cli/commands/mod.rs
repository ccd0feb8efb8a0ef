pub mod definitions;
pub mod dispatch;
pub mod formats;
pub(crate) mod run;

pub use dispatch::dispatch;
