pub mod documents;
pub(crate) mod health;

pub use health::health_check;
