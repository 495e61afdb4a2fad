pub mod array;
pub mod cast;
pub mod datatypes;
pub mod lit;
pub mod normalize;
pub mod raw;
pub mod resolve;
pub mod series;

pub mod prelude;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
