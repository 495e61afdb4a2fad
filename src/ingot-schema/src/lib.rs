pub mod dtype;
pub mod field;
pub mod prelude;
pub mod schema;
pub mod supertype;
pub mod time_unit;
