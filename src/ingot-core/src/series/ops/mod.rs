mod cast;
mod concat;
mod slice;

pub use cast::cast_series_to_supertype;
