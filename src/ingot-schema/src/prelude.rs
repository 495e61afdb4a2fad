pub use crate::{
    dtype::{DataType, DECIMAL_MAX_PRECISION},
    field::{Field, FieldRef},
    schema::{Schema, SchemaRef},
    supertype::{
        is_widening, lossy_supertype, strict_supertype, try_widest_common, widest_common,
        widest_common_all, TypeFamily,
    },
    time_unit::TimeUnit,
};
