pub use ingot_schema::{
    prelude::*,
    supertype::same_family,
    time_unit::{
        naive_datetime_to_timestamp, naive_local_to_timestamp, parse_timezone,
        timestamp_to_local, timestamp_to_naive_datetime, ParsedTimezone,
    },
};
