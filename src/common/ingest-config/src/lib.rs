use serde::{Deserialize, Serialize};

/// Environment variable overriding [`IngestConfig::error_sample_size`].
pub const ERROR_SAMPLE_SIZE_ENV_VAR: &str = "INGOT_ERROR_SAMPLE_SIZE";
/// Environment variable overriding [`IngestConfig::parallel_chunk_size`].
pub const PARALLEL_CHUNK_SIZE_ENV_VAR: &str = "INGOT_PARALLEL_CHUNK_SIZE";
/// Environment variable overriding [`IngestConfig::infer_schema_length`]. `0` means "scan all rows".
pub const INFER_SCHEMA_LENGTH_ENV_VAR: &str = "INGOT_INFER_SCHEMA_LENGTH";

/// Configuration threaded through construction and casting.
///
/// Every knob that changes the *result* of inference or casting (`strict`, `infer_schema_length`)
/// is set explicitly by the caller. [`IngestConfig::from_env`] only overrides knobs that change
/// how errors are reported or how work is split up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Abort on the first irreconcilable type or inexact conversion instead of producing nulls.
    pub strict: bool,
    /// How many leading rows name the columns of record input and, when not strict, inform the
    /// dtype of row-oriented or record input. Strict construction infers dtypes over all rows.
    /// `None` scans all.
    pub infer_schema_length: Option<usize>,
    /// Upper bound on the offending values listed in a conversion error.
    pub error_sample_size: usize,
    /// Inputs longer than this are normalized and converted chunk-parallel.
    pub parallel_chunk_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            strict: true,
            infer_schema_length: Some(100),
            error_sample_size: 10,
            parallel_chunk_size: 64 * 1024,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn non_strict() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_infer_schema_length(mut self, infer_schema_length: Option<usize>) -> Self {
        self.infer_schema_length = infer_schema_length;
        self
    }

    #[must_use]
    pub fn with_error_sample_size(mut self, error_sample_size: usize) -> Self {
        self.error_sample_size = error_sample_size;
        self
    }

    #[must_use]
    pub fn with_parallel_chunk_size(mut self, parallel_chunk_size: usize) -> Self {
        self.parallel_chunk_size = parallel_chunk_size.max(1);
        self
    }

    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(val) = parse_env_usize(ERROR_SAMPLE_SIZE_ENV_VAR) {
            cfg.error_sample_size = val;
        }
        if let Some(val) = parse_env_usize(PARALLEL_CHUNK_SIZE_ENV_VAR) {
            cfg.parallel_chunk_size = val.max(1);
        }
        if let Some(val) = parse_env_usize(INFER_SCHEMA_LENGTH_ENV_VAR) {
            cfg.infer_schema_length = if val == 0 { None } else { Some(val) };
        }
        cfg
    }
}

fn parse_env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok()?.trim().parse().ok()
}
