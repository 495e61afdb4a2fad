use common_error::ConversionError;

use crate::{datatypes::DataType, lit::Literal};

/// Collects per-value conversion failures of one column, keeping a bounded sample.
#[derive(Debug)]
pub struct FailureCollector {
    sample_size: usize,
    failed: usize,
    sample: Vec<(usize, String)>,
    first_reason: Option<String>,
    first_type: Option<DataType>,
}

impl FailureCollector {
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            failed: 0,
            sample: Vec::with_capacity(sample_size.min(16)),
            first_reason: None,
            first_type: None,
        }
    }

    pub fn record(&mut self, position: usize, value: &Literal, reason: String) {
        if self.first_reason.is_none() {
            self.first_reason = Some(reason);
            self.first_type = Some(value.get_type());
        }
        if self.sample.len() < self.sample_size {
            self.sample.push((position, value.to_string()));
        }
        self.failed += 1;
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.failed == 0
    }

    /// Dtype of the first failing value, for errors raised while building from mixed input.
    pub fn first_type(&self) -> Option<&DataType> {
        self.first_type.as_ref()
    }

    pub fn into_error(
        self,
        column: &str,
        from: &DataType,
        to: &DataType,
        total: usize,
    ) -> Option<ConversionError> {
        let reason = self.first_reason?;
        Some(ConversionError {
            column: column.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            failed: self.failed,
            total,
            sample: self.sample,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_bounded_but_count_is_not() {
        let mut failures = FailureCollector::new(2);
        for idx in 0..5 {
            failures.record(idx, &Literal::Int64(idx as i64 * 100), format!("bad {idx}"));
        }
        let err = failures
            .into_error("a", &DataType::Int64, &DataType::UInt8, 10)
            .unwrap();
        assert_eq!(err.failed, 5);
        assert_eq!(err.sample, vec![(0, "0".to_string()), (1, "100".to_string())]);
        assert_eq!(err.reason, "bad 0");
    }

    #[test]
    fn no_failures_no_error() {
        let failures = FailureCollector::new(3);
        assert!(failures.is_empty());
        assert!(failures
            .into_error("a", &DataType::Int64, &DataType::UInt8, 10)
            .is_none());
    }
}
