use crate::error::{Error, Result};

/// Sorted census times at which tracking pauses.
///
/// The last entry plays the role of the final time boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Census {
    times: Vec<f64>,
}

impl Census {
    /// Errors: `Error::InvalidParam` for an empty list or non-finite, unsorted, or repeated times.
    pub fn new(times: Vec<f64>) -> Result<Self> {
        if times.is_empty() {
            return Err(Error::InvalidParam("census needs at least one time".into()));
        }
        if !times.iter().all(|t| t.is_finite()) {
            return Err(Error::InvalidParam("census times must be finite".into()));
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidParam(
                "census times must be strictly increasing".into(),
            ));
        }
        Ok(Self { times })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Final time boundary.
    pub fn last(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// First census time strictly after `t`.
    pub fn next_after(&self, t: f64) -> Option<f64> {
        let k = self.times.partition_point(|&c| c <= t);
        self.times.get(k).copied()
    }
}
