//! The descending sequence of box sizes an estimation run evaluates.

use crate::config::SizeStep;
use crate::errors::{config_error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSizeSeries {
    max_box_size: usize,
    min_box_size: usize,
    step: SizeStep,
}

impl BoxSizeSeries {
    pub fn new(max_box_size: usize, min_box_size: usize, step: SizeStep) -> Result<Self> {
        if min_box_size < 1 {
            return Err(config_error("minimum box size must be at least 1"));
        }
        if let SizeStep::Geometric(ratio) = step {
            if !ratio.is_finite() || ratio <= 1.0 {
                let msg = format!("box division factor must be > 1, got {ratio}");
                return Err(config_error(msg));
            }
        }
        Ok(BoxSizeSeries {
            max_box_size,
            min_box_size,
            step,
        })
    }

    pub fn max_box_size(&self) -> usize {
        self.max_box_size
    }

    pub fn min_box_size(&self) -> usize {
        self.min_box_size
    }

    /// A fresh iterator starting at the maximum box size.
    pub fn iter(&self) -> BoxSizes {
        BoxSizes {
            next: Some(self.max_box_size),
            min_box_size: self.min_box_size,
            step: self.step,
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.max_box_size < self.min_box_size
    }
}

impl IntoIterator for &BoxSizeSeries {
    type Item = usize;
    type IntoIter = BoxSizes;

    fn into_iter(self) -> BoxSizes {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct BoxSizes {
    next: Option<usize>,
    min_box_size: usize,
    step: SizeStep,
}

impl Iterator for BoxSizes {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let size = self.next.filter(|&s| s >= self.min_box_size)?;
        // integer truncation is part of the series, e.g. 5 / 1.2 -> 4
        self.next = match self.step {
            SizeStep::Geometric(ratio) => Some((size as f64 / ratio) as usize),
            SizeStep::Arithmetic => size.checked_sub(1),
        };
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(max: usize, min: usize, step: SizeStep) -> Vec<usize> {
        let series = BoxSizeSeries::new(max, min, step).unwrap();
        series.iter().collect()
    }

    #[test]
    fn geometric_halving() {
        assert_eq!(sizes(8, 2, SizeStep::Geometric(2.0)), vec![8, 4, 2]);
        assert_eq!(
            sizes(24, 6, SizeStep::Geometric(1.2)),
            vec![24, 20, 16, 13, 10, 8, 6]
        );
    }

    #[test]
    fn arithmetic_decrement() {
        assert_eq!(sizes(5, 2, SizeStep::Arithmetic), vec![5, 4, 3, 2]);
        assert_eq!(sizes(1, 1, SizeStep::Arithmetic), vec![1]);
    }

    #[test]
    fn empty_when_inverted() {
        let series = BoxSizeSeries::new(3, 4, SizeStep::Arithmetic).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.len(), 0);
    }

    #[test]
    fn restartable() {
        let series = BoxSizeSeries::new(30, 3, SizeStep::Geometric(1.7)).unwrap();
        let first: Vec<usize> = series.iter().collect();
        let second: Vec<usize> = (&series).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(series.len(), first.len());
    }

    #[test]
    fn sizes_bounded_and_non_increasing() {
        for max in 1..60 {
            for min in 1..=max {
                for ratio in [1.05, 1.2, 1.5, 2.0, 3.7] {
                    let s = sizes(max, min, SizeStep::Geometric(ratio));
                    assert_eq!(s[0], max);
                    assert!(s.iter().all(|&v| v >= min));
                    assert!(s.windows(2).all(|w| w[0] >= w[1]));
                }
            }
        }
    }

    #[test]
    fn rejects_zero_minimum() {
        let halving = SizeStep::Geometric(2.0);
        assert!(BoxSizeSeries::new(8, 0, halving).is_err());
        let flat = SizeStep::Geometric(1.0);
        assert!(BoxSizeSeries::new(8, 1, flat).is_err());
    }
}
