//! Per-joint angular ranges for uniform configuration sampling.

use linkage_core::config::{SamplerConfig, default_joint_limits};
use rand::Rng;

use crate::error::SamplerError;

/// Inclusive-exclusive `[low, high)` range per joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointLimits {
    ranges: Vec<[f64; 2]>,
}

impl JointLimits {
    /// Validate and wrap explicit ranges. A range with `low == high` pins
    /// the joint.
    pub fn new(ranges: Vec<[f64; 2]>) -> Result<Self, SamplerError> {
        for (joint, &[low, high]) in ranges.iter().enumerate() {
            if !low.is_finite() || !high.is_finite() || low > high {
                return Err(SamplerError::InvalidLimit { joint, low, high });
            }
        }
        Ok(Self { ranges })
    }

    /// Base joint spins freely, the rest bend up to a right angle.
    pub fn default_for(joints: usize) -> Self {
        Self {
            ranges: default_joint_limits(joints),
        }
    }

    /// Limits from the `[sampler]` config section, checked against the
    /// chain length.
    pub fn from_config(config: &SamplerConfig, joints: usize) -> Result<Self, SamplerError> {
        let limits = Self::new(config.limits_for(joints))?;
        limits.expect_joints(joints)?;
        Ok(limits)
    }

    pub(crate) fn expect_joints(&self, joints: usize) -> Result<(), SamplerError> {
        if self.ranges.len() == joints {
            Ok(())
        } else {
            Err(SamplerError::LimitCount {
                expected: joints,
                got: self.ranges.len(),
            })
        }
    }

    pub fn ranges(&self) -> &[[f64; 2]] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether every angle of `q` lies within its range.
    pub fn contains(&self, q: &[f64]) -> bool {
        q.len() == self.ranges.len()
            && q
                .iter()
                .zip(&self.ranges)
                .all(|(angle, &[low, high])| (low..=high).contains(angle))
    }

    /// Draw one configuration, one uniform value per joint in joint order.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|&[low, high]| {
                if low < high {
                    rng.gen_range(low..high)
                } else {
                    low
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};
    use linkage_test_utils::seeded_rng;

    #[test]
    fn default_ranges() {
        let limits = JointLimits::default_for(3);
        assert_eq!(limits.ranges()[0], [-PI, PI]);
        assert_eq!(limits.ranges()[2], [-FRAC_PI_2, FRAC_PI_2]);
    }

    #[test]
    fn default_matches_config_table() {
        let config = SamplerConfig::default();
        for joints in [1, 3, 5] {
            assert_eq!(
                JointLimits::default_for(joints).ranges(),
                config.limits_for(joints).as_slice()
            );
        }
    }

    #[test]
    fn samples_stay_in_range() {
        let limits = JointLimits::default_for(3);
        let mut rng = seeded_rng(3);
        for _ in 0..500 {
            let q = limits.sample(&mut rng);
            assert!(limits.contains(&q), "{q:?}");
        }
    }

    #[test]
    fn pinned_joint_returns_bound() {
        let limits = JointLimits::new(vec![[0.5, 0.5], [-1.0, 1.0]]).unwrap();
        let mut rng = seeded_rng(0);
        for _ in 0..10 {
            assert!((limits.sample(&mut rng)[0] - 0.5).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn rejects_inverted_range() {
        let err = JointLimits::new(vec![[0.0, 1.0], [2.0, 1.0]]).unwrap_err();
        assert!(matches!(err, SamplerError::InvalidLimit { joint: 1, .. }));
    }

    #[test]
    fn rejects_nan() {
        assert!(JointLimits::new(vec![[f64::NAN, 1.0]]).is_err());
    }

    #[test]
    fn config_length_must_match_chain() {
        let config = SamplerConfig {
            joint_limits: Some(vec![[-1.0, 1.0]; 2]),
            ..SamplerConfig::default()
        };
        let err = JointLimits::from_config(&config, 3).unwrap_err();
        assert!(matches!(err, SamplerError::LimitCount { expected: 3, got: 2 }));
        assert_eq!(JointLimits::from_config(&SamplerConfig::default(), 4).unwrap().len(), 4);
    }
}
