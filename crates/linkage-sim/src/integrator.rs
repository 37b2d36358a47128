//! First-order joint integrator.
//!
//! Joints behave as if immersed in a viscous medium: the commanded torque
//! sets the joint velocity directly, `qdot = tau / damping`, and angles
//! advance by `qdot * dt`.

use linkage_core::config::SimulationConfig;
use linkage_core::error::KinematicsError;

use crate::SimError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicIntegrator {
    dt: f64,
    joint_damping: f64,
}

impl KinematicIntegrator {
    pub fn new(dt: f64, joint_damping: f64) -> Result<Self, SimError> {
        check_positive("dt", dt)?;
        check_positive("joint_damping", joint_damping)?;
        Ok(Self { dt, joint_damping })
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimError> {
        Self::new(config.dt, config.joint_damping)
    }

    pub const fn dt(&self) -> f64 {
        self.dt
    }

    pub const fn joint_damping(&self) -> f64 {
        self.joint_damping
    }

    /// Advance `q` and overwrite `qdot` with the new joint velocities.
    pub fn step(
        &self,
        q: &mut [f64],
        qdot: &mut [f64],
        torques: &[f64],
    ) -> Result<(), KinematicsError> {
        for len in [qdot.len(), torques.len()] {
            if len != q.len() {
                return Err(KinematicsError::DimensionMismatch {
                    expected: q.len(),
                    got: len,
                });
            }
        }
        for ((angle, velocity), tau) in q.iter_mut().zip(qdot.iter_mut()).zip(torques) {
            *velocity = tau / self.joint_damping;
            *angle += *velocity * self.dt;
        }
        Ok(())
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn velocity_is_torque_over_damping() {
        let integrator = KinematicIntegrator::new(0.1, 4.0).unwrap();
        let mut q = [0.0, 1.0];
        let mut qdot = [9.0, 9.0];
        integrator.step(&mut q, &mut qdot, &[2.0, -4.0]).unwrap();
        assert_relative_eq!(qdot[0], 0.5);
        assert_relative_eq!(qdot[1], -1.0);
        assert_relative_eq!(q[0], 0.05);
        assert_relative_eq!(q[1], 0.9);
    }

    #[test]
    fn zero_torque_stops_joints() {
        let integrator = KinematicIntegrator::from_config(&SimulationConfig::default()).unwrap();
        let mut q = [0.3; 3];
        let mut qdot = [1.0; 3];
        integrator.step(&mut q, &mut qdot, &[0.0; 3]).unwrap();
        assert_eq!(q, [0.3; 3]);
        assert_eq!(qdot, [0.0; 3]);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(KinematicIntegrator::new(0.0, 1.0).is_err());
        assert!(KinematicIntegrator::new(0.1, -1.0).is_err());
        assert!(KinematicIntegrator::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn rejects_length_mismatch() {
        let integrator = KinematicIntegrator::new(0.1, 1.0).unwrap();
        let err = integrator
            .step(&mut [0.0; 3], &mut [0.0; 3], &[0.0; 2])
            .unwrap_err();
        assert_eq!(
            err,
            KinematicsError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        );
    }
}
