//! Constant-velocity Kalman filter over box state `(cx, cy, a, h, vx, vy, va, vh)`.

use nalgebra::{SMatrix, SVector};

pub type StateMean = SVector<f64, 8>;
pub type StateCovariance = SMatrix<f64, 8, 8>;
/// Measurement in XYAH space.
pub type Measurement = SVector<f64, 4>;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: SMatrix<f64, 8, 8>,
    update_mat: SMatrix<f64, 4, 8>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn diagonal_8(std: [f64; 8]) -> StateCovariance {
    let mut m = StateCovariance::zeros();
    for (i, s) in std.iter().enumerate() {
        m[(i, i)] = s * s;
    }
    m
}

fn diagonal_4(std: [f64; 4]) -> SMatrix<f64, 4, 4> {
    let mut m = SMatrix::<f64, 4, 4>::zeros();
    for (i, s) in std.iter().enumerate() {
        m[(i, i)] = s * s;
    }
    m
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = SMatrix::<f64, 8, 8>::identity();
        let mut update_mat = SMatrix::<f64, 4, 8>::zeros();
        for i in 0..4 {
            motion_mat[(i, 4 + i)] = 1.0;
            update_mat[(i, i)] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    /// Start a track from an unassociated measurement. Velocities start at zero.
    pub fn initiate(&self, measurement: Measurement) -> (StateMean, StateCovariance) {
        let mut mean = StateMean::zeros();
        for i in 0..4 {
            mean[i] = measurement[i];
        }

        let h = measurement[3];
        let pos = 2.0 * self.std_weight_position * h;
        let vel = 10.0 * self.std_weight_velocity * h;
        let covariance = diagonal_8([pos, pos, 1e-2, pos, vel, vel, 1e-5, vel]);

        (mean, covariance)
    }

    pub fn predict(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (StateMean, StateCovariance) {
        let h = mean[3];
        let pos = self.std_weight_position * h;
        let vel = self.std_weight_velocity * h;
        let motion_cov = diagonal_8([pos, pos, 1e-2, pos, vel, vel, 1e-5, vel]);

        let new_mean = self.motion_mat * mean;
        let new_covariance = self.motion_mat * covariance * self.motion_mat.transpose() + motion_cov;

        (new_mean, new_covariance)
    }

    /// Project state distribution into measurement space.
    pub fn project(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (Measurement, SMatrix<f64, 4, 4>) {
        let h = mean[3];
        let pos = self.std_weight_position * h;
        let innovation_cov = diagonal_4([pos, pos, 1e-1, pos]);

        let mean_proj = self.update_mat * mean;
        let covariance_proj =
            self.update_mat * covariance * self.update_mat.transpose() + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Correct the state with a measurement.
    ///
    /// Returns `None` when the innovation covariance is singular; callers keep
    /// the predicted state in that case.
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
        measurement: Measurement,
    ) -> Option<(StateMean, StateCovariance)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let s_inv = projected_cov.try_inverse()?;

        let kalman_gain = covariance * self.update_mat.transpose() * s_inv;
        let innovation = measurement - projected_mean;

        let new_mean = mean + kalman_gain * innovation;
        let new_covariance = covariance - kalman_gain * projected_cov * kalman_gain.transpose();

        Some((new_mean, new_covariance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiate() {
        let kf = KalmanFilter::new();
        let (mean, cov) = kf.initiate(Measurement::new(100.0, 200.0, 0.5, 50.0));
        assert_eq!(mean[0], 100.0);
        assert_eq!(mean[4], 0.0);
        assert!(cov[(0, 0)] > 0.0);
    }

    #[test]
    fn test_predict_moves_by_velocity() {
        let kf = KalmanFilter::new();
        let (mut mean, cov) = kf.initiate(Measurement::new(10.0, 10.0, 1.0, 20.0));
        mean[4] = 3.0;
        let (predicted, _) = kf.predict(&mean, &cov);
        assert!((predicted[0] - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_pulls_towards_measurement() {
        let kf = KalmanFilter::new();
        let (mean, cov) = kf.initiate(Measurement::new(10.0, 10.0, 1.0, 20.0));
        let (updated, _) = kf
            .update(&mean, &cov, Measurement::new(14.0, 10.0, 1.0, 20.0))
            .unwrap();
        assert!(updated[0] > 10.0 && updated[0] < 14.0);
    }
}
