use std::f64::consts::{PI, TAU};

use nalgebra::{Vector3, Vector4};
use rand::Rng;

use crate::utils::enums::PolarizationAxis;
use crate::utils::vectors::{FourMomentum, ThreeMomentum};

/// PDG mass of the K0s (GeV/c^2).
pub const K0S_MASS: f64 = 0.497611;
/// PDG mass of the Lambda (GeV/c^2).
pub const LAMBDA_MASS: f64 = 1.115683;
/// PDG mass of the proton (GeV/c^2).
pub const PROTON_MASS: f64 = 0.93827208816;

/// The derived scalars computed for one candidate pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PairObservables {
    /// Invariant mass of the composite.
    pub mass: f64,
    /// Transverse momentum of the composite.
    pub pt: f64,
    /// Rapidity of the composite (used for the recording gate).
    pub rapidity: f64,
    /// Cosine of the angle between the active reference axis and the boosted daughter.
    pub cos_theta_star: f64,
    /// Azimuthal angle of the boosted daughter in the beam-defined rest-frame basis,
    /// mapped into [0, 2pi).
    pub phi: f64,
}

/// Draw a rotation angle for the rotational background: uniform in
/// `[pi - pi/rotational_cut, pi + pi/rotational_cut]`, a window which excludes angles
/// near zero rotation.
pub fn rotation_angle<R: Rng>(rotational_cut: f64, rng: &mut R) -> f64 {
    rng.gen_range((PI - PI / rotational_cut)..(PI + PI / rotational_cut))
}

/// Rotate the transverse momentum of a four-vector by `angle`, keeping `pz` and the
/// energy (the magnitude of the momentum is unchanged, so the mass is too).
pub fn rotate_transverse(p4: Vector4<f64>, angle: f64) -> Vector4<f64> {
    let (sin, cos) = angle.sin_cos();
    Vector4::new(
        p4.x * cos - p4.y * sin,
        p4.x * sin + p4.y * cos,
        p4.z,
        p4.w,
    )
}

/// Computes invariant-mass and polarization observables for daughter pairs.
///
/// Holds the active reference-axis policy and the beam four-vectors used to build the
/// rest-frame azimuthal basis. The random generator for the `Random` axis policy and
/// the rotational background is injected by the caller.
#[derive(Clone, Debug)]
pub struct ObservableCalculator {
    axis: PolarizationAxis,
    mass_hypothesis: f64,
    beam1: Vector4<f64>,
    beam2: Vector4<f64>,
}

impl ObservableCalculator {
    /// Build a calculator for the given axis policy, daughter mass hypothesis, and
    /// center-of-mass energy (GeV).
    pub fn new(axis: PolarizationAxis, mass_hypothesis: f64, sqrt_s: f64) -> Self {
        let half = sqrt_s / 2.0;
        let beam_momentum = (half * half - PROTON_MASS * PROTON_MASS).sqrt();
        Self {
            axis,
            mass_hypothesis,
            beam1: Vector4::new(0.0, 0.0, -beam_momentum, half),
            beam2: Vector4::new(0.0, 0.0, beam_momentum, half),
        }
    }

    /// The active reference-axis policy.
    pub fn axis(&self) -> PolarizationAxis {
        self.axis
    }

    /// Promote a candidate momentum to a four-vector under the daughter mass hypothesis.
    pub fn daughter_p4(&self, momentum: Vector3<f64>) -> Vector4<f64> {
        momentum.with_mass(self.mass_hypothesis)
    }

    /// Compute the observables for a daughter pair.
    ///
    /// The composite mass and pT are symmetric under daughter exchange; the angular
    /// observables are measured for `daughter1` and flip under exchange (the boosted
    /// daughters are back to back in the composite rest frame).
    pub fn compute<R: Rng>(
        &self,
        daughter1: Vector4<f64>,
        daughter2: Vector4<f64>,
        rng: &mut R,
    ) -> PairObservables {
        let mother = daughter1 + daughter2;
        let dau_cm = daughter1.boost_to_rest_frame_of(&mother);
        let cos_theta_star = self.cos_theta_star(&mother, &dau_cm, rng);
        let phi = self.rest_frame_phi(&mother, &dau_cm);
        PairObservables {
            mass: mother.m(),
            pt: mother.pt(),
            rapidity: mother.rapidity(),
            cos_theta_star,
            phi,
        }
    }

    /// Compute one rotational-background sample for a pair.
    ///
    /// One daughter's transverse momentum is rotated by an angle from
    /// [`rotation_angle`] and the composite is rebuilt. Under the helicity policy the
    /// angular observable is recomputed against the rotated composite; the fixed-axis
    /// policies keep the angular observables of the unrotated pair and only the
    /// composite kinematics change.
    pub fn rotated<R: Rng>(
        &self,
        daughter1: Vector4<f64>,
        daughter2: Vector4<f64>,
        base: &PairObservables,
        rotational_cut: f64,
        rng: &mut R,
    ) -> PairObservables {
        let angle = rotation_angle(rotational_cut, rng);
        match self.axis {
            PolarizationAxis::Helicity => {
                let rotated = rotate_transverse(daughter1, angle);
                let mother = rotated + daughter2;
                let dau_cm = rotated.boost_to_rest_frame_of(&mother);
                let cos_theta_star = mother.momentum().dot(&dau_cm.momentum())
                    / (dau_cm.momentum().norm() * mother.momentum().norm());
                PairObservables {
                    mass: mother.m(),
                    pt: mother.pt(),
                    rapidity: mother.rapidity(),
                    cos_theta_star,
                    phi: base.phi,
                }
            }
            _ => {
                let mother = rotate_transverse(daughter1 + daughter2, angle);
                PairObservables {
                    mass: mother.m(),
                    pt: mother.pt(),
                    rapidity: mother.rapidity(),
                    cos_theta_star: base.cos_theta_star,
                    phi: base.phi,
                }
            }
        }
    }

    fn cos_theta_star<R: Rng>(
        &self,
        mother: &Vector4<f64>,
        dau_cm: &Vector4<f64>,
        rng: &mut R,
    ) -> f64 {
        let p = dau_cm.momentum();
        match self.axis {
            PolarizationAxis::Helicity => {
                mother.momentum().dot(&p) / (p.norm() * mother.momentum().norm())
            }
            PolarizationAxis::Production => {
                let normal = Vector3::new(mother.y, -mother.x, 0.0);
                normal.dot(&p) / (p.norm() * normal.norm())
            }
            PolarizationAxis::Beam => p.z / p.norm(),
            PolarizationAxis::Random => {
                let phi = rng.gen_range(0.0..TAU);
                let theta = rng.gen_range(0.0..PI);
                let axis = Vector3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                axis.dot(&p) / p.norm()
            }
        }
    }

    /// Azimuthal angle of the boosted daughter in a basis built from the beam
    /// directions boosted into the composite rest frame:
    /// z along the composite lab direction, y along B1_CM x B2_CM, x = y x z.
    fn rest_frame_phi(&self, mother: &Vector4<f64>, dau_cm: &Vector4<f64>) -> f64 {
        let boost = -mother.beta();
        let beam1_cm = self.beam1.boost(&boost).momentum().unit();
        let beam2_cm = self.beam2.boost(&boost).momentum().unit();
        let z_axis = mother.momentum().unit();
        let y_axis = beam1_cm.cross(&beam2_cm).unit();
        let x_axis = y_axis.cross(&z_axis).unit();
        let v1 = dau_cm.momentum().unit();
        let mut phi = y_axis.dot(&v1).atan2(x_axis.dot(&v1));
        if phi < 0.0 {
            phi += TAU;
        }
        phi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0)
    }

    fn calculator(axis: PolarizationAxis) -> ObservableCalculator {
        ObservableCalculator::new(axis, 0.4976, 13600.0)
    }

    #[test]
    fn back_to_back_pair_is_at_rest() {
        let calc = calculator(PolarizationAxis::Beam);
        let d1 = calc.daughter_p4(Vector3::new(1.0, 0.0, 0.0));
        let d2 = calc.daughter_p4(Vector3::new(-1.0, 0.0, 0.0));
        let obs = calc.compute(d1, d2, &mut rng());
        assert_relative_eq!(obs.pt, 0.0, epsilon = 1e-12);
        // all momentum cancels but the daughters are not at rest in the pair frame
        let expected_mass = 2.0 * (0.4976_f64 * 0.4976 + 1.0).sqrt();
        assert_relative_eq!(obs.mass, expected_mass, epsilon = 1e-12);
        assert_relative_eq!(obs.cos_theta_star, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn collinear_daughters_give_unit_cos_theta_star() {
        let calc = calculator(PolarizationAxis::Helicity);
        // both along +x, the leading daughter keeps a forward CM momentum
        let d1 = calc.daughter_p4(Vector3::new(1.0, 0.0, 0.0));
        let d2 = calc.daughter_p4(Vector3::new(0.5, 0.0, 0.0));
        let obs = calc.compute(d1, d2, &mut rng());
        assert_relative_eq!(obs.cos_theta_star, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn production_axis_is_orthogonal_to_transverse_daughter() {
        let calc = calculator(PolarizationAxis::Production);
        let d1 = calc.daughter_p4(Vector3::new(1.0, 0.0, 0.0));
        let d2 = calc.daughter_p4(Vector3::new(0.5, 0.0, 0.0));
        let obs = calc.compute(d1, d2, &mut rng());
        // production-plane normal is (py, -px, 0), orthogonal to an x-aligned daughter
        assert_relative_eq!(obs.cos_theta_star, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn mass_and_pt_are_symmetric_under_daughter_swap() {
        let calc = calculator(PolarizationAxis::Helicity);
        let d1 = calc.daughter_p4(Vector3::new(0.2, 0.3, 1.1));
        let d2 = calc.daughter_p4(Vector3::new(-0.1, 0.4, 0.9));
        let ab = calc.compute(d1, d2, &mut rng());
        let ba = calc.compute(d2, d1, &mut rng());
        assert_relative_eq!(ab.mass, ba.mass, epsilon = 1e-12);
        assert_relative_eq!(ab.pt, ba.pt, epsilon = 1e-12);
        assert_relative_eq!(ab.rapidity, ba.rapidity, epsilon = 1e-12);
    }

    #[test]
    fn angular_observables_flip_under_daughter_swap() {
        let calc = calculator(PolarizationAxis::Helicity);
        let d1 = calc.daughter_p4(Vector3::new(0.2, 0.3, 1.1));
        let d2 = calc.daughter_p4(Vector3::new(-0.1, 0.4, 0.9));
        let ab = calc.compute(d1, d2, &mut rng());
        let ba = calc.compute(d2, d1, &mut rng());
        // the boosted daughters are exactly back to back in the composite rest frame
        assert_relative_eq!(ab.cos_theta_star, -ba.cos_theta_star, epsilon = 1e-9);
        assert_relative_eq!((ab.phi - ba.phi).abs(), PI, epsilon = 1e-9);
    }

    #[test]
    fn phi_lies_in_unit_circle_range() {
        let calc = calculator(PolarizationAxis::Beam);
        let mut rng = rng();
        for i in 0..50 {
            let t = i as f64 * 0.13;
            let d1 = calc.daughter_p4(Vector3::new(t.cos(), t.sin(), 0.3 * t.cos()));
            let d2 = calc.daughter_p4(Vector3::new(0.4, -0.2, 0.8));
            let obs = calc.compute(d1, d2, &mut rng);
            assert!((0.0..=TAU).contains(&obs.phi));
        }
    }

    #[test]
    fn rotation_angles_stay_inside_window() {
        let mut rng = rng();
        for _ in 0..10_000 {
            let angle = rotation_angle(10.0, &mut rng);
            assert!((angle - PI).abs() <= PI / 10.0);
        }
    }

    #[test]
    fn transverse_rotation_preserves_momentum_and_mass() {
        let p4 = Vector3::new(0.7, -0.4, 1.3).with_mass(0.4976);
        let rotated = rotate_transverse(p4, 2.9);
        assert_relative_eq!(rotated.momentum().norm(), p4.momentum().norm(), epsilon = 1e-12);
        assert_relative_eq!(rotated.m(), p4.m(), epsilon = 1e-12);
        assert_relative_eq!(rotated.z, p4.z);
    }

    #[test]
    fn rotated_background_changes_only_kinematics_for_fixed_axes() {
        let calc = calculator(PolarizationAxis::Beam);
        let d1 = calc.daughter_p4(Vector3::new(0.2, 0.3, 1.1));
        let d2 = calc.daughter_p4(Vector3::new(-0.1, 0.4, 0.9));
        let mut rng = rng();
        let base = calc.compute(d1, d2, &mut rng);
        let rot = calc.rotated(d1, d2, &base, 10.0, &mut rng);
        assert_relative_eq!(rot.cos_theta_star, base.cos_theta_star);
        assert_relative_eq!(rot.phi, base.phi);
        assert_relative_eq!(rot.mass, base.mass, epsilon = 1e-12);
        assert_relative_eq!(rot.pt, base.pt, epsilon = 1e-12);
    }

    #[test]
    fn helicity_rotated_background_recomputes_angle() {
        let calc = calculator(PolarizationAxis::Helicity);
        let d1 = calc.daughter_p4(Vector3::new(0.2, 0.3, 1.1));
        let d2 = calc.daughter_p4(Vector3::new(-0.1, 0.4, 0.9));
        let mut rng = rng();
        let base = calc.compute(d1, d2, &mut rng);
        let rot = calc.rotated(d1, d2, &base, 10.0, &mut rng);
        // rotating one daughter changes the composite mass and the helicity angle
        assert!((rot.mass - base.mass).abs() > 1e-6);
        assert!(rot.cos_theta_star.abs() <= 1.0);
        assert_relative_eq!(rot.phi, base.phi);
    }

    #[test]
    fn random_axis_gives_bounded_cos_theta_star() {
        let calc = calculator(PolarizationAxis::Random);
        let d1 = calc.daughter_p4(Vector3::new(0.2, 0.3, 1.1));
        let d2 = calc.daughter_p4(Vector3::new(-0.1, 0.4, 0.9));
        let mut rng = rng();
        for _ in 0..100 {
            let obs = calc.compute(d1, d2, &mut rng);
            assert!(obs.cos_theta_star.abs() <= 1.0);
        }
    }
}
