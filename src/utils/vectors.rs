use nalgebra::{Vector3, Vector4};

/// A trait which treats a [`Vector3`] as the spatial momentum of a particle.
pub trait ThreeMomentum {
    /// The transverse momentum, $`\sqrt{p_x^2 + p_y^2}`$.
    fn pt(&self) -> f64;
    /// The azimuthal angle in the transverse plane, $`\text{atan2}(p_y, p_x)`$.
    fn phi(&self) -> f64;
    /// The cosine of the polar angle with respect to the $`z`$-axis.
    fn costheta(&self) -> f64;
    /// The pseudorapidity, $`-\ln\tan(\theta/2)`$.
    fn eta(&self) -> f64;
    /// Promote this three-momentum to a four-momentum under the given mass hypothesis.
    fn with_mass(&self, mass: f64) -> Vector4<f64>;
    /// Promote this three-momentum to a four-momentum with the given energy.
    fn with_energy(&self, energy: f64) -> Vector4<f64>;
    /// The unit vector along this momentum.
    fn unit(&self) -> Vector3<f64>;
}

impl ThreeMomentum for Vector3<f64> {
    fn pt(&self) -> f64 {
        self.x.hypot(self.y)
    }
    fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }
    fn costheta(&self) -> f64 {
        self.z / self.norm()
    }
    fn eta(&self) -> f64 {
        let p = self.norm();
        0.5 * ((p + self.z) / (p - self.z)).ln()
    }
    fn with_mass(&self, mass: f64) -> Vector4<f64> {
        let e = (mass * mass + self.norm_squared()).sqrt();
        Vector4::new(self.x, self.y, self.z, e)
    }
    fn with_energy(&self, energy: f64) -> Vector4<f64> {
        Vector4::new(self.x, self.y, self.z, energy)
    }
    fn unit(&self) -> Vector3<f64> {
        *self / self.norm()
    }
}

/// A trait which treats a [`Vector4`] as a four-momentum with components
/// $`(p_x, p_y, p_z, E)`$ stored in the $`(x, y, z, w)`$ fields.
pub trait FourMomentum {
    /// The energy component.
    fn e(&self) -> f64;
    /// The spatial momentum components.
    fn momentum(&self) -> Vector3<f64>;
    /// The invariant mass squared, $`E^2 - |\vec{p}|^2`$.
    fn m2(&self) -> f64;
    /// The invariant mass, $`\sqrt{E^2 - |\vec{p}|^2}`$.
    fn m(&self) -> f64;
    /// The transverse momentum.
    fn pt(&self) -> f64;
    /// The rapidity, $`\frac{1}{2}\ln\frac{E + p_z}{E - p_z}`$.
    fn rapidity(&self) -> f64;
    /// The velocity three-vector, $`\vec{p}/E`$.
    fn beta(&self) -> Vector3<f64>;
    /// Apply a Lorentz boost with the given velocity.
    fn boost(&self, beta: &Vector3<f64>) -> Vector4<f64>;
    /// Boost into the rest frame of the given four-momentum.
    fn boost_to_rest_frame_of(&self, frame: &Vector4<f64>) -> Vector4<f64> {
        self.boost(&(-frame.beta()))
    }
}

impl FourMomentum for Vector4<f64> {
    fn e(&self) -> f64 {
        self.w
    }
    fn momentum(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
    fn m2(&self) -> f64 {
        self.w * self.w - self.momentum().norm_squared()
    }
    fn m(&self) -> f64 {
        self.m2().sqrt()
    }
    fn pt(&self) -> f64 {
        self.x.hypot(self.y)
    }
    fn rapidity(&self) -> f64 {
        0.5 * ((self.w + self.z) / (self.w - self.z)).ln()
    }
    fn beta(&self) -> Vector3<f64> {
        self.momentum() / self.w
    }
    fn boost(&self, beta: &Vector3<f64>) -> Vector4<f64> {
        let b2 = beta.norm_squared();
        if b2 == 0.0 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let p3 = self.momentum()
            + beta * ((gamma - 1.0) * self.momentum().dot(beta) / b2 + gamma * self.e());
        Vector4::new(
            p3.x,
            p3.y,
            p3.z,
            gamma * (self.e() + beta.dot(&self.momentum())),
        )
    }
}
