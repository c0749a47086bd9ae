use nalgebra::{Matrix3, Point3, Vector3};

const RIGHT_ANGLE_TOLERANCE_DEG: f64 = 1e-6;

/// Periodic simulation cell described by three box vectors (nm).
///
/// The vectors follow the reduced triclinic convention used by molecular-mechanics
/// engines: `a` lies along x, `b` in the xy-plane, and each vector has been reduced
/// against the previous ones. Orthorhombic cells are the special case of three axis-aligned
/// vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    /// Box vectors stored as the columns `a`, `b`, `c`.
    vectors: Matrix3<f64>,
}

impl PeriodicBox {
    /// Creates a cell from explicit box vectors.
    ///
    /// # Arguments
    ///
    /// * `a`, `b`, `c` - The three box vectors in nanometres.
    pub fn new(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self {
            vectors: Matrix3::from_columns(&[a, b, c]),
        }
    }

    /// Creates an orthorhombic cell with the given edge lengths (nm).
    pub fn orthorhombic(x: f64, y: f64, z: f64) -> Self {
        Self::new(
            Vector3::new(x, 0.0, 0.0),
            Vector3::new(0.0, y, 0.0),
            Vector3::new(0.0, 0.0, z),
        )
    }

    /// Creates a cell from edge lengths (nm) and angles (degrees), as stored in `CRYST1`
    /// records and in the last line of Amber restart files.
    ///
    /// # Arguments
    ///
    /// * `lengths` - Edge lengths `a`, `b`, `c`.
    /// * `angles` - Angles `alpha` (b∠c), `beta` (a∠c), `gamma` (a∠b) in degrees.
    ///
    /// # Return
    ///
    /// The cell in reduced triclinic form.
    pub fn from_lengths_and_angles(lengths: [f64; 3], angles: [f64; 3]) -> Self {
        let [a, b, c] = lengths;
        let [alpha, beta, gamma] = angles;

        if angles
            .iter()
            .all(|angle| (angle - 90.0).abs() < RIGHT_ANGLE_TOLERANCE_DEG)
        {
            return Self::orthorhombic(a, b, c);
        }

        let (alpha, beta, gamma) = (alpha.to_radians(), beta.to_radians(), gamma.to_radians());
        let a_vec = Vector3::new(a, 0.0, 0.0);
        let b_vec = Vector3::new(b * gamma.cos(), b * gamma.sin(), 0.0);
        let cx = c * beta.cos();
        let cy = c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();
        let mut c_vec = Vector3::new(cx, cy, cz);
        let mut b_vec = b_vec;

        c_vec -= b_vec * (c_vec.y / b_vec.y).round();
        c_vec -= a_vec * (c_vec.x / a_vec.x).round();
        b_vec -= a_vec * (b_vec.x / a_vec.x).round();

        Self::new(a_vec, b_vec, c_vec)
    }

    pub fn a(&self) -> Vector3<f64> {
        self.vectors.column(0).into_owned()
    }

    pub fn b(&self) -> Vector3<f64> {
        self.vectors.column(1).into_owned()
    }

    pub fn c(&self) -> Vector3<f64> {
        self.vectors.column(2).into_owned()
    }

    /// Returns the box vectors as the columns of a matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.vectors
    }

    /// Edge lengths (nm) and angles `alpha`, `beta`, `gamma` (degrees).
    pub fn lengths_and_angles(&self) -> ([f64; 3], [f64; 3]) {
        let (a, b, c) = (self.a(), self.b(), self.c());
        let angle = |u: &Vector3<f64>, v: &Vector3<f64>| {
            (u.dot(v) / (u.norm() * v.norm()))
                .clamp(-1.0, 1.0)
                .acos()
                .to_degrees()
        };
        (
            [a.norm(), b.norm(), c.norm()],
            [angle(&b, &c), angle(&a, &c), angle(&a, &b)],
        )
    }

    /// Cell volume in nm³.
    pub fn volume(&self) -> f64 {
        self.vectors.determinant().abs()
    }

    /// Sum of the three box vectors, i.e. the far corner of the cell.
    pub fn diagonal(&self) -> Vector3<f64> {
        self.a() + self.b() + self.c()
    }

    /// Geometric centre of the cell.
    pub fn centre(&self) -> Point3<f64> {
        Point3::from(self.diagonal() * 0.5)
    }

    /// Largest cutoff this cell supports under the minimum-image convention.
    pub fn max_cutoff(&self) -> f64 {
        0.5 * self.vectors[(0, 0)]
            .min(self.vectors[(1, 1)])
            .min(self.vectors[(2, 2)])
    }

    /// Fractional coordinates of `point`, or `None` for a degenerate cell.
    pub fn to_fractional(&self, point: &Point3<f64>) -> Option<Vector3<f64>> {
        self.vectors
            .try_inverse()
            .map(|inverse| inverse * point.coords)
    }

    /// Translation that brings `point` into the primary cell `[0, 1)³` (fractional).
    ///
    /// Returns a zero vector for a degenerate cell.
    pub fn wrap_shift(&self, point: &Point3<f64>) -> Vector3<f64> {
        match self.to_fractional(point) {
            Some(fractional) => self.vectors * fractional.map(|f| -f.floor()),
            None => Vector3::zeros(),
        }
    }
}
