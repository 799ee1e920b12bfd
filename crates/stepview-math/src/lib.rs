#![warn(missing_docs)]

//! Placement math for stepview.
//!
//! Thin wrappers around nalgebra for the one thing assembly traversal needs:
//! rigid placements of component instances, and their composition along a
//! path from a root assembly down to a leaf part.

use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, UnitQuaternion, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A 4x4 affine transformation matrix.
///
/// Component placements read from a document are usually rigid (rotation
/// plus translation), but nothing here assumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Placement of a local frame, in the form of a STEP `AXIS2_PLACEMENT_3D`.
    ///
    /// `axis` becomes the local Z direction and `ref_dir` the local X
    /// direction. `ref_dir` is projected onto the plane normal to `axis`, so
    /// it only needs to be roughly perpendicular. Degenerate inputs fall back
    /// to the global axes.
    pub fn from_axis2_placement(origin: &Point3, axis: &Vec3, ref_dir: &Vec3) -> Self {
        let z = Unit::try_new(*axis, 1e-12).unwrap_or_else(Vec3::z_axis);
        let projected = ref_dir - z.as_ref() * ref_dir.dot(z.as_ref());
        let x = Unit::try_new(projected, 1e-12).unwrap_or_else(|| {
            // ref_dir parallel to axis: pick any perpendicular direction
            let fallback = if z.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
            Unit::new_normalize(fallback - z.as_ref() * fallback.dot(z.as_ref()))
        });
        let y = z.cross(x.as_ref());

        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 1>(0, 0).copy_from(x.as_ref());
        m.fixed_view_mut::<3, 1>(0, 1).copy_from(&y);
        m.fixed_view_mut::<3, 1>(0, 2).copy_from(z.as_ref());
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&origin.coords);
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// For placements this means `other` is expressed in the frame placed by
    /// `self`: a child placement composed under its parent is
    /// `parent.then(&child)`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Compose a chain of placements ordered root first.
    ///
    /// An empty chain yields the identity.
    pub fn compose<'a, I>(chain: I) -> Self
    where
        I: IntoIterator<Item = &'a Transform>,
    {
        chain
            .into_iter()
            .fold(Self::identity(), |acc, local| acc.then(local))
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Translation part of the transform.
    pub fn translation_part(&self) -> Vec3 {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Rotation part as a unit quaternion.
    ///
    /// Meaningful only for rigid transforms; any scale or shear in the upper
    /// 3x3 block is not removed.
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        let m3: Matrix3<f64> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m3))
    }

    /// Element-wise comparison within `tol.linear`.
    pub fn approx_eq(&self, other: &Transform, tol: &Tolerance) -> bool {
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| tol.is_zero(a - b))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance constants for placement comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
}

impl Tolerance {
    /// Default CAD tolerance (1e-6 mm).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
