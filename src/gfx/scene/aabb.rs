//! Axis-aligned bounding boxes
//!
//! Boxes are stored as a lower/upper corner pair. A box with `lower > upper`
//! on any axis is *empty*: it is the identity element of [`Aabb::union`] and is
//! kept empty by [`Aabb::transformed`], so zero-vertex meshes never widen the
//! bounds they are merged into.

use cgmath::{Matrix4, Point3, SquareMatrix, Transform, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub lower: Vector3<f32>,
    pub upper: Vector3<f32>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(lower: Vector3<f32>, upper: Vector3<f32>) -> Self {
        Self { lower, upper }
    }

    /// The box containing nothing
    pub fn empty() -> Self {
        Self {
            lower: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            upper: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Smallest box containing all `points`; empty for an empty slice
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        points.iter().fold(Self::empty(), |aabb, p| {
            aabb.union(&Self::new(Vector3::from(*p), Vector3::from(*p)))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lower.x > self.upper.x || self.lower.y > self.upper.y || self.lower.z > self.upper.z
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Aabb::new(
            Vector3::new(
                self.lower.x.min(other.lower.x),
                self.lower.y.min(other.lower.y),
                self.lower.z.min(other.lower.z),
            ),
            Vector3::new(
                self.upper.x.max(other.upper.x),
                self.upper.y.max(other.upper.y),
                self.upper.z.max(other.upper.z),
            ),
        )
    }

    /// The eight corners; corner `i` takes `upper` on x for bit 0, y for bit 1, z for bit 2
    pub fn corners(&self) -> [Vector3<f32>; 8] {
        std::array::from_fn(|i| {
            Vector3::new(
                if i & 1 != 0 { self.upper.x } else { self.lower.x },
                if i & 2 != 0 { self.upper.y } else { self.lower.y },
                if i & 4 != 0 { self.upper.z } else { self.lower.z },
            )
        })
    }

    /// Box around all eight corners after applying `matrix`
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let corners = self.corners().map(|c| {
            let p = matrix.transform_point(Point3::new(c.x, c.y, c.z));
            [p.x, p.y, p.z]
        });
        Aabb::from_points(&corners)
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.lower + self.upper) * 0.5
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.upper - self.lower
    }

    /// Uniform scale and translation fitting the box into `[-0.5, 0.5]^3`
    ///
    /// Empty and zero-sized boxes give the identity.
    pub fn normalization_transform(&self) -> Matrix4<f32> {
        if self.is_empty() {
            return Matrix4::identity();
        }
        let extent = self.extent();
        let largest = extent.x.max(extent.y).max(extent.z);
        if largest <= f32::EPSILON {
            return Matrix4::from_translation(-self.center());
        }
        Matrix4::from_scale(1.0 / largest) * Matrix4::from_translation(-self.center())
    }
}
