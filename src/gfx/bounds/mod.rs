//! Bounding-volume feedback
//!
//! Every mesh gets the eight corners of its mesh-local bounding box, computed by
//! a min/max reduction over its vertices (one workgroup per mesh on the GPU) and
//! read back into a table indexed like the mesh table. The whole round trip is a
//! single blocking call of
//! [`RenderBackend::compute_bounding_corners`](crate::gfx::backend::RenderBackend::compute_bounding_corners).

pub mod gpu;

pub use gpu::BoundsPipeline;

use crate::gfx::scene::aabb::Aabb;

/// Failures of the bounds pass
///
/// `Unsupported` is a capability report: the scene still loads, without
/// bounds. Everything else aborts the load.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FeedbackError {
    #[error("bounding-volume pass unavailable: {0}")]
    Unsupported(String),

    #[error("bounding-volume readback failed: {0}")]
    ReadbackFailed(String),

    #[error("bounding-volume pass returned {actual} boxes for {expected} meshes")]
    SizeMismatch { expected: usize, actual: usize },
}

/// The eight corners of a box, `w = 1`
///
/// Corner `i` takes the upper bound on x when bit 0 of `i` is set, on y for
/// bit 1 and on z for bit 2. Meshes without vertices get all-zero corners.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoxCorners {
    pub corners: [[f32; 4]; 8],
}

impl BoxCorners {
    pub fn from_aabb(aabb: &Aabb) -> Self {
        if aabb.is_empty() {
            return Self::default();
        }
        Self {
            corners: aabb.corners().map(|c| [c.x, c.y, c.z, 1.0]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.corners.iter().all(|c| c[3] == 0.0)
    }

    pub fn lower(&self) -> [f32; 3] {
        let c = self.corners[0];
        [c[0], c[1], c[2]]
    }

    pub fn upper(&self) -> [f32; 3] {
        let c = self.corners[7];
        [c[0], c[1], c[2]]
    }
}

/// Vertex span of one mesh inside [`BoundsRequest::positions`]
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshRange {
    pub first: u32,
    pub count: u32,
}

/// Input of the bounds pass: all mesh positions packed back to back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundsRequest {
    /// Positions with `w = 1`, padded to vec4 for storage-buffer alignment
    pub positions: Vec<[f32; 4]>,
    pub ranges: Vec<MeshRange>,
}

impl BoundsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the vertex positions of the next mesh
    pub fn push_mesh(&mut self, positions: &[[f32; 3]]) {
        self.ranges.push(MeshRange {
            first: self.positions.len() as u32,
            count: positions.len() as u32,
        });
        self.positions
            .extend(positions.iter().map(|p| [p[0], p[1], p[2], 1.0]));
    }

    pub fn mesh_count(&self) -> usize {
        self.ranges.len()
    }

    /// Runs the same reduction as the compute shader on the CPU
    pub fn reduce_on_cpu(&self) -> Vec<BoxCorners> {
        self.ranges
            .iter()
            .map(|range| {
                let start = range.first as usize;
                let end = start + range.count as usize;
                let points: Vec<[f32; 3]> = self.positions[start..end]
                    .iter()
                    .map(|p| [p[0], p[1], p[2]])
                    .collect();
                BoxCorners::from_aabb(&Aabb::from_points(&points))
            })
            .collect()
    }
}

/// Checks that a backend returned one box per mesh
pub fn check_result_len(
    request: &BoundsRequest,
    boxes: &[BoxCorners],
) -> Result<(), FeedbackError> {
    if boxes.len() != request.mesh_count() {
        return Err(FeedbackError::SizeMismatch {
            expected: request.mesh_count(),
            actual: boxes.len(),
        });
    }
    Ok(())
}
