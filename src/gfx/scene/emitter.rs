//! Turning the scene graph into a command stream

use cgmath::Matrix4;
use log::debug;

use super::scene::{walk_nodes, Scene};
use crate::error::SceneError;
use crate::gfx::backend::{CommandSink, DrawMode, RenderBackend};
use crate::gfx::bounds::BoxCorners;

/// What one traversal did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub nodes_visited: usize,
    pub draws: usize,
}

impl<B: RenderBackend> Scene<B> {
    /// Emits the subtree under `node_index`
    ///
    /// Each node's transform is `accumulated * ... * node.transformation`. For
    /// every mesh of a node, in order, the sink receives the mesh's material,
    /// the transform, the box corners in [`DrawMode::BoundingBox`], and the
    /// draw. Meshes with an empty box are skipped in [`DrawMode::BoundingBox`].
    /// Children follow in order. The pipeline is not selected here; see
    /// [`Scene::record`].
    pub fn emit<S: CommandSink<B>>(
        &self,
        sink: &mut S,
        node_index: usize,
        accumulated: Matrix4<f32>,
        mode: DrawMode,
    ) -> Result<EmitStats, SceneError> {
        let bounds = match (mode, self.bounds()) {
            (DrawMode::BoundingBox, None) => return Ok(EmitStats::default()),
            (_, bounds) => bounds,
        };

        let mut stats = EmitStats::default();
        walk_nodes(&self.nodes, node_index, accumulated, |_, node, local| {
            stats.nodes_visited += 1;
            for &mesh_index in &node.mesh_indices {
                let mesh = self.mesh(mesh_index)?;
                let corners = match (mode, bounds) {
                    (DrawMode::BoundingBox, Some(bounds)) => Some(&bounds[mesh_index]),
                    _ => None,
                };
                // meshes without vertices have no box to outline
                if corners.is_some_and(BoxCorners::is_empty) {
                    continue;
                }
                let material = self.material(mesh.material_index)?;

                sink.bind_material(&material.binding);
                sink.set_transform(local);
                if let Some(corners) = corners {
                    sink.set_bounding_corners(corners);
                }
                sink.draw_mesh(&mesh.buffers, mode);
                stats.draws += 1;
            }
            Ok(())
        })?;
        Ok(stats)
    }

    /// Selects the pipeline for `mode` and emits the whole scene from the root
    ///
    /// A scene without bounds records nothing in [`DrawMode::BoundingBox`].
    pub fn record<S: CommandSink<B>>(
        &self,
        sink: &mut S,
        root_transform: Matrix4<f32>,
        mode: DrawMode,
    ) -> Result<EmitStats, SceneError> {
        if mode == DrawMode::BoundingBox && !self.has_bounds() {
            debug!("Skipping bounding-box pass, scene has no bounds");
            return Ok(EmitStats::default());
        }
        sink.set_draw_mode(mode);
        self.emit(sink, 0, root_transform, mode)
    }
}
