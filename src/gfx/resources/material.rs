//! Scene materials
//!
//! A material is a small constant block plus a table of exactly five textures in
//! [`TextureSlot`](crate::gfx::resources::texture_table::TextureSlot) order. The
//! GPU side of both lives in the backend's `MaterialBinding`; the CPU copies are
//! kept for inspection.

use wgpu::Device;

use crate::gfx::backend::RenderBackend;
use crate::gfx::resources::texture_table::TEXTURE_SLOT_COUNT;
use crate::import::ParsedMaterial;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// GPU constant block of a material
///
/// Colours that the source material does not define are zero. The `w`
/// component of `specular_and_exponent` carries the Phong exponent.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialConstants {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular_and_exponent: [f32; 4],
    pub emissive: [f32; 4],
}

impl MaterialConstants {
    pub fn from_parsed(material: &ParsedMaterial) -> Self {
        let color = |c: Option<[f32; 3]>| match c {
            Some([r, g, b]) => [r, g, b, 0.0],
            None => [0.0; 4],
        };
        let specular = color(material.specular);
        Self {
            ambient: color(material.ambient),
            diffuse: color(material.diffuse),
            specular_and_exponent: [specular[0], specular[1], specular[2], material.shininess],
            emissive: color(material.emissive),
        }
    }
}

pub type MaterialUBO = UniformBuffer<MaterialConstants>;

/// Bind group layout shared by all materials
///
/// Binding 0 holds the constants, bindings 1 to 5 the slot textures and
/// binding 6 the sampler.
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let mut builder =
            BindGroupLayoutBuilder::new().next_binding_fragment(binding_types::uniform());
        for _ in 0..TEXTURE_SLOT_COUNT {
            builder = builder.next_binding_fragment(binding_types::texture_2d());
        }
        let bind_group_layout = builder
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group");

        MaterialBindings { bind_group_layout }
    }

    pub fn create_bind_group(
        &self,
        device: &Device,
        label: &str,
        ubo: &MaterialUBO,
        views: [&wgpu::TextureView; TEXTURE_SLOT_COUNT],
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        let mut builder =
            BindGroupBuilder::new(&self.bind_group_layout).resource(ubo.binding_resource());
        for view in views {
            builder = builder.texture(view);
        }
        builder.sampler(sampler).create(device, label)
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

/// One entry of a scene's material table
pub struct Material<B: RenderBackend> {
    pub name: String,
    pub constants: MaterialConstants,
    /// Scene texture indices in slot order
    pub texture_indices: [usize; TEXTURE_SLOT_COUNT],
    pub binding: B::MaterialBinding,
}

impl<B: RenderBackend> std::fmt::Debug for Material<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("constants", &self.constants)
            .field("texture_indices", &self.texture_indices)
            .finish_non_exhaustive()
    }
}
