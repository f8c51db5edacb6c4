// src/wgpu_utils/uniform_buffer.rs - Typed uniform, storage and readback buffers
use std::marker::PhantomData;

fn short_type_name<T>() -> &'static str {
    let type_name = std::any::type_name::<T>();
    match type_name.rfind(':') {
        Some(pos) => &type_name[(pos + 1)..],
        None => type_name,
    }
}

fn storage_usage(read_only: bool) -> wgpu::BufferUsages {
    if read_only {
        wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST
    } else {
        wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC
    }
}

/// Buffer holding exactly one `Content` value
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Create a new, zero-initialised uniform buffer
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", short_type_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: Vec::new(),
        }
    }

    /// Create buffer with initial data
    pub fn new_with_data(device: &wgpu::Device, label: &str, initial_content: &Content) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });

        buffer
            .slice(..)
            .get_mapped_range_mut()
            .copy_from_slice(bytemuck::bytes_of(initial_content));
        buffer.unmap();

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: bytemuck::bytes_of(initial_content).to_vec(),
        }
    }

    /// Update buffer content, skipping the write when nothing changed
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// Buffer holding a fixed number of `Content` elements
pub struct ArrayBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    len: usize,
}

impl<Content: bytemuck::Pod> ArrayBuffer<Content> {
    /// Uninitialised storage buffer with room for `capacity` elements
    pub fn new(device: &wgpu::Device, capacity: usize, read_only: bool) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("ArrayBuffer<{}>", short_type_name::<Content>())),
            size: (capacity * std::mem::size_of::<Content>()) as u64,
            usage: storage_usage(read_only),
            mapped_at_creation: false,
        });

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            len: capacity,
        }
    }

    /// Mappable buffer used as the destination of a GPU-to-CPU copy
    pub fn new_staging(device: &wgpu::Device, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("StagingBuffer<{}>", short_type_name::<Content>())),
            size: (capacity * std::mem::size_of::<Content>()) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            len: capacity,
        }
    }

    /// Storage buffer initialised from `data`
    pub fn new_with_data(device: &wgpu::Device, data: &[Content], read_only: bool) -> Self {
        Self::with_usage(
            device,
            &format!("ArrayBuffer<{}>", short_type_name::<Content>()),
            data,
            storage_usage(read_only),
        )
    }

    /// Buffer initialised from `data` with arbitrary usage, e.g. vertex or index data
    pub fn with_usage(
        device: &wgpu::Device,
        label: &str,
        data: &[Content],
        usage: wgpu::BufferUsages,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of_val(data) as u64,
            usage,
            mapped_at_creation: true,
        });

        buffer
            .slice(..)
            .get_mapped_range_mut()
            .copy_from_slice(bytemuck::cast_slice(data));
        buffer.unmap();

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            len: data.len(),
        }
    }

    /// Maps a staging buffer and copies its elements out, blocking until the GPU is done
    pub fn read_to_vec(&self, device: &wgpu::Device) -> Result<Vec<Content>, String> {
        let slice = self.buffer.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only goes away if the caller already gave up
            let _ = tx.send(result);
        });

        let _ = device.poll(wgpu::MaintainBase::Wait);

        match futures::executor::block_on(rx) {
            Ok(Ok(())) => {
                let mapped = slice.get_mapped_range();
                let result: Vec<Content> = bytemuck::cast_slice(&mapped).to_vec();
                drop(mapped);
                self.buffer.unmap();
                Ok(result)
            }
            Ok(Err(e)) => Err(format!("failed to map buffer: {}", e)),
            Err(_) => Err("buffer mapping was cancelled".to_string()),
        }
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size_in_bytes(&self) -> u64 {
        (self.len * std::mem::size_of::<Content>()) as u64
    }
}
