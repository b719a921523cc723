//! A fake trace collaborator for driving the footprint builder in tests.
//!
//! `FakeTrace` plays the role of the replayer: it owns a toy state snapshot
//! the tests pre-register handles into, mirrors command-buffer recording so
//! it can report execution order for submits, and can be told to fail a
//! mutation or scramble the reported order.

use std::collections::HashMap;

use anyhow::{bail, Result};
use vk_footprint::prelude::*;

#[derive(Clone)]
enum RecordKind {
    Plain,
    Execute(Vec<vk::CommandBuffer>),
}

#[derive(Default)]
pub struct FakeTrace {
    pub images: HashMap<vk::Image, ImageInfo>,
    pub buffers: HashMap<vk::Buffer, BufferInfo>,
    pub views: HashMap<vk::ImageView, ImageViewInfo>,
    pub render_passes: HashMap<vk::RenderPass, RenderPassInfo>,
    pub framebuffers: HashMap<vk::Framebuffer, FramebufferInfo>,
    pub set_layouts: HashMap<vk::DescriptorSetLayout, DescriptorSetLayoutInfo>,
    pub memories: HashMap<vk::DeviceMemory, DeviceMemoryInfo>,
    pub last: Option<LastSubmission>,
    pub observed: Vec<MemoryObservation>,
    pub pending_sparse_binds: Vec<SparseBind>,
    pub fail_next_mutation: bool,
    pub scramble_execution: bool,
    records: HashMap<vk::CommandBuffer, Vec<RecordKind>>,
}

impl FakeTrace {
    pub fn new() -> Self {
        let _ = pretty_env_logger::try_init();
        Self::default()
    }

    pub fn add_image(&mut self, image: vk::Image, info: ImageInfo) {
        self.images.insert(image, info);
    }

    pub fn add_buffer(&mut self, buffer: vk::Buffer, size: u64) {
        self.buffers.insert(buffer, BufferInfo { size });
    }

    pub fn add_memory(&mut self, memory: vk::DeviceMemory, size: u64, coherent: bool) {
        self.memories.insert(
            memory,
            DeviceMemoryInfo {
                size,
                mapped: None,
                coherent,
            },
        );
    }

    /// Register a view covering the whole of `image`.
    pub fn add_full_view(&mut self, view: vk::ImageView, image: vk::Image) {
        self.views.insert(
            view,
            ImageViewInfo {
                image,
                range: vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: vk::REMAINING_MIP_LEVELS,
                    base_array_layer: 0,
                    layer_count: vk::REMAINING_ARRAY_LAYERS,
                },
                view_type: vk::ImageViewType::TYPE_2D,
            },
        );
    }

    /// Register a single-subpass render pass with one color attachment and a
    /// framebuffer for it.
    pub fn add_single_color_pass(
        &mut self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        view: vk::ImageView,
        extent: vk::Extent2D,
        load_op: vk::AttachmentLoadOp,
        store_op: vk::AttachmentStoreOp,
    ) {
        self.render_passes.insert(
            render_pass,
            RenderPassInfo {
                attachments: vec![AttachmentDesc {
                    load_op,
                    store_op,
                    stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                    stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                }],
                subpasses: vec![SubpassDesc {
                    input: vec![],
                    color: vec![Some(0)],
                    resolve: vec![],
                    depth_stencil: None,
                }],
            },
        );
        self.framebuffers.insert(
            framebuffer,
            FramebufferInfo {
                render_pass,
                attachments: vec![view],
                extent,
                layers: 1,
            },
        );
    }
}

/// A plain 2D color image of the given extent.
pub fn image_2d(width: u32, height: u32) -> ImageInfo {
    ImageInfo {
        format: vk::Format::R8G8B8A8_UNORM,
        extent: vk::Extent3D {
            width,
            height,
            depth: 1,
        },
        mip_levels: 1,
        array_layers: 1,
        aspects: vk::ImageAspectFlags::COLOR,
        byte_size: width as u64 * height as u64 * 4,
        is_sparse: false,
        sparse_requirements: vec![],
    }
}

impl StateSnapshot for FakeTrace {
    fn image(&self, image: vk::Image) -> Option<ImageInfo> {
        self.images.get(&image).cloned()
    }

    fn buffer(&self, buffer: vk::Buffer) -> Option<BufferInfo> {
        self.buffers.get(&buffer).copied()
    }

    fn image_view(&self, view: vk::ImageView) -> Option<ImageViewInfo> {
        self.views.get(&view).copied()
    }

    fn render_pass(&self, render_pass: vk::RenderPass) -> Option<RenderPassInfo> {
        self.render_passes.get(&render_pass).cloned()
    }

    fn framebuffer(&self, framebuffer: vk::Framebuffer) -> Option<FramebufferInfo> {
        self.framebuffers.get(&framebuffer).cloned()
    }

    fn descriptor_set_layout(
        &self,
        layout: vk::DescriptorSetLayout,
    ) -> Option<DescriptorSetLayoutInfo> {
        self.set_layouts.get(&layout).cloned()
    }

    fn device_memory(&self, memory: vk::DeviceMemory) -> Option<DeviceMemoryInfo> {
        self.memories.get(&memory).copied()
    }

    fn last_submission(&self) -> Option<LastSubmission> {
        self.last
    }
}

impl TraceContext for FakeTrace {
    fn mutate(
        &mut self,
        _id: CommandId,
        command: &Command,
        events: &mut MutationEvents,
    ) -> Result<()> {
        if std::mem::take(&mut self.fail_next_mutation) {
            bail!("forced mutation failure");
        }
        match command {
            Command::BeginCommandBuffer { buffer } | Command::ResetCommandBuffer { buffer } => {
                self.records.insert(*buffer, Vec::new());
            }
            Command::MapMemory {
                memory,
                offset,
                size,
            } => {
                if let Some(info) = self.memories.get_mut(memory) {
                    let size = if *size == vk::WHOLE_SIZE {
                        info.size - offset
                    } else {
                        *size
                    };
                    info.mapped = Some((*offset, size));
                }
            }
            Command::UnmapMemory { memory } => {
                if let Some(info) = self.memories.get_mut(memory) {
                    info.mapped = None;
                }
            }
            Command::CmdExecuteCommands {
                buffer,
                secondaries,
            } => {
                self.records
                    .entry(*buffer)
                    .or_default()
                    .push(RecordKind::Execute(secondaries.clone()));
            }
            Command::QueueBindSparse { .. } => {
                events.sparse_binds = std::mem::take(&mut self.pending_sparse_binds);
            }
            Command::QueueSubmit { submits, .. } => {
                let mut refs = Vec::new();
                for (submit_index, batch) in submits.iter().enumerate() {
                    for (command_buffer, cb) in batch.command_buffers.iter().enumerate() {
                        let records = self.records.get(cb).cloned().unwrap_or_default();
                        for (command, kind) in records.iter().enumerate() {
                            refs.push(SubcommandRef {
                                submit_index,
                                command_buffer,
                                command,
                                secondary: None,
                            });
                            if let RecordKind::Execute(secondaries) = kind {
                                for (sec_buffer, secondary) in secondaries.iter().enumerate() {
                                    let count = self
                                        .records
                                        .get(secondary)
                                        .map(|r| r.len())
                                        .unwrap_or(0);
                                    for sec_command in 0..count {
                                        refs.push(SubcommandRef {
                                            submit_index,
                                            command_buffer,
                                            command,
                                            secondary: Some((sec_buffer, sec_command)),
                                        });
                                    }
                                }
                            }
                        }
                    }
                }
                if self.scramble_execution {
                    refs.reverse();
                }
                events.executed = refs;
            }
            other => {
                if let Some(buffer) = other.recording_buffer() {
                    self.records
                        .entry(buffer)
                        .or_default()
                        .push(RecordKind::Plain);
                }
            }
        }
        Ok(())
    }

    fn observations(&self) -> &[MemoryObservation] {
        &self.observed
    }
}
