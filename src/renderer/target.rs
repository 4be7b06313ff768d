//! Render targets and attachment bookkeeping
//!
//! A [`RenderTarget`] owns a fixed-size set of color attachments, an
//! optional depth attachment, and the draw-buffer slot list that fixes
//! which attachments the fragment stage writes to. Targets are assembled
//! during pipeline setup only (no live resize: a size change is a full
//! pipeline re-initialization) and validated before first use.
//!
//! The pure layout/validation core lives in [`TargetLayout`] so completeness
//! rules can be tested without a GPU device.
//!
//! # Completeness
//!
//! [`RenderTarget::is_complete`] must be checked after setup; a `false`
//! result is a fatal initialization error; the pipeline cannot proceed
//! with an incomplete target. Rendering before [`set_draw_buffers`]
//! (`RenderTarget::set_draw_buffers`) is a caller contract violation,
//! asserted in debug builds.
//!
//! # Ownership
//!
//! Attachments created by `add_color_attachment` are owned by the target
//! and released with it. Attachments passed in through
//! `add_external_color_attachment` stay owned by the caller (the target
//! only holds a view). The SSAO buffers use this path because their
//! single-channel format is configured by the pass that samples them.

use smallvec::SmallVec;

use crate::renderer::context::GpuContext;
use crate::renderer::texture::{self, DEPTH_BUFFER_FORMAT, DEPTH_TEXTURE_FORMAT, HDR_FORMAT};
use crate::renderer::tracked::Tracked;

/// Kind of depth attachment a target carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthKind {
    /// Non-sampleable combined depth/stencil buffer at the target's size.
    Buffer,
    /// Sampleable depth texture, possibly at a resolution decoupled from
    /// the color size (shadow maps).
    Texture { width: u32, height: u32 },
}

/// Metadata for one color slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSlot {
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    /// Whether the backing texture is caller-owned.
    pub external: bool,
}

/// Pure attachment layout: everything completeness validation needs,
/// nothing GPU-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    pub width: u32,
    pub height: u32,
    pub colors: SmallVec<[ColorSlot; 4]>,
    pub depth: Option<DepthKind>,
    /// Attachment indices the fragment stage writes to, fixed by
    /// [`TargetLayout::set_draw_buffers`]. `None` until then.
    pub draw_buffers: Option<SmallVec<[u32; 4]>>,
}

impl TargetLayout {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            colors: SmallVec::new(),
            depth: None,
            draw_buffers: None,
        }
    }

    /// Fixes the draw-buffer list to all current color slots, in order.
    /// Must be called once, after all color attachments are added.
    pub fn set_draw_buffers(&mut self) {
        self.draw_buffers = Some((0..self.colors.len() as u32).collect());
    }

    /// Validates completeness.
    ///
    /// Rules:
    /// - at least one attachment (color or depth)
    /// - if any color slots exist, the draw-buffer list must be set, match
    ///   the slot count, and contain only in-range, distinct indices
    /// - every color slot matches the target size
    /// - `depth_required` implies a depth attachment is present
    pub fn validate(&self, depth_required: bool) -> Result<(), String> {
        if self.colors.is_empty() && self.depth.is_none() {
            return Err("no attachments".into());
        }

        if !self.colors.is_empty() {
            let Some(draw_buffers) = &self.draw_buffers else {
                return Err("set_draw_buffers() was never called".into());
            };
            if draw_buffers.len() != self.colors.len() {
                return Err(format!(
                    "draw-buffer count {} does not match color attachment count {}",
                    draw_buffers.len(),
                    self.colors.len()
                ));
            }
            let mut seen: SmallVec<[u32; 4]> = SmallVec::new();
            for &slot in draw_buffers {
                if slot as usize >= self.colors.len() {
                    return Err(format!("draw-buffer index {slot} out of range"));
                }
                if seen.contains(&slot) {
                    return Err(format!("draw-buffer index {slot} repeated"));
                }
                seen.push(slot);
            }
        }

        for (i, color) in self.colors.iter().enumerate() {
            if color.width != self.width || color.height != self.height {
                return Err(format!(
                    "color attachment {i} is {}x{}, target is {}x{}",
                    color.width, color.height, self.width, self.height
                ));
            }
        }

        if depth_required && self.depth.is_none() {
            return Err("depth attachment required but missing".into());
        }

        Ok(())
    }
}

struct ColorAttachment {
    view: Tracked<wgpu::TextureView>,
    #[allow(dead_code)]
    owned: bool,
}

/// A framebuffer-equivalent: layout plus the backing GPU attachments.
pub struct RenderTarget {
    label: &'static str,
    layout: TargetLayout,
    colors: SmallVec<[ColorAttachment; 4]>,
    depth_view: Option<Tracked<wgpu::TextureView>>,
    depth_required: bool,
}

impl RenderTarget {
    /// Allocates an empty target of fixed size.
    #[must_use]
    pub fn create(label: &'static str, width: u32, height: u32) -> Self {
        Self {
            label,
            layout: TargetLayout::new(width, height),
            colors: SmallVec::new(),
            depth_view: None,
            depth_required: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    #[inline]
    #[must_use]
    pub fn layout(&self) -> &TargetLayout {
        &self.layout
    }

    /// Allocates and attaches an owned HDR (`Rgba16Float`) color texture at
    /// the next free slot. Sampling policy for consumers is nearest
    /// filtering with edge clamping.
    pub fn add_color_attachment(&mut self, gpu: &GpuContext) {
        self.add_color_attachment_with_format(gpu, HDR_FORMAT);
    }

    /// Allocates and attaches an owned color texture of an explicit format.
    pub fn add_color_attachment_with_format(
        &mut self,
        gpu: &GpuContext,
        format: wgpu::TextureFormat,
    ) {
        let (_, view) = texture::create_texture_2d(
            &gpu.device,
            (self.layout.width, self.layout.height),
            format,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            1,
            self.label,
        );
        self.layout.colors.push(ColorSlot {
            format,
            width: self.layout.width,
            height: self.layout.height,
            external: false,
        });
        self.colors.push(ColorAttachment {
            view: Tracked::new(view),
            owned: true,
        });
    }

    /// Attaches a caller-owned texture at the next slot. The texture is not
    /// released with the target.
    pub fn add_external_color_attachment(
        &mut self,
        view: Tracked<wgpu::TextureView>,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) {
        self.layout.colors.push(ColorSlot {
            format,
            width,
            height,
            external: true,
        });
        self.colors.push(ColorAttachment { view, owned: false });
    }

    /// Attaches a non-sampleable combined depth/stencil buffer at the
    /// target's size, for passes that depth-test but never read depth back.
    pub fn add_depth_buffer(&mut self, gpu: &GpuContext) {
        let (_, view) = texture::create_texture_2d(
            &gpu.device,
            (self.layout.width, self.layout.height),
            DEPTH_BUFFER_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            1,
            self.label,
        );
        self.layout.depth = Some(DepthKind::Buffer);
        self.depth_view = Some(Tracked::new(view));
    }

    /// Attaches a sampleable depth texture whose resolution is decoupled
    /// from the color size (shadow maps).
    pub fn add_depth_texture(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        let (_, view) = texture::create_texture_2d(
            &gpu.device,
            (width, height),
            DEPTH_TEXTURE_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            1,
            self.label,
        );
        self.layout.depth = Some(DepthKind::Texture { width, height });
        self.depth_view = Some(Tracked::new(view));
    }

    /// Fixes the draw-buffer list. Call once, after all color attachments.
    pub fn set_draw_buffers(&mut self) {
        self.layout.set_draw_buffers();
    }

    /// Marks that this target's consumers require depth testing, which
    /// makes [`is_complete`](Self::is_complete) demand a depth attachment.
    pub fn require_depth(&mut self) {
        self.depth_required = true;
    }

    /// Validates completeness. A `false` result at init time is fatal.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.layout.validate(self.depth_required).is_ok()
    }

    /// Completeness with the failing rule, for error reporting.
    pub fn completeness(&self) -> Result<(), String> {
        self.layout.validate(self.depth_required)
    }

    /// View of one color attachment.
    #[must_use]
    pub fn color_view(&self, index: usize) -> &Tracked<wgpu::TextureView> {
        &self.colors[index].view
    }

    /// View of the depth attachment, if any.
    #[must_use]
    pub fn depth_view(&self) -> Option<&Tracked<wgpu::TextureView>> {
        self.depth_view.as_ref()
    }

    /// Builds the color attachment list for a render pass, honoring the
    /// draw-buffer order.
    ///
    /// Rendering without [`set_draw_buffers`](Self::set_draw_buffers) is a
    /// caller error; output would be undefined, so debug builds assert.
    #[must_use]
    pub fn color_attachments(
        &self,
        load: wgpu::LoadOp<wgpu::Color>,
    ) -> SmallVec<[Option<wgpu::RenderPassColorAttachment<'_>>; 4]> {
        debug_assert!(
            self.layout.colors.is_empty() || self.layout.draw_buffers.is_some(),
            "RenderTarget '{}': rendering before set_draw_buffers()",
            self.label
        );
        let order: SmallVec<[u32; 4]> = self
            .layout
            .draw_buffers
            .clone()
            .unwrap_or_else(|| (0..self.colors.len() as u32).collect());
        order
            .into_iter()
            .map(|slot| {
                Some(wgpu::RenderPassColorAttachment {
                    view: &self.colors[slot as usize].view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect()
    }

    /// Builds the depth attachment descriptor for a render pass.
    #[must_use]
    pub fn depth_attachment(
        &self,
        load: wgpu::LoadOp<f32>,
    ) -> Option<wgpu::RenderPassDepthStencilAttachment<'_>> {
        // Combined depth/stencil buffers need stencil ops even when unused.
        let stencil_ops = match self.layout.depth {
            Some(DepthKind::Buffer) => Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(0),
                store: wgpu::StoreOp::Store,
            }),
            _ => None,
        };
        self.depth_view
            .as_ref()
            .map(move |view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops,
            })
    }

    /// Depth format of the current depth attachment, if any.
    #[must_use]
    pub fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        self.layout.depth.map(|kind| match kind {
            DepthKind::Buffer => DEPTH_BUFFER_FORMAT,
            DepthKind::Texture { .. } => DEPTH_TEXTURE_FORMAT,
        })
    }
}
