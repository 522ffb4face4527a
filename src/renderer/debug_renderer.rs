use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Point3, SquareMatrix, Vector4};

use crate::camera::{Camera, OrthographicCamera};
use crate::error::RenderResult;
use crate::geometry::{DebugVertex, Geometry, GeometryCache, GeometryHandle, Triangle};
use crate::gpu::{bindings, BufferKind, GpuBackend, Primitive, RenderTarget};
use crate::hooks::fatal_assert;
use crate::math::{Aabb, Color};
use crate::RendererConfig;

use super::commands::build_commands;
use super::frame_batch::{FrameBatch, Pass};
use super::growable::GrowableBuffer;
use super::instance::{InstanceRecord, INSTANCE_RECORD_SIZE};
use super::text::TextRecord;

/// Whether a submitted object writes into the shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastShadow {
    On,
    Off,
}

/// Vertex format of the non-indexed line/triangle paths: position plus
/// four color bytes, 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
}

/// Size of one [`LineVertex`] in bytes.
pub const LINE_VERTEX_SIZE: usize = std::mem::size_of::<LineVertex>();

/// What one frame submitted and drew.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameStats {
    pub depth_draws: u32,
    pub color_draws: u32,
    pub line_vertices: u32,
    pub triangle_vertices: u32,
}

/// Camera and shadow state frozen at `begin_frame`.
///
/// Culling for the whole frame reads this snapshot, so mutating the live
/// camera mid-frame cannot skew results between draw calls.
#[derive(Debug, Clone)]
struct FrameContext {
    camera: Camera,
    light_direction: cgmath::Vector3<f32>,
    shadow_distance: f32,
}

/// Frame-coherent debug-geometry renderer.
///
/// Accepts an unordered stream of lines, triangles, text and geometry
/// instances each frame, culls against the camera frustum (extended along
/// the light for shadow casters), and drains everything at `end_frame`
/// into two indirect multi-draw passes plus dedicated non-indexed draws.
///
/// Single-threaded by contract: one producer submits during the update
/// step, the same thread drains at the end of the frame.
pub struct DebugRenderer<B: GpuBackend> {
    backend: B,
    cache: GeometryCache,
    batches: [FrameBatch; 2],

    lines_data: Vec<u8>,
    triangles_data: Vec<u8>,
    pending_text: Vec<TextRecord>,

    lines_vbo: GrowableBuffer,
    triangles_vbo: GrowableBuffer,
    geometry_vbo: GrowableBuffer,
    geometry_ebo: GrowableBuffer,
    instance_buffers: [GrowableBuffer; 2],
    command_buffers: [GrowableBuffer; 2],

    frame: Option<FrameContext>,
    config: RendererConfig,
}

impl<B: GpuBackend> DebugRenderer<B> {
    pub fn new(mut backend: B, config: RendererConfig) -> RenderResult<Self> {
        let line_bytes = (config.initial_line_vertices * LINE_VERTEX_SIZE) as u64;
        let vertex_bytes = (config.initial_geometry_vertices
            * std::mem::size_of::<DebugVertex>()) as u64;
        let index_bytes = (config.initial_geometry_vertices * std::mem::size_of::<u32>()) as u64;

        let lines_vbo =
            GrowableBuffer::new(&mut backend, BufferKind::Vertex, line_bytes, "debug lines")?;
        let triangles_vbo = GrowableBuffer::new(
            &mut backend,
            BufferKind::Vertex,
            line_bytes,
            "debug triangles",
        )?;
        let geometry_vbo = GrowableBuffer::new(
            &mut backend,
            BufferKind::Vertex,
            vertex_bytes,
            "geometry vertices",
        )?;
        let geometry_ebo = GrowableBuffer::new(
            &mut backend,
            BufferKind::Index,
            index_bytes,
            "geometry indices",
        )?;

        let instance_buffers = [
            GrowableBuffer::new(
                &mut backend,
                BufferKind::Storage,
                INSTANCE_RECORD_SIZE as u64,
                "depth pass instances",
            )?,
            GrowableBuffer::new(
                &mut backend,
                BufferKind::Storage,
                INSTANCE_RECORD_SIZE as u64,
                "color pass instances",
            )?,
        ];
        let command_buffers = [
            GrowableBuffer::new(
                &mut backend,
                BufferKind::Indirect,
                super::commands::INDIRECT_COMMAND_SIZE as u64,
                "depth pass commands",
            )?,
            GrowableBuffer::new(
                &mut backend,
                BufferKind::Indirect,
                super::commands::INDIRECT_COMMAND_SIZE as u64,
                "color pass commands",
            )?,
        ];

        Ok(Self {
            backend,
            cache: GeometryCache::new(),
            batches: [FrameBatch::new(), FrameBatch::new()],
            lines_data: Vec::new(),
            triangles_data: Vec::new(),
            pending_text: Vec::new(),
            lines_vbo,
            triangles_vbo,
            geometry_vbo,
            geometry_ebo,
            instance_buffers,
            command_buffers,
            frame: None,
            config,
        })
    }

    /// Snapshot the camera and shadow parameters for this frame.
    ///
    /// Must be called after the camera's `update()` and before any draw
    /// submission; the frustum is read-only for the rest of the frame.
    pub fn begin_frame(&mut self, camera: &Camera, shadow_camera: &OrthographicCamera) {
        self.frame = Some(FrameContext {
            camera: camera.clone(),
            light_direction: shadow_camera.light_direction(),
            shadow_distance: shadow_camera.depth_range(),
        });
    }

    /// Queue a world-space line. Culled against the camera frustum by the
    /// segment's bounding box; submissions outside a frame are dropped.
    pub fn draw_line(&mut self, from: Point3<f32>, to: Point3<f32>, color: Color) {
        let Some(frame) = &self.frame else { return };

        let bounds = Aabb::new(
            Point3::new(from.x.min(to.x), from.y.min(to.y), from.z.min(to.z)),
            Point3::new(from.x.max(to.x), from.y.max(to.y), from.z.max(to.z)),
        );
        if !frame.camera.frustum().overlaps(&bounds) {
            return;
        }

        let color = color.to_bytes();
        for position in [from, to] {
            self.lines_data.extend_from_slice(bytemuck::bytes_of(&LineVertex {
                position: position.into(),
                color,
            }));
        }
    }

    /// Queue one unindexed triangle. No culling; callers either filtered
    /// already or the triangle is cheap enough to always draw.
    pub fn draw_triangle(
        &mut self,
        v1: Point3<f32>,
        v2: Point3<f32>,
        v3: Point3<f32>,
        color: Color,
    ) {
        let color = color.to_bytes();
        for position in [v1, v2, v3] {
            self.triangles_data
                .extend_from_slice(bytemuck::bytes_of(&LineVertex {
                    position: position.into(),
                    color,
                }));
        }
    }

    /// Queue screen-space text at a projected world position. Points
    /// behind the camera are silently dropped.
    pub fn draw_text(&mut self, position: Point3<f32>, text: &str, color: Color, height: f32) {
        let Some(frame) = &self.frame else { return };
        let Some((screen_position, clip_w)) = frame.camera.world_to_screen(position) else {
            return;
        };
        self.pending_text.push(TextRecord {
            text: text.to_owned(),
            world_position: position,
            screen_position,
            clip_w,
            height,
            color,
        });
    }

    /// Hand the queued text records to the text collaborator, clearing the
    /// queue. Call once per frame after submissions.
    pub fn take_pending_text(&mut self) -> Vec<TextRecord> {
        std::mem::take(&mut self.pending_text)
    }

    /// Intern an indexed geometry batch. `None` for empty input.
    pub fn create_geometry(
        &mut self,
        vertices: &[DebugVertex],
        indices: &[u32],
    ) -> Option<GeometryHandle> {
        self.cache.intern(vertices, indices)
    }

    /// Intern a triangle soup, deduplicating identical vertices.
    pub fn create_geometry_from_triangles(
        &mut self,
        triangles: &[Triangle],
    ) -> Option<GeometryHandle> {
        self.cache.intern_triangles(triangles)
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    /// Submit one geometry instance.
    ///
    /// Shadow casters are tested with their bounds extended along the
    /// light direction by the shadow camera's depth range: an object
    /// outside the view can still throw a visible shadow, so it is culled
    /// against the larger volume for the depth pass only. The color pass
    /// always tests the original bounds. The LOD is resolved at most once
    /// and reused by both passes; a pass whose resolution yields no level
    /// is skipped. Never an error.
    pub fn draw_geometry(
        &mut self,
        model: Matrix4<f32>,
        world_bounds: Aabb,
        lod_scale_sq: f32,
        color: Color,
        geometry: &Geometry,
        cast_shadow: CastShadow,
    ) {
        let Some(frame) = &self.frame else { return };
        let frustum = *frame.camera.frustum();
        let camera_position = frame.camera.position;
        let light_direction = frame.light_direction;
        let shadow_distance = frame.shadow_distance;

        let instance = InstanceRecord::new(model, color);
        let mut resolved: Option<Option<GeometryHandle>> = None;

        if cast_shadow == CastShadow::On {
            let shadow_volume =
                world_bounds.merge(&world_bounds.translated(light_direction * shadow_distance));
            if frustum.overlaps(&shadow_volume) {
                let handle = geometry.select(camera_position, &world_bounds, lod_scale_sq);
                resolved = Some(handle);
                if let Some(handle) = handle {
                    self.batches[Pass::Depth.index()].push(handle, &instance);
                }
            }
        }

        // The depth-pass outcome does not exempt the color pass from its
        // own, tighter test.
        if !frustum.overlaps(&world_bounds) {
            return;
        }

        let handle = match resolved {
            Some(handle) => handle,
            None => geometry.select(camera_position, &world_bounds, lod_scale_sq),
        };
        if let Some(handle) = handle {
            self.batches[Pass::Color.index()].push(handle, &instance);
        }
    }

    /// Draw the light-space volume as a 12-edge wireframe box.
    pub fn draw_frustum_outline(&mut self, view_projection: Matrix4<f32>, color: Color) {
        let Some(inverse) = view_projection.invert() else {
            return;
        };

        let mut corners = [Point3::new(0.0, 0.0, 0.0); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let x = if i & 1 == 0 { -1.0 } else { 1.0 };
            let y = if i & 2 == 0 { -1.0 } else { 1.0 };
            let z = if i & 4 == 0 { -1.0 } else { 1.0 };
            let world = inverse * Vector4::new(x, y, z, 1.0);
            *corner = Point3::new(world.x / world.w, world.y / world.w, world.z / world.w);
        }

        const EDGES: [(usize, usize); 12] = [
            (0, 1), (1, 3), (3, 2), (2, 0), // near quad
            (4, 5), (5, 7), (7, 6), (6, 4), // far quad
            (0, 4), (1, 5), (2, 6), (3, 7), // connecting edges
        ];
        for (a, b) in EDGES {
            self.draw_line(corners[a], corners[b], color);
        }
    }

    /// Drain the frame: upload what changed and issue the draws.
    ///
    /// Order matches submission: depth pass, color pass, unindexed
    /// triangles, lines. Batches are cleared afterwards; the geometry
    /// cache persists.
    pub fn end_frame(&mut self) -> RenderResult<FrameStats> {
        let mut stats = FrameStats::default();

        // Shared geometry store, only when new batches were interned.
        if self.cache.take_dirty() {
            self.geometry_vbo
                .upload(&mut self.backend, self.cache.vertex_bytes())?;
            self.geometry_ebo
                .upload(&mut self.backend, self.cache.index_bytes())?;
        }

        for pass in Pass::ALL {
            self.flush_pass(pass, &mut stats)?;
        }

        // Non-indexed paths share the already-bound screen target.
        if !self.triangles_data.is_empty() {
            let vertex_count = (self.triangles_data.len() / LINE_VERTEX_SIZE) as u32;
            self.triangles_vbo
                .upload(&mut self.backend, &self.triangles_data)?;
            self.backend
                .draw(Primitive::Triangles, self.triangles_vbo.id(), vertex_count)?;
            self.triangles_data.clear();
            stats.triangle_vertices = vertex_count;
        }

        if !self.lines_data.is_empty() {
            let vertex_count = (self.lines_data.len() / LINE_VERTEX_SIZE) as u32;
            self.lines_vbo.upload(&mut self.backend, &self.lines_data)?;
            self.backend
                .draw(Primitive::Lines, self.lines_vbo.id(), vertex_count)?;
            self.lines_data.clear();
            stats.line_vertices = vertex_count;
        }

        log::trace!(
            "[DebugRenderer] frame: {} depth draws, {} color draws, {} line vertices",
            stats.depth_draws,
            stats.color_draws,
            stats.line_vertices
        );
        Ok(stats)
    }

    fn flush_pass(&mut self, pass: Pass, stats: &mut FrameStats) -> RenderResult<()> {
        let i = pass.index();
        let (target, viewport) = match pass {
            Pass::Depth => (
                RenderTarget::ShadowDepth,
                (self.config.shadow_map_size, self.config.shadow_map_size),
            ),
            Pass::Color => (
                RenderTarget::Screen,
                (self.config.viewport_width, self.config.viewport_height),
            ),
        };

        if self.batches[i].is_empty() {
            self.batches[i].clear_pending();
            // The screen presents every frame; clear it even with nothing
            // batched so stale contents never show.
            if pass == Pass::Color {
                self.backend.bind_render_target(target);
                self.backend.set_viewport(viewport.0, viewport.1);
                self.backend.clear(target);
            }
            return Ok(());
        }

        self.instance_buffers[i]
            .upload(&mut self.backend, self.batches[i].instance_bytes())?;
        self.backend
            .bind_storage_buffer(self.instance_buffers[i].id(), bindings::INSTANCE_BUFFER)?;

        if self.batches[i].commands_dirty() {
            let commands = build_commands(&self.cache, self.batches[i].pending());
            let bytes: &[u8] = bytemuck::cast_slice(&commands);
            fatal_assert!(
                !bytes.is_empty(),
                "non-empty {:?} batch produced a zero-byte command buffer",
                pass
            );
            self.command_buffers[i].upload(&mut self.backend, bytes)?;
            log::trace!(
                "[DebugRenderer] rebuilt {} indirect commands for {:?}",
                commands.len(),
                pass
            );
        }

        self.backend.bind_render_target(target);
        self.backend.set_viewport(viewport.0, viewport.1);
        self.backend.clear(target);

        let draw_count = self.batches[i].len() as u32;
        self.backend.multi_draw_indexed_indirect(
            self.geometry_vbo.id(),
            self.geometry_ebo.id(),
            self.command_buffers[i].id(),
            draw_count,
        )?;

        match pass {
            Pass::Depth => stats.depth_draws = draw_count,
            Pass::Color => stats.color_draws = draw_count,
        }

        self.batches[i].mark_issued();
        self.batches[i].clear_pending();
        Ok(())
    }

    /// Entries currently batched for a pass (pending, this frame).
    pub fn batched(&self, pass: Pass) -> &[GeometryHandle] {
        self.batches[pass.index()].pending()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Lod;
    use crate::gpu::RecordingBackend;
    use cgmath::Vector3;

    fn renderer() -> DebugRenderer<RecordingBackend> {
        DebugRenderer::new(RecordingBackend::new(), RendererConfig::default()).unwrap()
    }

    /// Camera at origin looking down +Z (the default pose looks down -Z).
    fn camera_forward_z() -> Camera {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), 70.0, 0.1, 1000.0, 1280, 720);
        camera.horizontal_angle = 0.0;
        camera.update();
        camera
    }

    /// Light high up on +Y shining straight down.
    fn shadow_camera_overhead() -> OrthographicCamera {
        OrthographicCamera::new(
            Point3::new(0.0, 50.0, 10.0),
            Point3::new(0.0, 0.0, 10.0),
            30.0,
            1.0,
            100.0,
        )
    }

    fn unit_box_geometry(renderer: &mut DebugRenderer<RecordingBackend>) -> Geometry {
        let v = |p: [f32; 3]| DebugVertex::new(p, [0.0, 1.0, 0.0], [0.0, 0.0], Color::WHITE);
        let handle = renderer
            .create_geometry_from_triangles(&[
                Triangle::new(v([-0.5, -0.5, -0.5]), v([0.5, -0.5, -0.5]), v([0.5, 0.5, -0.5])),
                Triangle::new(v([-0.5, -0.5, -0.5]), v([0.5, 0.5, -0.5]), v([-0.5, 0.5, -0.5])),
            ])
            .unwrap();
        Geometry::single(handle)
    }

    fn box_bounds(center: Point3<f32>) -> Aabb {
        Aabb::from_center_half_extents(center, Vector3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn visible_geometry_lands_in_the_color_pass() {
        let mut renderer = renderer();
        let geometry = unit_box_geometry(&mut renderer);
        renderer.begin_frame(&camera_forward_z(), &shadow_camera_overhead());

        renderer.draw_geometry(
            Matrix4::from_scale(1.0),
            box_bounds(Point3::new(0.0, 0.0, 10.0)),
            1.0,
            Color::WHITE,
            &geometry,
            CastShadow::Off,
        );
        assert_eq!(renderer.batched(Pass::Color).len(), 1);
        assert_eq!(renderer.batched(Pass::Depth).len(), 0);
    }

    #[test]
    fn out_of_frustum_geometry_produces_no_entries() {
        let mut renderer = renderer();
        let geometry = unit_box_geometry(&mut renderer);
        renderer.begin_frame(&camera_forward_z(), &shadow_camera_overhead());

        renderer.draw_geometry(
            Matrix4::from_scale(1.0),
            box_bounds(Point3::new(0.0, 0.0, -10.0)),
            1.0,
            Color::WHITE,
            &geometry,
            CastShadow::Off,
        );
        assert!(renderer.batched(Pass::Color).is_empty());
        assert!(renderer.batched(Pass::Depth).is_empty());
    }

    #[test]
    fn shadow_only_visibility_feeds_depth_pass_alone() {
        let mut renderer = renderer();
        let geometry = unit_box_geometry(&mut renderer);
        // Light pointing along +Z: the swept shadow volume of an object
        // behind the near plane reaches into the view.
        let shadow_camera = OrthographicCamera::new(
            Point3::new(0.0, 0.0, -60.0),
            Point3::new(0.0, 0.0, 10.0),
            30.0,
            1.0,
            100.0,
        );
        renderer.begin_frame(&camera_forward_z(), &shadow_camera);

        // Just behind the camera: outside the frustum, but its shadow
        // sweeps 99 units down +Z, straight through the view volume.
        let bounds = box_bounds(Point3::new(0.0, 0.0, -2.0));
        renderer.draw_geometry(
            Matrix4::from_scale(1.0),
            bounds,
            1.0,
            Color::WHITE,
            &geometry,
            CastShadow::On,
        );
        assert_eq!(renderer.batched(Pass::Depth).len(), 1);
        assert!(renderer.batched(Pass::Color).is_empty());
    }

    #[test]
    fn shadow_casting_does_not_shrink_color_visibility() {
        let mut renderer = renderer();
        let geometry = unit_box_geometry(&mut renderer);
        renderer.begin_frame(&camera_forward_z(), &shadow_camera_overhead());

        renderer.draw_geometry(
            Matrix4::from_scale(1.0),
            box_bounds(Point3::new(0.0, 0.0, 10.0)),
            1.0,
            Color::WHITE,
            &geometry,
            CastShadow::On,
        );
        assert_eq!(renderer.batched(Pass::Depth).len(), 1);
        assert_eq!(renderer.batched(Pass::Color).len(), 1);
    }

    #[test]
    fn no_lod_skips_both_passes() {
        let mut renderer = renderer();
        let geometry = unit_box_geometry(&mut renderer);
        // Only LOD drops out past 5 units.
        let geometry = Geometry::new(vec![Lod {
            handle: geometry.lods[0].handle,
            distance: 5.0,
        }]);
        renderer.begin_frame(&camera_forward_z(), &shadow_camera_overhead());

        renderer.draw_geometry(
            Matrix4::from_scale(1.0),
            box_bounds(Point3::new(0.0, 0.0, 50.0)),
            1.0,
            Color::WHITE,
            &geometry,
            CastShadow::On,
        );
        assert!(renderer.batched(Pass::Depth).is_empty());
        assert!(renderer.batched(Pass::Color).is_empty());
    }

    #[test]
    fn lines_cull_against_the_frustum() {
        let mut renderer = renderer();
        renderer.begin_frame(&camera_forward_z(), &shadow_camera_overhead());

        renderer.draw_line(
            Point3::new(-1.0, 0.0, 10.0),
            Point3::new(1.0, 0.0, 10.0),
            Color::RED,
        );
        renderer.draw_line(
            Point3::new(-1.0, 0.0, -10.0),
            Point3::new(1.0, 0.0, -10.0),
            Color::RED,
        );
        // One visible segment, two vertices.
        let stats = renderer.end_frame().unwrap();
        assert_eq!(stats.line_vertices, 2);
    }

    #[test]
    fn text_behind_camera_is_dropped() {
        let mut renderer = renderer();
        renderer.begin_frame(&camera_forward_z(), &shadow_camera_overhead());

        renderer.draw_text(Point3::new(0.0, 0.0, 5.0), "visible", Color::WHITE, 0.5);
        renderer.draw_text(Point3::new(0.0, 0.0, -5.0), "dropped", Color::WHITE, 0.5);

        let records = renderer.take_pending_text();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "visible");
        assert!((records[0].clip_w - 5.0).abs() < 1e-3);
        assert!(renderer.take_pending_text().is_empty());
    }

    #[test]
    fn submissions_outside_a_frame_are_dropped() {
        let mut renderer = renderer();
        let geometry = unit_box_geometry(&mut renderer);
        renderer.draw_line(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Color::RED);
        renderer.draw_geometry(
            Matrix4::from_scale(1.0),
            box_bounds(Point3::new(0.0, 0.0, 10.0)),
            1.0,
            Color::WHITE,
            &geometry,
            CastShadow::Off,
        );
        assert!(renderer.batched(Pass::Color).is_empty());
        assert!(renderer.lines_data.is_empty());
    }

    #[test]
    fn frustum_outline_queues_twelve_edges() {
        let mut renderer = renderer();
        renderer.begin_frame(&camera_forward_z(), &shadow_camera_overhead());

        // A volume straight ahead of the camera; all 12 edges visible.
        let shadow_camera = OrthographicCamera::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 15.0),
            2.0,
            1.0,
            10.0,
        );
        renderer.draw_frustum_outline(shadow_camera.light_space(), Color::YELLOW);
        assert_eq!(renderer.lines_data.len(), 24 * LINE_VERTEX_SIZE);
    }
}
