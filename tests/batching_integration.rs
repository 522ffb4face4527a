//! End-to-end batching flows driven through the recording backend.

use cgmath::{Matrix4, Point3, Vector3};

use debugdraw::gpu::{BufferId, GpuCall, RecordingBackend, RenderTarget};
use debugdraw::renderer::{IndirectDrawIndexedCommand, INDIRECT_COMMAND_SIZE, INSTANCE_RECORD_SIZE};
use debugdraw::{
    Aabb, Camera, CastShadow, Color, DebugRenderer, DebugVertex, Geometry, OrthographicCamera,
    Pass, RendererConfig, Triangle,
};

/// Camera at the origin looking down +Z, fov 70, near 0.1, far 1000,
/// viewport 1280x720.
fn scenario_camera() -> Camera {
    let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), 70.0, 0.1, 1000.0, 1280, 720);
    camera.horizontal_angle = 0.0;
    camera.update();
    camera
}

fn overhead_light() -> OrthographicCamera {
    OrthographicCamera::new(
        Point3::new(0.0, 50.0, 10.0),
        Point3::new(0.0, 0.0, 10.0),
        30.0,
        1.0,
        100.0,
    )
}

/// Unit cube as a 12-triangle soup; indexifies to 8 vertices, 36 indices.
fn cube_soup() -> Vec<Triangle> {
    let corner = |x: f32, y: f32, z: f32| {
        DebugVertex::new([x, y, z], [0.0, 1.0, 0.0], [0.0, 0.0], Color::WHITE)
    };
    let c = [
        corner(-0.5, -0.5, -0.5),
        corner(0.5, -0.5, -0.5),
        corner(0.5, 0.5, -0.5),
        corner(-0.5, 0.5, -0.5),
        corner(-0.5, -0.5, 0.5),
        corner(0.5, -0.5, 0.5),
        corner(0.5, 0.5, 0.5),
        corner(-0.5, 0.5, 0.5),
    ];
    let quads: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [5, 4, 7, 6],
        [4, 0, 3, 7],
        [1, 5, 6, 2],
        [3, 2, 6, 7],
        [4, 5, 1, 0],
    ];
    quads
        .iter()
        .flat_map(|q| {
            [
                Triangle::new(c[q[0]], c[q[1]], c[q[2]]),
                Triangle::new(c[q[0]], c[q[2]], c[q[3]]),
            ]
        })
        .collect()
}

fn parse_commands(bytes: &[u8]) -> Vec<IndirectDrawIndexedCommand> {
    bytes
        .chunks_exact(INDIRECT_COMMAND_SIZE)
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

fn color_pass_multidraw(calls: &[GpuCall]) -> Option<(BufferId, u32)> {
    let mut in_screen_segment = false;
    for call in calls {
        match call {
            GpuCall::BindRenderTarget { target } => {
                in_screen_segment = *target == RenderTarget::Screen;
            }
            GpuCall::MultiDrawIndexedIndirect {
                commands,
                draw_count,
                ..
            } if in_screen_segment => return Some((*commands, *draw_count)),
            _ => {}
        }
    }
    None
}

#[test]
fn single_visible_box_issues_one_color_draw() {
    let mut renderer =
        DebugRenderer::new(RecordingBackend::new(), RendererConfig::default()).unwrap();

    let handle = renderer.create_geometry_from_triangles(&cube_soup()).unwrap();
    let registered_index_count = renderer.cache().record(handle).index_count;
    assert_eq!(registered_index_count, 36);
    assert_eq!(renderer.cache().record(handle).vertex_count, 8);

    let geometry = Geometry::single(handle);
    renderer.begin_frame(&scenario_camera(), &overhead_light());
    renderer.draw_geometry(
        Matrix4::from_translation(Vector3::new(0.0, 0.0, 10.0)),
        Aabb::from_center_half_extents(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.5, 0.5, 0.5)),
        1.0,
        Color::GREEN,
        &geometry,
        CastShadow::Off,
    );
    assert_eq!(renderer.batched(Pass::Color).len(), 1);
    assert!(renderer.batched(Pass::Depth).is_empty());

    let stats = renderer.end_frame().unwrap();
    assert_eq!(stats.color_draws, 1);
    assert_eq!(stats.depth_draws, 0);

    let calls = renderer.backend_mut().take_calls();
    let (command_buffer, draw_count) =
        color_pass_multidraw(&calls).expect("color pass issued no indirect draw");
    assert_eq!(draw_count, 1);

    let bytes = renderer
        .backend()
        .buffer_contents(command_buffer)
        .expect("command buffer is live");
    let commands = parse_commands(&bytes[..INDIRECT_COMMAND_SIZE]);
    assert_eq!(commands[0].index_count, registered_index_count);
    assert_eq!(commands[0].instance_count, 1);
    assert_eq!(commands[0].first_index, 0);
    assert_eq!(commands[0].base_vertex, 0);
    assert_eq!(commands[0].first_instance, 0);
}

#[test]
fn unchanged_handle_sequence_reuses_the_command_buffer() {
    let mut renderer =
        DebugRenderer::new(RecordingBackend::new(), RendererConfig::default()).unwrap();
    let handle = renderer.create_geometry_from_triangles(&cube_soup()).unwrap();
    let geometry = Geometry::single(handle);

    let camera = scenario_camera();
    let light = overhead_light();
    let bounds =
        Aabb::from_center_half_extents(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.5, 0.5, 0.5));

    // Frame 1: commands are built and uploaded.
    renderer.begin_frame(&camera, &light);
    renderer.draw_geometry(
        Matrix4::from_scale(1.0),
        bounds,
        1.0,
        Color::WHITE,
        &geometry,
        CastShadow::Off,
    );
    renderer.end_frame().unwrap();
    let calls = renderer.backend_mut().take_calls();
    let (command_buffer, _) = color_pass_multidraw(&calls).unwrap();
    assert!(calls
        .iter()
        .any(|c| matches!(c, GpuCall::WriteBuffer { id, .. } if *id == command_buffer)));

    // Frame 2: identical sequence; the command buffer is not rewritten,
    // and the geometry store is not re-uploaded either.
    renderer.begin_frame(&camera, &light);
    renderer.draw_geometry(
        Matrix4::from_scale(1.0),
        bounds,
        1.0,
        Color::WHITE,
        &geometry,
        CastShadow::Off,
    );
    renderer.end_frame().unwrap();
    let calls = renderer.backend_mut().take_calls();
    let (second_buffer, draw_count) = color_pass_multidraw(&calls).unwrap();
    assert_eq!(second_buffer, command_buffer);
    assert_eq!(draw_count, 1);
    assert!(!calls
        .iter()
        .any(|c| matches!(c, GpuCall::WriteBuffer { id, .. } if *id == command_buffer)));

    // Frame 3: a second entry changes the sequence; rebuild happens.
    renderer.begin_frame(&camera, &light);
    for _ in 0..2 {
        renderer.draw_geometry(
            Matrix4::from_scale(1.0),
            bounds,
            1.0,
            Color::WHITE,
            &geometry,
            CastShadow::Off,
        );
    }
    renderer.end_frame().unwrap();
    let calls = renderer.backend_mut().take_calls();
    let (_, draw_count) = color_pass_multidraw(&calls).unwrap();
    assert_eq!(draw_count, 2);
}

#[test]
fn instance_buffer_grows_with_load_and_never_shrinks() {
    let mut renderer =
        DebugRenderer::new(RecordingBackend::new(), RendererConfig::default()).unwrap();
    let handle = renderer.create_geometry_from_triangles(&cube_soup()).unwrap();
    let geometry = Geometry::single(handle);
    let camera = scenario_camera();
    let light = overhead_light();

    let mut last_capacity = 0u64;
    for count in [1usize, 8, 64, 8] {
        renderer.begin_frame(&camera, &light);
        for i in 0..count {
            let z = 5.0 + i as f32 * 0.25;
            renderer.draw_geometry(
                Matrix4::from_translation(Vector3::new(0.0, 0.0, z)),
                Aabb::from_center_half_extents(
                    Point3::new(0.0, 0.0, z),
                    Vector3::new(0.5, 0.5, 0.5),
                ),
                1.0,
                Color::WHITE,
                &geometry,
                CastShadow::Off,
            );
        }
        let stats = renderer.end_frame().unwrap();
        assert_eq!(stats.color_draws, count as u32);

        // The live instance buffer fits the frame and never shrank.
        let calls = renderer.backend_mut().take_calls();
        let required = (count * INSTANCE_RECORD_SIZE) as u64;
        let capacity = calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::BindStorageBuffer { id, .. } => renderer.backend().buffer_capacity(*id),
                _ => None,
            })
            .next_back()
            .expect("a storage buffer was bound");
        assert!(capacity >= required);
        assert!(capacity >= last_capacity);
        last_capacity = capacity;
    }
}

#[test]
fn empty_frame_still_clears_the_screen() {
    let mut renderer =
        DebugRenderer::new(RecordingBackend::new(), RendererConfig::default()).unwrap();
    renderer.begin_frame(&scenario_camera(), &overhead_light());
    let stats = renderer.end_frame().unwrap();
    assert_eq!(stats.color_draws, 0);
    assert_eq!(stats.depth_draws, 0);

    let calls = renderer.backend_mut().take_calls();
    assert!(calls
        .iter()
        .any(|c| matches!(c, GpuCall::Clear { target: RenderTarget::Screen })));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, GpuCall::MultiDrawIndexedIndirect { .. })));
    // The depth pass was skipped entirely.
    assert!(!calls
        .iter()
        .any(|c| matches!(c, GpuCall::BindRenderTarget { target: RenderTarget::ShadowDepth })));
}

#[test]
fn shadow_caster_feeds_both_passes_with_one_lod_resolution() {
    let mut renderer =
        DebugRenderer::new(RecordingBackend::new(), RendererConfig::default()).unwrap();
    let handle = renderer.create_geometry_from_triangles(&cube_soup()).unwrap();
    let geometry = Geometry::single(handle);

    renderer.begin_frame(&scenario_camera(), &overhead_light());
    renderer.draw_geometry(
        Matrix4::from_translation(Vector3::new(0.0, 0.0, 10.0)),
        Aabb::from_center_half_extents(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.5, 0.5, 0.5)),
        1.0,
        Color::WHITE,
        &geometry,
        CastShadow::On,
    );
    assert_eq!(renderer.batched(Pass::Depth), renderer.batched(Pass::Color));

    let stats = renderer.end_frame().unwrap();
    assert_eq!(stats.depth_draws, 1);
    assert_eq!(stats.color_draws, 1);

    // Depth pass precedes the color pass in the call stream.
    let calls = renderer.backend_mut().take_calls();
    let shadow_bind = calls
        .iter()
        .position(|c| matches!(c, GpuCall::BindRenderTarget { target: RenderTarget::ShadowDepth }))
        .expect("depth pass bound");
    let screen_bind = calls
        .iter()
        .position(|c| matches!(c, GpuCall::BindRenderTarget { target: RenderTarget::Screen }))
        .expect("color pass bound");
    assert!(shadow_bind < screen_bind);
}
