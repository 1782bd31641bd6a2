use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use renderer::{EdgeViewer, WgpuBackend};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::config::AppConfig;
use crate::source::{self, FrameSource};

/// Producer thread plus the channel that stops it.
struct Producer {
    shutdown: Sender<()>,
    handle: JoinHandle<u64>,
}

impl Producer {
    fn stop(self) {
        let _ = self.shutdown.send(());
        match self.handle.join() {
            Ok(published) => tracing::info!(published, "frame source joined"),
            Err(_) => tracing::error!("frame source thread panicked"),
        }
    }
}

/// Opens the viewer window and drives it until the user closes it.
pub fn run(config: AppConfig) -> Result<()> {
    let frame_source = FrameSource::from_config(&config.source)?;

    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(config.window.title.as_str())
        .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create viewer window: {err}"))?;
    let window = Arc::new(window);

    let size = window.inner_size();
    let backend = WgpuBackend::new(
        Arc::clone(&window),
        size.width,
        size.height,
        config.backend_options(),
    )?;
    tracing::info!(
        adapter = backend.adapter_name(),
        width = size.width,
        height = size.height,
        "gpu surface ready"
    );

    let (mut viewer, sink) = EdgeViewer::create(backend, config.viewer_config());
    if let Err(err) = viewer.on_surface_created() {
        tracing::warn!(error = %err, "render setup failed; the window will only be cleared");
    }
    let (width, height) = viewer
        .backend()
        .map(WgpuBackend::surface_size)
        .unwrap_or((size.width, size.height));
    viewer.on_surface_resized(width, height);

    let (shutdown, shutdown_rx) = bounded(1);
    let interval = source::interval_for(config.source.fps);
    let handle = source::spawn(frame_source, interval, sink, shutdown_rx)?;
    let mut producer = Some(Producer { shutdown, handle });
    tracing::info!(
        kind = ?config.source.kind,
        fps = config.source.fps,
        "frame source started"
    );

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::KeyboardInput { event, .. } if is_escape(&event) => elwt.exit(),
            WindowEvent::Resized(new_size) => {
                if let Some(backend) = viewer.backend_mut() {
                    backend.resize_surface(new_size.width, new_size.height);
                }
                viewer.on_surface_resized(new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => {
                let fps = viewer.on_draw_frame();
                tracing::trace!(fps, "frame drawn");
            }
            _ => {}
        },
        Event::AboutToWait => {
            window.request_redraw();
            elwt.set_control_flow(ControlFlow::Wait);
        }
        Event::LoopExiting => {
            if let Some(producer) = producer.take() {
                producer.stop();
            }
            let stats = viewer.exchange_stats();
            viewer.destroy();
            tracing::info!(
                published = stats.published,
                consumed = stats.consumed,
                replaced = stats.replaced,
                "viewer destroyed"
            );
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
}
