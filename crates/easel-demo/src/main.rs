use anyhow::{Context, Result};

use easel_engine::backend::{ActiveBackend, Backend};
use easel_engine::input::InputEvent;
use easel_engine::logging::{init_logging, LoggingConfig};
use easel_engine::numeric::Scalar;
use easel_engine::render::{ColorSpec, PrimitiveKind, Tuples};
use easel_engine::surface::{Session, SurfaceConfig};

type N = <ActiveBackend as Backend>::Scalar;

fn n(v: f32) -> N {
    N::from_f32(v)
}

/// Orthographic projection mapping `[-aspect, aspect] x [-1, 1]` to clip space.
fn projection(width: u32, height: u32, zoom: f32) -> Vec<N> {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    let (sx, sy) = (zoom / aspect, zoom);
    [sx, 0.0, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        .into_iter()
        .map(n)
        .collect()
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut session = Session::<ActiveBackend>::new();
    session
        .open_with(SurfaceConfig::default().with_title("easel demo").with_multisample(true))
        .context("failed to open the demo surface")?;

    let fan: Vec<N> = [0.0, 0.0, -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, 0.5].into_iter().map(n).collect();
    let fan_colors: Vec<N> = [
        1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0,
    ]
    .into_iter()
    .map(n)
    .collect();
    let outline: Vec<N> = [-0.8, -0.8, 0.8, -0.8, 0.8, 0.8, -0.8, 0.8].into_iter().map(n).collect();

    let (mut width, mut height) = session.window_size().unwrap_or((800, 480));
    let mut zoom = 1.0f32;
    let mut highlight = false;

    session.set_projection_matrix(&projection(width, height, zoom))?;
    session.set_clear_color(n(0.08), n(0.08), n(0.1), n(1.0))?;

    while !session.close_requested() {
        while let Some(ev) = session.poll_event(false) {
            match ev {
                InputEvent::Resize { width: w, height: h } => {
                    (width, height) = (w, h);
                    session.set_viewport(0, 0, w as i32, h as i32)?;
                }
                InputEvent::Zoom { .. } => zoom *= 1.1,
                InputEvent::Unzoom { .. } => zoom /= 1.1,
                InputEvent::Click { .. } => highlight = true,
                InputEvent::Unclick { .. } => highlight = false,
                InputEvent::Move { .. } => {}
            }
        }

        session.set_projection_matrix(&projection(width, height, zoom))?;
        session.clear(true, false)?;
        session.draw(
            PrimitiveKind::TriangleFan,
            Tuples::new(&fan, 2),
            ColorSpec::PerVertex(Tuples::new(&fan_colors, 3)),
        )?;

        let edge = if highlight { [n(1.0), n(0.8), n(0.0)] } else { [n(0.6), n(0.6), n(0.6)] };
        session.draw(PrimitiveKind::LineLoop, Tuples::new(&outline, 2), ColorSpec::Uniform(&edge))?;
        session.swap_buffers()?;

        if let Some(err) = session.take_driver_error()? {
            log::warn!("frame reported {err}");
        }
    }

    session.close()?;
    Ok(())
}
