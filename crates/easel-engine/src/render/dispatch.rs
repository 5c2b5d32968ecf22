use crate::device::{DrawCall, Driver};
use crate::error::InvalidArgument;
use crate::numeric::Scalar;

use super::buffer::{ColorSpec, ColorStream, VertexBuffer};
use super::primitive::PrimitiveKind;

/// Client-side array state left behind by the last draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClientState<N> {
    pub vertex_array: bool,
    pub color_array: bool,
    /// Color applied when the color array is disabled.
    pub current_color: [N; 4],
}

impl<N: Scalar> Default for ClientState<N> {
    fn default() -> Self {
        Self {
            vertex_array: false,
            color_array: false,
            current_color: [N::ONE; 4],
        }
    }
}

/// Validates vertex/color buffers and issues one driver draw per call.
#[derive(Debug)]
pub struct Dispatcher<N> {
    client: ClientState<N>,
    draws: u64,
}

impl<N: Scalar> Default for Dispatcher<N> {
    fn default() -> Self {
        Self {
            client: ClientState::default(),
            draws: 0,
        }
    }
}

impl<N: Scalar> Dispatcher<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_state(&self) -> ClientState<N> {
        self.client
    }

    /// Draws issued since creation.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Draws every vertex in `vertices` as `kind`, in order from index 0.
    ///
    /// Shapes are checked up front; on error nothing reaches the driver and
    /// client state is untouched. The buffers are only borrowed for the
    /// duration of the call.
    pub fn draw<D>(
        &mut self,
        driver: &mut D,
        kind: PrimitiveKind,
        vertices: VertexBuffer<'_, N>,
        colors: ColorSpec<'_, N>,
    ) -> Result<(), InvalidArgument>
    where
        D: Driver<Scalar = N> + ?Sized,
    {
        vertices.check_vertices()?;
        let colors = colors.validate(vertices.count())?;

        self.client.vertex_array = true;
        match colors {
            ColorStream::PerVertex(_) => self.client.color_array = true,
            ColorStream::Uniform(rgba) => {
                self.client.color_array = false;
                self.client.current_color = rgba;
            }
        }

        driver.draw_arrays(DrawCall { kind, vertices, colors });
        self.draws += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DriverCall, RecordedColors, RecordedDraw, RecordingDriver};
    use crate::numeric::Fixed;
    use crate::render::Tuples;

    // ── valid draws ──────────────────────────────────────────────────────

    #[test]
    fn uniform_red_triangle_is_one_draw() {
        let mut d = RecordingDriver::<f64>::new();
        let mut disp = Dispatcher::new();
        let verts = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

        disp.draw(
            &mut d,
            PrimitiveKind::Triangles,
            Tuples::new(&verts, 2),
            ColorSpec::Uniform(&[1.0, 0.0, 0.0]),
        )
        .unwrap();

        assert_eq!(
            d.calls(),
            [DriverCall::Draw(RecordedDraw {
                kind: PrimitiveKind::Triangles,
                vertex_dim: 2,
                vertex_count: 3,
                colors: RecordedColors::Uniform([1.0, 0.0, 0.0, 1.0]),
            })]
        );
        let client = disp.client_state();
        assert!(client.vertex_array);
        assert!(!client.color_array);
        assert_eq!(client.current_color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn per_vertex_colors_enable_the_color_array() {
        let mut d = RecordingDriver::<Fixed>::new();
        let mut disp = Dispatcher::new();
        let verts = [Fixed::ZERO; 9];
        let colors = [Fixed::ONE; 12];

        disp.draw(
            &mut d,
            PrimitiveKind::LineLoop,
            Tuples::new(&verts, 3),
            ColorSpec::PerVertex(Tuples::new(&colors, 4)),
        )
        .unwrap();

        let draw = d.draws().next().unwrap();
        assert_eq!(draw.colors, RecordedColors::PerVertex { dim: 4, count: 3 });
        assert!(disp.client_state().color_array);
        assert_eq!(disp.client_state().current_color, [Fixed::ONE; 4]);
    }

    #[test]
    fn empty_buffer_still_reaches_the_driver() {
        let mut d = RecordingDriver::<f64>::new();
        let mut disp = Dispatcher::new();

        disp.draw(&mut d, PrimitiveKind::Points, Tuples::new(&[], 2), ColorSpec::Uniform(&[1.0; 4]))
            .unwrap();

        assert_eq!(d.draws().next().map(|d| d.vertex_count), Some(0));
        assert_eq!(disp.draws(), 1);
    }

    // ── rejected draws ───────────────────────────────────────────────────

    #[test]
    fn bad_vertex_dimension_issues_nothing() {
        let mut d = RecordingDriver::<f64>::new();
        let mut disp = Dispatcher::new();
        let verts = [0.0; 10];

        for dim in [0, 5] {
            assert_eq!(
                disp.draw(&mut d, PrimitiveKind::Lines, Tuples::new(&verts, dim), ColorSpec::Uniform(&[1.0; 3])),
                Err(InvalidArgument::VertexDimension(dim))
            );
        }
        assert!(d.calls().is_empty());
        assert_eq!(disp.client_state(), ClientState::default());
    }

    #[test]
    fn mismatched_color_count_issues_nothing() {
        let mut d = RecordingDriver::<f64>::new();
        let mut disp = Dispatcher::new();
        let verts = [0.0; 6];
        let colors = [1.0; 6];

        assert_eq!(
            disp.draw(
                &mut d,
                PrimitiveKind::Triangles,
                Tuples::new(&verts, 2),
                ColorSpec::PerVertex(Tuples::new(&colors, 3)),
            ),
            Err(InvalidArgument::ColorCount { vertices: 3, colors: 2 })
        );
        assert!(d.calls().is_empty());
        assert_eq!(disp.draws(), 0);
    }
}
