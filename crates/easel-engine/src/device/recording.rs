use std::collections::VecDeque;

use crate::error::DriverError;
use crate::numeric::Scalar;
use crate::render::{ColorStream, PrimitiveKind};
use crate::state::{Matrix4, MatrixMode, PixelRect};

use super::driver::{ClearBuffers, DrawCall, Driver};

/// Draw as the recording driver saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw<N> {
    pub kind: PrimitiveKind,
    pub vertex_dim: usize,
    pub vertex_count: usize,
    pub colors: RecordedColors<N>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedColors<N> {
    /// Color array enabled.
    PerVertex { dim: usize, count: usize },
    /// Color array disabled; current color set.
    Uniform([N; 4]),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall<N> {
    ClearColor([N; 4]),
    ClearDepth(N),
    Clear(ClearBuffers),
    Viewport(PixelRect),
    Scissor(Option<PixelRect>),
    DepthRange(N, N),
    LoadMatrix(MatrixMode, Matrix4<N>),
    Draw(RecordedDraw<N>),
    Resize(u32, u32),
    Present,
}

/// Driver that only records what it is asked to do.
///
/// Useful for headless hosts and for asserting on GPU traffic in tests.
#[derive(Debug)]
pub struct RecordingDriver<N> {
    calls: Vec<DriverCall<N>>,
    errors: VecDeque<DriverError>,
    size: (u32, u32),
}

impl<N> Default for RecordingDriver<N> {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            errors: VecDeque::new(),
            size: (0, 0),
        }
    }
}

impl<N: Scalar> RecordingDriver<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver whose targets start out `width`×`height`.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[DriverCall<N>] {
        &self.calls
    }

    pub fn forget_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&DriverCall<N>) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw<N>> {
        self.calls.iter().filter_map(|c| match c {
            DriverCall::Draw(d) => Some(d),
            _ => None,
        })
    }

    /// Makes the driver report `err` as if a call had failed.
    pub fn inject_error(&mut self, err: DriverError) {
        self.errors.push_back(err);
    }
}

impl<N: Scalar> Driver for RecordingDriver<N> {
    type Scalar = N;

    fn set_clear_color(&mut self, rgba: [N; 4]) {
        self.calls.push(DriverCall::ClearColor(rgba));
    }

    fn set_clear_depth(&mut self, depth: N) {
        self.calls.push(DriverCall::ClearDepth(depth));
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        self.calls.push(DriverCall::Clear(buffers));
    }

    fn set_viewport(&mut self, rect: PixelRect) {
        self.calls.push(DriverCall::Viewport(rect));
    }

    fn set_scissor(&mut self, rect: Option<PixelRect>) {
        self.calls.push(DriverCall::Scissor(rect));
    }

    fn set_depth_range(&mut self, near: N, far: N) {
        self.calls.push(DriverCall::DepthRange(near, far));
    }

    fn load_matrix(&mut self, mode: MatrixMode, matrix: &Matrix4<N>) {
        self.calls.push(DriverCall::LoadMatrix(mode, *matrix));
    }

    fn draw_arrays(&mut self, call: DrawCall<'_, N>) {
        let colors = match call.colors {
            ColorStream::PerVertex(buffer) => RecordedColors::PerVertex {
                dim: buffer.dim(),
                count: buffer.count(),
            },
            ColorStream::Uniform(rgba) => RecordedColors::Uniform(rgba),
        };
        self.calls.push(DriverCall::Draw(RecordedDraw {
            kind: call.kind,
            vertex_dim: call.vertices.dim(),
            vertex_count: call.vertices.count(),
            colors,
        }));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.calls.push(DriverCall::Resize(width, height));
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn present(&mut self) {
        self.calls.push(DriverCall::Present);
    }

    fn take_error(&mut self) -> Option<DriverError> {
        self.errors.pop_front()
    }
}
