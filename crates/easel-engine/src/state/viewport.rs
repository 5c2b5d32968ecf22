use crate::error::InvalidArgument;

/// Framebuffer rectangle with a bottom-left origin, as used by viewports and
/// scissor boxes.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Builds a rect from signed host values, rejecting negative sizes.
    pub fn checked(x: i32, y: i32, width: i32, height: i32) -> Result<Self, InvalidArgument> {
        if width < 0 || height < 0 {
            return Err(InvalidArgument::NegativeSize { width, height });
        }
        Ok(Self::new(x, y, width as u32, height as u32))
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Flips into a top-left origin and clips against a `target_w`×`target_h`
    /// attachment, returning `(x, y, w, h)`.
    ///
    /// Returns `None` when nothing of the rect lies inside the target.
    pub fn to_top_left_clamped(self, target_w: u32, target_h: u32) -> Option<(u32, u32, u32, u32)> {
        let tw = i64::from(target_w);
        let th = i64::from(target_h);

        let left = i64::from(self.x);
        let right = left + i64::from(self.width);
        let top = th - (i64::from(self.y) + i64::from(self.height));
        let bottom = th - i64::from(self.y);

        let x0 = left.clamp(0, tw);
        let x1 = right.clamp(0, tw);
        let y0 = top.clamp(0, th);
        let y1 = bottom.clamp(0, th);

        let (w, h) = (x1 - x0, y1 - y0);
        if w <= 0 || h <= 0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, w as u32, h as u32))
    }

    /// Viewport usable on a `target_w`×`target_h` attachment, with the
    /// clip-space correction that keeps NDC spanning this whole rect.
    ///
    /// Returns `None` when nothing of the rect lies inside the target.
    pub fn fit_viewport(self, target_w: u32, target_h: u32) -> Option<ViewportFit> {
        let (x, y, width, height) = self.to_top_left_clamped(target_w, target_h)?;

        let hx = f64::from(self.x);
        let hy = f64::from(target_h) - (f64::from(self.y) + f64::from(self.height));
        let (hw, hh) = (f64::from(self.width), f64::from(self.height));
        let (cx, cy, cw, ch) = (f64::from(x), f64::from(y), f64::from(width), f64::from(height));

        Some(ViewportFit {
            x,
            y,
            width,
            height,
            scale: [(hw / cw) as f32, (hh / ch) as f32],
            // Clip y points up while framebuffer rows grow downward.
            offset: [
                ((2.0 * (hx - cx) + hw - cw) / cw) as f32,
                ((ch - hh - 2.0 * (hy - cy)) / ch) as f32,
            ],
        })
    }
}

/// Top-left origin viewport clipped to the attachment.
///
/// `clip.xy * scale + offset * clip.w` maps clip space for the requested rect
/// onto clip space for this one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportFit {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}
