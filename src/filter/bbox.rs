/// Bounding box in normalized image coordinates.
///
/// All four edges are expressed as fractions of the frame size, so a box
/// covering the whole frame is `(0.0, 0.0, 1.0, 1.0)`. On the wire a box is a
/// plain `[xmin, ymin, xmax, ymax]` array.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    /// Left edge
    pub xmin: f32,
    /// Top edge
    pub ymin: f32,
    /// Right edge
    pub xmax: f32,
    /// Bottom edge
    pub ymax: f32,
}

impl BBox {
    /// Create a box from its edges (TLBR order).
    #[inline]
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Convert to TLBR format: (xmin, ymin, xmax, ymax).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }

    /// Get the center point in normalized coordinates.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        ((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }

    /// Get the center point in pixels for a frame of the given size.
    ///
    /// Fractional pixels are truncated toward zero, so a center slightly left
    /// of the frame still lands on column 0.
    #[inline]
    pub fn pixel_center(&self, width: u32, height: u32) -> (i32, i32) {
        let (cx, cy) = self.center();
        ((cx * width as f32) as i32, (cy * height as f32) as i32)
    }
}

impl From<[f32; 4]> for BBox {
    fn from(tlbr: [f32; 4]) -> Self {
        Self::new(tlbr[0], tlbr[1], tlbr[2], tlbr[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(bbox: BBox) -> Self {
        bbox.to_tlbr()
    }
}
