use std::fmt::Write;

/// Axis-aligned filled rectangle in surface units.
#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
}

/// Caller-owned drawing target that encoders populate in place.
pub trait VectorSurface {
    fn set_size(&mut self, width: f64, height: f64);
    fn clear(&mut self);
    fn push_rect(&mut self, rect: Rect);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgDocument {
    width: f64,
    height: f64,
    shapes: Vec<Rect>,
}

impl SvgDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn shapes(&self) -> &[Rect] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = String::with_capacity(64 + self.shapes.len() * 64);
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        for r in &self.shapes {
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                r.x, r.y, r.width, r.height, r.fill
            );
        }
        out.push_str("</svg>");
        out
    }
}

impl VectorSurface for SvgDocument {
    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) {
        self.shapes.clear();
    }

    fn push_rect(&mut self, rect: Rect) {
        self.shapes.push(rect);
    }
}
