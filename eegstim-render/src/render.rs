use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use bytemuck::{cast_slice, cast_slice_mut};
use eegstim_core::{BACKGROUND, Line};
use eegstim_timing::{HighPrecisionTimer, Timer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};
use tracing::debug;

/// Space between stacked lines, as a fraction of the canvas height.
const LINE_GAP: f32 = 0.025;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot read font {path}: {source}")]
    FontIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid font data: {0}")]
    InvalidFont(#[from] ab_glyph::InvalidFont),

    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
}

/// Rasterises one line of text into a transparent, premultiplied pixmap sized to the line
/// box (advance width by ascent-to-descent height).
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: [u8; 4],
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // 1) Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = sf.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let w = pen_x.ceil().max(1.0) as u32;
    let h = (sf.ascent() - sf.descent()).ceil().max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    // 2) Rasterise with premultiplied alpha blending
    let stride = w as usize;
    let dst = pm.pixels_mut();
    for g in glyphs {
        let Some(out) = font.outline_glyph(g) else {
            continue;
        };
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x).floor() as i32;
            let iy = (y as f32 + b.min.y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Premultiply source by (coverage * alpha)
            let a_lin = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let premul = |c: u8| ((c as f32 * a_lin) as u8).min(sa);
            let bg = dst[i];

            // Porter-Duff over: out = src + bg * (1 - src.a)
            let inv = 1.0 - (sa as f32 / 255.0);
            let over = |s: u8, d: u8| s.saturating_add((d as f32 * inv) as u8);
            let alpha = over(sa, bg.alpha());
            let red = over(premul(color[0]), bg.red()).min(alpha);
            let green = over(premul(color[1]), bg.green()).min(alpha);
            let blue = over(premul(color[2]), bg.blue()).min(alpha);

            if let Some(px) = PremultipliedColorU8::from_rgba(red, green, blue, alpha) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Draws `src` onto `canvas` with its top-left corner at (`x`, `y`), clipping at the canvas
/// edges. Both pixmaps are premultiplied. Returns whether anything was drawn.
pub fn blit_premultiplied(canvas: &mut Pixmap, src: &Pixmap, x: i32, y: i32) -> bool {
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    let (w, h) = (src.width() as i32, src.height() as i32);

    // Cull fully off-screen
    if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
        return false;
    }

    let dst_x = x.max(0);
    let dst_y = y.max(0);
    let src_x = dst_x - x;
    let src_y = dst_y - y;
    let copy_w = (w - src_x).min(cw - dst_x) as usize;
    let copy_h = (h - src_y).min(ch - dst_y) as usize;

    let src_stride = src.width() as usize;
    let dst_stride = canvas.width() as usize;
    let src_px: &[[u8; 4]] = cast_slice(src.data());
    let dst_px: &mut [[u8; 4]] = cast_slice_mut(canvas.data_mut());

    for row in 0..copy_h {
        let s0 = (src_y as usize + row) * src_stride + src_x as usize;
        let d0 = (dst_y as usize + row) * dst_stride + dst_x as usize;
        let src_row = &src_px[s0..s0 + copy_w];
        let dst_row = &mut dst_px[d0..d0 + copy_w];

        if src_row.iter().all(|p| p[3] == 255) {
            dst_row.copy_from_slice(src_row);
            continue;
        }
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            let inv = 255 - s[3] as u32;
            for c in 0..4 {
                let v = s[c] as u32 + (d[c] as u32 * inv + 127) / 255;
                d[c] = v.min(255) as u8;
            }
        }
    }
    true
}

/// Top-left corners for a vertically centred, horizontally centred stack of boxes.
pub fn stack_layout(sizes: &[(u32, u32)], width: u32, height: u32, gap: u32) -> Vec<(i32, i32)> {
    let gaps = gap * sizes.len().saturating_sub(1) as u32;
    let total = sizes.iter().map(|s| s.1).sum::<u32>() + gaps;
    let mut y = (height as i32 - total as i32) / 2;
    sizes
        .iter()
        .map(|&(w, h)| {
            let pos = ((width as i32 - w as i32) / 2, y);
            y += (h + gap) as i32;
            pos
        })
        .collect()
}

pub struct FrameStats {
    pub layout: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub lines: usize,
}

/// Draws stacks of styled text lines onto an opaque canvas and copies it into an RGBA frame.
pub struct SkiaTextRenderer {
    width: u32,
    height: u32,
    font: FontVec,
    canvas: Pixmap,
    text_cache: HashMap<Line, Arc<Pixmap>>,
    timer: HighPrecisionTimer,
}

impl SkiaTextRenderer {
    pub fn new(width: u32, height: u32, font: FontVec) -> Result<Self, RenderError> {
        Ok(Self {
            width,
            height,
            font,
            canvas: opaque_canvas(width, height)?,
            text_cache: HashMap::new(),
            timer: HighPrecisionTimer::new(),
        })
    }

    pub fn from_font_file(path: &Path, width: u32, height: u32) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path).map_err(|source| RenderError::FontIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::new(width, height, FontVec::try_from_vec(bytes)?)
    }

    /// Text sizes follow the canvas height, so cached glyph pixmaps are dropped.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.canvas = opaque_canvas(width, height)?;
        self.width = width;
        self.height = height;
        self.text_cache.clear();
        debug!(width, height, "renderer resized");
        Ok(())
    }

    /// Replaces the frame contents with `lines`, centred as a stack.
    pub fn render_lines(
        &mut self,
        lines: &[Line],
        frame: &mut [u8],
    ) -> Result<FrameStats, RenderError> {
        let expected = self.width as usize * self.height as usize * 4;
        if frame.len() != expected {
            return Err(RenderError::FrameSize {
                expected,
                actual: frame.len(),
            });
        }

        let t_layout = self.timer.now();
        let [r, g, b, a] = BACKGROUND;
        self.canvas.fill(Color::from_rgba8(r, g, b, a));

        let pixmaps: Vec<Arc<Pixmap>> = lines.iter().filter_map(|l| self.text_pixmap(l)).collect();
        retain_lines(&mut self.text_cache, lines);
        let sizes: Vec<(u32, u32)> = pixmaps.iter().map(|p| (p.width(), p.height())).collect();
        let gap = (self.height as f32 * LINE_GAP) as u32;
        for (pm, (x, y)) in pixmaps
            .iter()
            .zip(stack_layout(&sizes, self.width, self.height, gap))
        {
            blit_premultiplied(&mut self.canvas, pm, x, y);
        }
        let layout = self.timer.elapsed(t_layout);

        // Canvas is opaque, so premultiplied and straight RGBA agree.
        let t_copy = self.timer.now();
        frame.copy_from_slice(self.canvas.data());
        let copy = self.timer.elapsed(t_copy);

        Ok(FrameStats {
            layout,
            copy,
            total: layout + copy,
            lines: pixmaps.len(),
        })
    }

    fn text_pixmap(&mut self, line: &Line) -> Option<Arc<Pixmap>> {
        if let Some(p) = self.text_cache.get(line) {
            return Some(Arc::clone(p));
        }
        let size = line.style.relative_size() * self.height as f32;
        let pm = Arc::new(render_text_pixmap(
            &line.text,
            size,
            &self.font,
            line.style.color(),
        )?);
        self.text_cache.insert(line.clone(), Arc::clone(&pm));
        Some(pm)
    }
}

/// Keeps only the pixmaps of the screen just drawn.
fn retain_lines(cache: &mut HashMap<Line, Arc<Pixmap>>, lines: &[Line]) {
    cache.retain(|line, _| lines.contains(line));
}

fn opaque_canvas(width: u32, height: u32) -> Result<Pixmap, RenderError> {
    let mut canvas = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;
    let [r, g, b, a] = BACKGROUND;
    canvas.fill(Color::from_rgba8(r, g, b, a));
    Ok(canvas)
}
