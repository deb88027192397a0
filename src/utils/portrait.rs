use anyhow::{ensure, Context as _, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};

// 20x20 source art scaled up 8x, like the original plugin canvas.
const SCALE: u32 = 8;
const SIZE: u32 = 20 * SCALE;

pub const COLOR_LIST: [[&str; 2]; 5] = [
    ["#00cdac", "#02aab0"],
    ["#6a82fb", "#fc5c7d"],
    ["#ffb88c", "#de6262"],
    ["#f45c43", "#eb3349"],
    ["#B5AC49", "#3CA55C"],
];

const BACK_DROP_SHADING: &[u8] = include_bytes!("../../assets/images/backdrop_shading.png");
const NOT_FOUND_PFP: &[u8] = include_bytes!("../../assets/images/not_found_pfp.png");
const PSHADING_20X20: &[u8] = include_bytes!("../../assets/images/pfp_shading_20x20.png");

/// Background of the portrait: one of the five built-in gradient presets,
/// or an explicit start/end color pair.
#[derive(Debug, Clone)]
pub enum WallColors {
    Preset(String),
    Pair { start: String, end: String },
}

impl WallColors {
    /// `"背景3"` selects a preset, `"#00cdac,#02aab0"` an explicit pair.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(',') {
            Some((start, end)) => WallColors::Pair {
                start: start.trim().to_string(),
                end: end.trim().to_string(),
            },
            None => WallColors::Preset(raw.trim().to_string()),
        }
    }
}

fn preset_colors(name: &str) -> [&'static str; 2] {
    match name {
        "背景1" => COLOR_LIST[0],
        "背景2" => COLOR_LIST[1],
        "背景3" => COLOR_LIST[2],
        "背景4" => COLOR_LIST[3],
        "背景5" => COLOR_LIST[4],
        _ => COLOR_LIST[0],
    }
}

fn parse_color(hex: &str) -> Result<Rgba<u8>> {
    let digits = hex.trim().trim_start_matches('#');
    ensure!(digits.len() == 6, "无法解析颜色值: {}", hex);
    let parse = |range| {
        u8::from_str_radix(&digits[range], 16).with_context(|| format!("无法解析颜色值: {}", hex))
    };
    Ok(Rgba([parse(0..2)?, parse(2..4)?, parse(4..6)?, 255]))
}

/// The eight gradient axes, kept as the original literal vectors in the
/// 0..300 coordinate space (the ramp deliberately extends past the canvas).
fn direction_pos(direction: u32) -> [f32; 4] {
    match direction % 8 {
        0 => [0.0, 0.0, 0.0, 300.0],
        1 => [300.0, 0.0, 0.0, 300.0],
        2 => [300.0, 0.0, 0.0, 0.0],
        3 => [300.0, 300.0, 0.0, 0.0],
        4 => [0.0, 300.0, 0.0, 0.0],
        5 => [0.0, 300.0, 300.0, 0.0],
        6 => [0.0, 0.0, 300.0, 0.0],
        _ => [0.0, 0.0, 300.0, 300.0],
    }
}

fn fill_gradient(canvas: &mut RgbaImage, axis: [f32; 4], start: Rgba<u8>, end: Rgba<u8>) {
    let [x0, y0, x1, y1] = axis;
    let (dx, dy) = (x1 - x0, y1 - y0);
    let len2 = dx * dx + dy * dy;
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let t = ((x as f32 - x0) * dx + (y as f32 - y0) * dy) / len2;
        let t = t.max(0.0).min(1.0);
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        *pixel = Rgba([
            lerp(start[0], end[0]),
            lerp(start[1], end[1]),
            lerp(start[2], end[2]),
            255,
        ]);
    }
}

fn overlay_asset(canvas: &mut RgbaImage, bytes: &[u8], width: u32, height: u32) -> Result<()> {
    let img = image::load_from_memory(bytes).context("内置贴图损坏")?;
    let img = imageops::resize(&img.to_rgba8(), width, height, FilterType::Nearest);
    imageops::overlay(canvas, &img, 0, 0);
    Ok(())
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    for yy in y..(y + h).min(SIZE) {
        for xx in x..(x + w).min(SIZE) {
            canvas.put_pixel(xx, yy, color);
        }
    }
}

/// Composite the portrait: gradient wall, backdrop shading, then either the
/// "not found" placeholder or the skin pass, and the final shading layer.
pub fn generate(wall: &WallColors, direction: u32, skin_url: Option<&str>) -> Result<Vec<u8>> {
    let (start, end) = match wall {
        WallColors::Preset(name) => {
            let pair = preset_colors(name);
            (parse_color(pair[0])?, parse_color(pair[1])?)
        }
        WallColors::Pair { start, end } => (parse_color(start)?, parse_color(end)?),
    };

    let mut canvas: RgbaImage = ImageBuffer::from_pixel(SIZE, SIZE, Rgba([0, 0, 0, 0]));
    fill_gradient(&mut canvas, direction_pos(direction), start, end);
    overlay_asset(&mut canvas, BACK_DROP_SHADING, SIZE, SIZE)?;

    if skin_url.is_none() {
        overlay_asset(&mut canvas, NOT_FOUND_PFP, 150, 150)?;
        fill_rect(&mut canvas, 40, 150, 80, 10, Rgba([0, 0, 0, 255]));
    }
    // TODO: blit the skin face/hat layers from skin_url before this pass;
    // the original plugin stops at the shading layer too.
    overlay_asset(&mut canvas, PSHADING_20X20, SIZE, SIZE)?;

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .context("PNG 编码失败")?;
    ensure!(!out.is_empty(), "渲染结果为空");
    Ok(out)
}
