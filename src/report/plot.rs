// src/report/plot.rs
//! Pie-chart rasters, PNG encoded.
//!
//! Each panel is a pie with a legend underneath: one colored swatch per
//! slice, in slice order, with its share printed next to it. Labels are
//! left to the caption and the text report, which carry them in the same
//! order.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use log::debug;

use super::chart::{primary_series, subgroup_series};
use crate::config::consts::{PIE_SIZE_PX, POSTS_SUBGROUP, STORIES_SUBGROUP};
use crate::data::{ChartSeries, GroupKey, StatisticsSnapshot};
use crate::error::{Result, StatsError};

const MARGIN: u32 = 16;
const LEGEND_ROW: u32 = 28;
const SWATCH: u32 = 18;
const TEXT_SCALE: u32 = 2;

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const PLACEHOLDER: Rgb<u8> = Rgb([222, 222, 222]);
const PLACEHOLDER_RING: Rgb<u8> = Rgb([170, 170, 170]);
const INK: Rgb<u8> = Rgb([40, 40, 40]);

pub const PALETTE: [Rgb<u8>; 10] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
    Rgb([188, 189, 34]),
    Rgb([23, 190, 207]),
];

/// One rendered image and the caption that goes with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub title: String,
    pub png: Vec<u8>,
}

/// P2P: one pie when any value is positive. Posting: Posts and Stories side
/// by side in one image, an empty side drawn as a grey disc. Error
/// snapshots get no charts.
pub fn render_charts(snap: &StatisticsSnapshot) -> Result<Vec<Chart>> {
    let mut out = Vec::new();
    if snap.is_error() {
        return Ok(out);
    }

    if let Some(group) = snap.group(GroupKey::P2p) {
        let series = primary_series(group);
        if series.is_empty() {
            debug!("Charts: no positive values for {}", group.name);
        } else {
            let png = encode(&panels_image(std::slice::from_ref(&series)))?;
            out.push(Chart { title: series.title, png });
        }
    }

    if let Some(group) = snap.group(GroupKey::Posting) {
        let panels = [
            subgroup_series(POSTS_SUBGROUP, group.subgroups.get(POSTS_SUBGROUP)),
            subgroup_series(STORIES_SUBGROUP, group.subgroups.get(STORIES_SUBGROUP)),
        ];
        let png = encode(&panels_image(&panels))?;
        out.push(Chart { title: group.name.clone(), png });
    }

    debug!("Charts: rendered {}", out.len());
    Ok(out)
}

pub fn panels_image(panels: &[ChartSeries]) -> RgbImage {
    let n = panels.len().max(1) as u32;
    let rows = panels.iter().map(|p| p.points.len()).max().unwrap_or(0) as u32;
    let width = n * PIE_SIZE_PX + (n - 1) * MARGIN;
    let height = PIE_SIZE_PX + 2 * MARGIN + rows * LEGEND_ROW;

    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    for (i, series) in panels.iter().enumerate() {
        let ox = i as u32 * (PIE_SIZE_PX + MARGIN);
        if series.is_empty() || series.total() <= 0.0 {
            draw_placeholder(&mut img, ox);
        } else {
            draw_pie(&mut img, ox, series);
            draw_legend(&mut img, ox + MARGIN, PIE_SIZE_PX + MARGIN, series);
        }
    }
    img
}

fn encode(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(|e| StatsError::Chart(e.to_string()))?;
    Ok(buf)
}

/* ---------------- Drawing ---------------- */

fn pie_geometry(ox: u32) -> (f64, f64, f64) {
    let half = PIE_SIZE_PX as f64 / 2.0;
    (ox as f64 + half, half, half - MARGIN as f64)
}

/// Slices run clockwise from 12 o'clock in series order.
fn draw_pie(img: &mut RgbImage, ox: u32, series: &ChartSeries) {
    let (cx, cy, r) = pie_geometry(ox);
    let total = series.total();

    let mut bounds = Vec::with_capacity(series.points.len());
    let mut acc = 0.0;
    for (_, v) in &series.points {
        acc += v / total;
        bounds.push(acc);
    }
    let last = bounds.len().saturating_sub(1);

    for y in 0..PIE_SIZE_PX {
        for x in ox..ox + PIE_SIZE_PX {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let turn = (dx.atan2(-dy) / std::f64::consts::TAU).rem_euclid(1.0);
            let idx = bounds.iter().position(|&b| turn < b).unwrap_or(last);
            img.put_pixel(x, y, PALETTE[idx % PALETTE.len()]);
        }
    }
}

fn draw_placeholder(img: &mut RgbImage, ox: u32) {
    let (cx, cy, r) = pie_geometry(ox);
    for y in 0..PIE_SIZE_PX {
        for x in ox..ox + PIE_SIZE_PX {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if d <= r - 3.0 {
                img.put_pixel(x, y, PLACEHOLDER);
            } else if d <= r {
                img.put_pixel(x, y, PLACEHOLDER_RING);
            }
        }
    }
}

fn draw_legend(img: &mut RgbImage, x: u32, top: u32, series: &ChartSeries) {
    let total = series.total();
    for (i, (_, v)) in series.points.iter().enumerate() {
        let y = top + i as u32 * LEGEND_ROW;
        fill_rect(img, x, y, SWATCH, SWATCH, PALETTE[i % PALETTE.len()]);
        let share = format!("{:.1}%", 100.0 * v / total);
        draw_text(img, x + SWATCH + 10, y + 2, &share, INK);
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for py in y..(y + h).min(img.height()) {
        for px in x..(x + w).min(img.width()) {
            img.put_pixel(px, py, color);
        }
    }
}

fn draw_text(img: &mut RgbImage, mut x: u32, top: u32, text: &str, color: Rgb<u8>) {
    for ch in text.chars() {
        let Some(rows) = glyph(ch) else {
            x += 4 * TEXT_SCALE;
            continue;
        };
        for (ry, row) in rows.iter().enumerate() {
            for (rx, cell) in row.bytes().enumerate() {
                if cell == b'#' {
                    let px = x + rx as u32 * TEXT_SCALE;
                    let py = top + ry as u32 * TEXT_SCALE;
                    fill_rect(img, px, py, TEXT_SCALE, TEXT_SCALE, color);
                }
            }
        }
        x += 6 * TEXT_SCALE;
    }
}

fn glyph(ch: char) -> Option<&'static [&'static str; 7]> {
    Some(match ch {
        '0' => &[" ### ", "#   #", "#  ##", "# # #", "##  #", "#   #", " ### "],
        '1' => &["  #  ", " ##  ", "  #  ", "  #  ", "  #  ", "  #  ", " ### "],
        '2' => &[" ### ", "#   #", "    #", "   # ", "  #  ", " #   ", "#####"],
        '3' => &["#####", "   # ", "  #  ", "   # ", "    #", "#   #", " ### "],
        '4' => &["   # ", "  ## ", " # # ", "#  # ", "#####", "   # ", "   # "],
        '5' => &["#####", "#    ", "#### ", "    #", "    #", "#   #", " ### "],
        '6' => &["  ## ", " #   ", "#    ", "#### ", "#   #", "#   #", " ### "],
        '7' => &["#####", "    #", "   # ", "  #  ", " #   ", " #   ", " #   "],
        '8' => &[" ### ", "#   #", "#   #", " ### ", "#   #", "#   #", " ### "],
        '9' => &[" ### ", "#   #", "#   #", " ####", "    #", "   # ", " ##  "],
        '.' => &["     ", "     ", "     ", "     ", "     ", " ##  ", " ##  "],
        '%' => &["##   ", "##  #", "   # ", "  #  ", " #   ", "#  ##", "   ##"],
        _ => return None,
    })
}
