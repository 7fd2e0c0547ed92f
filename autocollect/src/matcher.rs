//! Template matching and hit deduplication.
//!
//! Similarity is the zero-mean normalized cross-correlation of the template
//! and the window under it, computed over all three channels at once (the
//! measure OpenCV calls `TM_CCOEFF_NORMED`). It is 1.0 for a window that is a
//! brightness/contrast-shifted copy of the template and around 0.0 for
//! unrelated content.
//!
//! Correlation is undefined for flat (single-color) images. A flat template is
//! compared against flat windows by mean color instead, so solid markers can
//! still be found; a textured window never matches a flat template and vice
//! versa.
//!
//! Textured templates large enough to be reduced are searched coarse-to-fine:
//! every `step`-th position is scored with the template and the image averaged
//! over `2 * step` pixel blocks, and only positions near a coarse hit are scored
//! at full resolution. Small or flat templates are scanned exhaustively.

use {
    crate::{capture::Snapshot, geometry::Point, template::MarkerTemplate},
    image::RgbImage,
    rayon::prelude::*,
};

pub const DEFAULT_THRESHOLD: f64 = 0.7;
pub const DEFAULT_DEDUP_RADIUS: f64 = 20.0;

/// A position survives the coarse pass if its coarse score reaches this
/// fraction of the threshold.
const COARSE_SCORE_RATIO: f64 = 0.5;

/// Template position (top-left corner, snapshot coordinates) whose score passed the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub x: u32,
    pub y: u32,
    pub score: f64,
}

/// Deduplicated match: template center in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerHit {
    pub point: Point,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    threshold: f64,
    dedup_radius: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_DEDUP_RADIUS)
    }
}

impl Matcher {
    pub fn new(threshold: f64, dedup_radius: f64) -> Self {
        Self {
            threshold,
            dedup_radius,
        }
    }

    /// Finds all occurrences of `template` in `snapshot`.
    ///
    /// Hits are returned in scan order (top to bottom, left to right). A missing
    /// template or a template larger than the snapshot gives no hits.
    pub fn find(&self, template: Option<&MarkerTemplate>, snapshot: &Snapshot) -> Vec<MarkerHit> {
        let Some(template) = template else {
            return Vec::new();
        };
        let center = Point::new((template.width() / 2) as i32, (template.height() / 2) as i32);
        let hits = match_candidates(template.image(), snapshot.image(), self.threshold)
            .into_iter()
            .map(|candidate| MarkerHit {
                point: snapshot.origin()
                    + Point::new(candidate.x as i32, candidate.y as i32)
                    + center,
                score: candidate.score,
            });
        dedup_hits(hits, self.dedup_radius)
    }
}

/// Greedy deduplication.
///
/// A hit is kept only if it is at least `radius` away from every hit kept
/// before it. The result depends on input order: the first hit seen in a
/// cluster represents the cluster.
pub fn dedup_hits(hits: impl IntoIterator<Item = MarkerHit>, radius: f64) -> Vec<MarkerHit> {
    let mut accepted: Vec<MarkerHit> = Vec::new();
    for hit in hits {
        if accepted
            .iter()
            .all(|other| other.point.distance(hit.point) >= radius)
        {
            accepted.push(hit);
        }
    }
    accepted
}

/// Scores positions where `template` fits inside `image` and returns those
/// scoring at least `threshold`, in row-major order.
pub fn match_candidates(template: &RgbImage, image: &RgbImage, threshold: f64) -> Vec<MatchCandidate> {
    let (template_width, template_height) = template.dimensions();
    let (image_width, image_height) = image.dimensions();
    if template_width == 0
        || template_height == 0
        || template_width > image_width
        || template_height > image_height
    {
        return Vec::new();
    }
    let stats = TemplateStats::new(template);
    let refined = if stats.flat {
        None
    } else {
        CoarseTemplate::new(template, threshold)
            .and_then(|coarse| stats.refined_candidates(image, &coarse, threshold))
    };
    refined.unwrap_or_else(|| stats.exhaustive_candidates(image, threshold))
}

// `n * Σx² == Σ(Σx)²` over the channels holds exactly when every channel is constant.
fn is_flat(pixel_count: u64, sum: [u64; 3], sum_sq: u64) -> bool {
    let squared_sums: u128 = sum.iter().map(|&s| u128::from(s) * u128::from(s)).sum();
    u128::from(pixel_count) * u128::from(sum_sq) == squared_sums
}

struct TemplateStats {
    width: u32,
    height: u32,
    pixel_count: u64,
    mean: [f64; 3],
    /// Template samples minus the channel mean, row-major, interleaved RGB.
    centered: Vec<f64>,
    norm: f64,
    flat: bool,
}

impl TemplateStats {
    fn new(template: &RgbImage) -> Self {
        let pixel_count = u64::from(template.width()) * u64::from(template.height());
        let mut sum = [0u64; 3];
        let mut sum_sq = 0u64;
        for pixel in template.pixels() {
            for (channel, &value) in pixel.0.iter().enumerate() {
                let value = u64::from(value);
                sum[channel] += value;
                sum_sq += value * value;
            }
        }
        let mean = sum.map(|s| s as f64 / pixel_count as f64);
        let centered: Vec<f64> = template
            .as_raw()
            .chunks_exact(3)
            .flat_map(|pixel| (0..3).map(move |channel| f64::from(pixel[channel]) - mean[channel]))
            .collect();
        let norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();
        Self {
            width: template.width(),
            height: template.height(),
            pixel_count,
            mean,
            centered,
            norm,
            flat: is_flat(pixel_count, sum, sum_sq),
        }
    }

    fn exhaustive_candidates(&self, image: &RgbImage, threshold: f64) -> Vec<MatchCandidate> {
        let rows: Vec<Vec<MatchCandidate>> = (0..=image.height() - self.height)
            .into_par_iter()
            .map(|y| self.row_candidates(image, y, threshold))
            .collect();
        rows.into_iter().flatten().collect()
    }

    /// Scores full-resolution positions around coarse hits.
    ///
    /// Returns `None` if the image is too small for a single coarse position.
    fn refined_candidates(
        &self,
        image: &RgbImage,
        coarse: &CoarseTemplate,
        threshold: f64,
    ) -> Option<Vec<MatchCandidate>> {
        let boxes = BlockSums::new(image, coarse.step);
        let grid_width = (boxes.width + 2).checked_sub(2 * coarse.blocks_wide)?;
        let grid_height = (boxes.height + 2).checked_sub(2 * coarse.blocks_high)?;
        if grid_width == 0 || grid_height == 0 {
            return None;
        }

        let coarse_threshold = threshold * COARSE_SCORE_RATIO;
        let survivors: Vec<Vec<(usize, usize)>> = (0..grid_height)
            .into_par_iter()
            .map(|grid_y| {
                (0..grid_width)
                    .filter(|&grid_x| coarse.score(&boxes, grid_x, grid_y) >= coarse_threshold)
                    .map(|grid_x| (grid_x, grid_y))
                    .collect()
            })
            .collect();

        let positions_wide = (image.width() - self.width) as usize + 1;
        let positions_high = (image.height() - self.height) as usize + 1;
        let step = coarse.step;
        let mut selected = vec![false; positions_wide * positions_high];
        for (grid_x, grid_y) in survivors.into_iter().flatten() {
            let (x, y) = (grid_x * step, grid_y * step);
            let (left, right) = (x.saturating_sub(step), (x + step).min(positions_wide - 1));
            // Coarse positions can lie past the last full-resolution position
            // when the template has pixels beyond its last whole block.
            if left > right {
                continue;
            }
            for row in y.saturating_sub(step)..=(y + step).min(positions_high - 1) {
                selected[row * positions_wide + left..=row * positions_wide + right].fill(true);
            }
        }

        let stride = image.width() as usize * 3;
        let raw = image.as_raw();
        let rows: Vec<Vec<MatchCandidate>> = selected
            .par_chunks(positions_wide)
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &chosen)| chosen)
                    .filter_map(|(x, _)| {
                        let (sum, sum_sq) = self.window_sums(raw, stride, x, y);
                        let score = self.score(raw, stride, x, y, sum, sum_sq);
                        (score >= threshold).then_some(MatchCandidate {
                            x: x as u32,
                            y: y as u32,
                            score,
                        })
                    })
                    .collect()
            })
            .collect();
        Some(rows.into_iter().flatten().collect())
    }

    fn window_sums(&self, raw: &[u8], stride: usize, x: usize, y: usize) -> ([u64; 3], u64) {
        let row_len = self.width as usize * 3;
        let mut sum = [0u64; 3];
        let mut sum_sq = 0u64;
        for row in y..y + self.height as usize {
            let start = row * stride + x * 3;
            for pixel in raw[start..start + row_len].chunks_exact(3) {
                for channel in 0..3 {
                    let value = u64::from(pixel[channel]);
                    sum[channel] += value;
                    sum_sq += value * value;
                }
            }
        }
        (sum, sum_sq)
    }

    /// Candidates with the template's top edge at row `y`.
    ///
    /// Window sums are kept per column over the template's rows and slid
    /// horizontally, so only the cross term costs a full template pass.
    fn row_candidates(&self, image: &RgbImage, y: u32, threshold: f64) -> Vec<MatchCandidate> {
        let image_width = image.width() as usize;
        let width = self.width as usize;
        let stride = image_width * 3;
        let raw = image.as_raw();

        let mut column_sum = vec![[0u64; 3]; image_width];
        let mut column_sq = vec![0u64; image_width];
        for row in y as usize..(y + self.height) as usize {
            let line = &raw[row * stride..(row + 1) * stride];
            for (x, pixel) in line.chunks_exact(3).enumerate() {
                for channel in 0..3 {
                    let value = u64::from(pixel[channel]);
                    column_sum[x][channel] += value;
                    column_sq[x] += value * value;
                }
            }
        }

        let mut window_sum = [0u64; 3];
        let mut window_sq = 0u64;
        for x in 0..width {
            for channel in 0..3 {
                window_sum[channel] += column_sum[x][channel];
            }
            window_sq += column_sq[x];
        }

        let mut candidates = Vec::new();
        for x in 0..=image_width - width {
            if x > 0 {
                let entering = x + width - 1;
                let leaving = x - 1;
                for channel in 0..3 {
                    window_sum[channel] += column_sum[entering][channel];
                    window_sum[channel] -= column_sum[leaving][channel];
                }
                window_sq += column_sq[entering];
                window_sq -= column_sq[leaving];
            }
            let score = self.score(raw, stride, x, y as usize, window_sum, window_sq);
            if score >= threshold {
                candidates.push(MatchCandidate {
                    x: x as u32,
                    y,
                    score,
                });
            }
        }
        candidates
    }

    fn score(
        &self,
        raw: &[u8],
        stride: usize,
        x: usize,
        y: usize,
        window_sum: [u64; 3],
        window_sq: u64,
    ) -> f64 {
        let count = self.pixel_count as f64;
        let window_flat = is_flat(self.pixel_count, window_sum, window_sq);
        if self.flat {
            if !window_flat {
                return 0.0;
            }
            let mean_diff = (0..3)
                .map(|channel| (window_sum[channel] as f64 / count - self.mean[channel]).abs())
                .sum::<f64>()
                / 3.0;
            return 1.0 - mean_diff / 255.0;
        }
        if window_flat {
            return 0.0;
        }

        let squared_sums: f64 = window_sum.iter().map(|&s| (s as f64) * (s as f64)).sum();
        let window_variance = (window_sq as f64 - squared_sums / count).max(0.0);
        let denominator = window_variance.sqrt() * self.norm;
        if denominator <= 0.0 {
            return 0.0;
        }

        // The template rows are zero-mean per channel, so the window mean drops out.
        let row_len = self.width as usize * 3;
        let mut numerator = 0.0;
        for row in 0..self.height as usize {
            let start = (y + row) * stride + x * 3;
            let window_row = &raw[start..start + row_len];
            let template_row = &self.centered[row * row_len..(row + 1) * row_len];
            numerator += window_row
                .iter()
                .zip(template_row)
                .map(|(&a, &b)| f64::from(a) * b)
                .sum::<f64>();
        }
        (numerator / denominator).clamp(-1.0, 1.0)
    }
}

/// Channel sums of `2 * step` pixel square blocks of an image, for blocks
/// starting at every multiple of `step`.
struct BlockSums {
    width: usize,
    height: usize,
    sums: Vec<[u32; 3]>,
}

impl BlockSums {
    fn new(image: &RgbImage, step: usize) -> Self {
        let cells_wide = image.width() as usize / step;
        let cells_high = image.height() as usize / step;
        let stride = image.width() as usize * 3;
        let raw = image.as_raw();
        let cell_rows: Vec<Vec<[u32; 3]>> = (0..cells_high)
            .into_par_iter()
            .map(|cell_y| {
                let mut cells = vec![[0u32; 3]; cells_wide];
                for y in cell_y * step..(cell_y + 1) * step {
                    let line = &raw[y * stride..y * stride + cells_wide * step * 3];
                    for (x, pixel) in line.chunks_exact(3).enumerate() {
                        let cell = &mut cells[x / step];
                        for channel in 0..3 {
                            cell[channel] += u32::from(pixel[channel]);
                        }
                    }
                }
                cells
            })
            .collect();

        let width = cells_wide.saturating_sub(1);
        let height = cells_high.saturating_sub(1);
        let mut sums = Vec::with_capacity(width * height);
        for y in 0..height {
            let (top, bottom) = (&cell_rows[y], &cell_rows[y + 1]);
            for x in 0..width {
                sums.push([0, 1, 2].map(|channel| {
                    top[x][channel] + top[x + 1][channel] + bottom[x][channel] + bottom[x + 1][channel]
                }));
            }
        }
        Self {
            width,
            height,
            sums,
        }
    }

    fn get(&self, x: usize, y: usize) -> [u32; 3] {
        self.sums[y * self.width + x]
    }
}

/// Template reduced to `2 * step` pixel blocks. Pixels past the last whole
/// block are left out.
struct CoarseTemplate {
    step: usize,
    blocks_wide: usize,
    blocks_high: usize,
    block_count: u64,
    centered: Vec<f64>,
    norm: f64,
}

impl CoarseTemplate {
    /// Returns `None` if the template is too small to reduce, reduces to a flat
    /// image, or `threshold` is too low for the coarse pass to reject anything.
    fn new(template: &RgbImage, threshold: f64) -> Option<Self> {
        if threshold <= 0.0 {
            return None;
        }
        let min_side = template.width().min(template.height()) as usize;
        let step = [4, 2].into_iter().find(|&step| min_side >= 8 * step)?;
        let block = 2 * step;
        let blocks_wide = template.width() as usize / block;
        let blocks_high = template.height() as usize / block;

        let mut blocks = vec![[0u64; 3]; blocks_wide * blocks_high];
        for (x, y, pixel) in template.enumerate_pixels() {
            let (block_x, block_y) = (x as usize / block, y as usize / block);
            if block_x < blocks_wide && block_y < blocks_high {
                for channel in 0..3 {
                    blocks[block_y * blocks_wide + block_x][channel] += u64::from(pixel.0[channel]);
                }
            }
        }

        let block_count = blocks.len() as u64;
        let mut sum = [0u64; 3];
        let mut sum_sq = 0u64;
        for block in &blocks {
            for channel in 0..3 {
                sum[channel] += block[channel];
                sum_sq += block[channel] * block[channel];
            }
        }
        if is_flat(block_count, sum, sum_sq) {
            return None;
        }
        let mean = sum.map(|s| s as f64 / block_count as f64);
        let centered: Vec<f64> = blocks
            .iter()
            .flat_map(|block| (0..3).map(move |channel| block[channel] as f64 - mean[channel]))
            .collect();
        let norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();
        Some(Self {
            step,
            blocks_wide,
            blocks_high,
            block_count,
            centered,
            norm,
        })
    }

    /// Score of the position `(grid_x * step, grid_y * step)`.
    fn score(&self, boxes: &BlockSums, grid_x: usize, grid_y: usize) -> f64 {
        let mut sum = [0u64; 3];
        let mut sum_sq = 0u64;
        let mut numerator = 0.0;
        for block_y in 0..self.blocks_high {
            for block_x in 0..self.blocks_wide {
                let window = boxes.get(grid_x + 2 * block_x, grid_y + 2 * block_y);
                let index = (block_y * self.blocks_wide + block_x) * 3;
                for channel in 0..3 {
                    let value = u64::from(window[channel]);
                    sum[channel] += value;
                    sum_sq += value * value;
                    numerator += value as f64 * self.centered[index + channel];
                }
            }
        }
        if is_flat(self.block_count, sum, sum_sq) {
            return 0.0;
        }
        let squared_sums: f64 = sum.iter().map(|&s| (s as f64) * (s as f64)).sum();
        let variance = (sum_sq as f64 - squared_sums / self.block_count as f64).max(0.0);
        let denominator = variance.sqrt() * self.norm;
        if denominator <= 0.0 {
            return 0.0;
        }
        numerator / denominator
    }
}
