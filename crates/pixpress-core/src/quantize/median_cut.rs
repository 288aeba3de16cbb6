//! Weighted median cut in RGBA space with k-means refinement.

use std::cmp::Ordering;

/// Per-channel weights for color distance (R, G, B, A).
///
/// Color channels use Rec. 601 luma weights; alpha weighs as much as the
/// three color channels together.
pub(crate) const CHANNEL_WEIGHTS: [f32; 4] = [0.299, 0.587, 0.114, 1.0];

const REFINE_PASSES: usize = 3;

/// A distinct color and the number of pixels that use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColorCount {
    pub rgba: [u8; 4],
    pub count: u32,
}

/// A box of histogram entries for median cut subdivision.
#[derive(Debug, Clone)]
struct ColorBox {
    entries: Vec<ColorCount>,
}

impl ColorBox {
    fn new(entries: Vec<ColorCount>) -> Self {
        Self { entries }
    }

    fn total_weight(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.count)).sum()
    }

    /// Axis with the largest weighted extent and that extent.
    fn widest_axis(&self) -> (usize, f32) {
        let mut min = [u8::MAX; 4];
        let mut max = [u8::MIN; 4];
        for entry in &self.entries {
            for c in 0..4 {
                min[c] = min[c].min(entry.rgba[c]);
                max[c] = max[c].max(entry.rgba[c]);
            }
        }

        (0..4)
            .map(|c| (c, f32::from(max[c] - min[c]) * CHANNEL_WEIGHTS[c]))
            .fold((0, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    /// Split priority: heavily used boxes with a wide spread split first.
    fn priority(&self) -> f32 {
        self.total_weight() as f32 * self.widest_axis().1
    }

    fn centroid(&self) -> [f32; 4] {
        let mut sums = [0.0f64; 4];
        let mut total = 0.0f64;
        for entry in &self.entries {
            let w = f64::from(entry.count);
            for c in 0..4 {
                sums[c] += f64::from(entry.rgba[c]) * w;
            }
            total += w;
        }
        if total == 0.0 {
            return [0.0; 4];
        }
        sums.map(|s| (s / total) as f32)
    }

    /// Split along the widest axis at the weighted median.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (axis, _) = self.widest_axis();

        // The full color breaks ties so the order is total and deterministic.
        self.entries.sort_unstable_by_key(|e| (e.rgba[axis], e.rgba));

        let half = self.total_weight().div_ceil(2);
        let mut accumulated = 0u64;
        let mut split_idx = self.entries.len() - 1;
        for (i, entry) in self.entries.iter().enumerate() {
            accumulated += u64::from(entry.count);
            if accumulated >= half {
                split_idx = i + 1;
                break;
            }
        }

        // At least one entry per side
        let split_idx = split_idx.clamp(1, self.entries.len() - 1);
        let right = self.entries.split_off(split_idx);
        (ColorBox::new(self.entries), ColorBox::new(right))
    }
}

/// Reduce a color histogram to at most `max_colors` centroids.
///
/// Histograms that already fit are returned as-is.
pub(crate) fn median_cut(histogram: &[ColorCount], max_colors: usize) -> Vec<[f32; 4]> {
    if histogram.is_empty() || max_colors == 0 {
        return Vec::new();
    }
    if histogram.len() <= max_colors {
        return histogram.iter().map(|e| e.rgba.map(f32::from)).collect();
    }

    let mut boxes = Vec::with_capacity(max_colors);
    boxes.push(ColorBox::new(histogram.to_vec()));

    while boxes.len() < max_colors {
        let best = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.entries.len() >= 2)
            .map(|(i, b)| (i, b.priority()))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        let Some(idx) = best else {
            break; // No more splittable boxes
        };

        let to_split = boxes.swap_remove(idx);
        let (left, right) = to_split.split();
        boxes.push(left);
        boxes.push(right);
    }

    let centroids: Vec<[f32; 4]> = boxes.iter().map(ColorBox::centroid).collect();
    kmeans_refine(centroids, histogram)
}

/// Weighted k-means passes over the full histogram.
fn kmeans_refine(mut centroids: Vec<[f32; 4]>, histogram: &[ColorCount]) -> Vec<[f32; 4]> {
    let k = centroids.len();

    for _ in 0..REFINE_PASSES {
        let mut sums = vec![[0.0f64; 4]; k];
        let mut weights = vec![0.0f64; k];

        for entry in histogram {
            let color = entry.rgba.map(f32::from);
            let nearest = nearest_index(&centroids, color);
            let w = f64::from(entry.count);
            for (sum, &channel) in sums[nearest].iter_mut().zip(&color) {
                *sum += f64::from(channel) * w;
            }
            weights[nearest] += w;
        }

        // Empty clusters keep their previous centroid.
        for (centroid, (sum, &weight)) in centroids.iter_mut().zip(sums.iter().zip(&weights)) {
            if weight > 0.0 {
                *centroid = sum.map(|s| (s / weight) as f32);
            }
        }
    }

    centroids
}

/// Weighted squared distance between two RGBA colors.
#[inline]
pub(crate) fn distance_sq(a: [f32; 4], b: [f32; 4]) -> f32 {
    (0..4)
        .map(|c| {
            let d = a[c] - b[c];
            d * d * CHANNEL_WEIGHTS[c]
        })
        .sum()
}

/// Index of the palette color closest to `color`. Ties resolve to the
/// lowest index.
pub(crate) fn nearest_index(palette: &[[f32; 4]], color: [f32; 4]) -> usize {
    palette
        .iter()
        .enumerate()
        .map(|(i, p)| (i, distance_sq(*p, color)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
