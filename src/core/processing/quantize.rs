//! Median-cut color quantization.
//!
//! The color set is recursively partitioned: the cube with the largest
//! `volume x count` is split along its widest channel at the median, until the
//! requested number of cubes exists or nothing left can be split. Each surviving
//! cube contributes the average of its members to the palette.
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::debug;

use crate::types::{Channel, Rgb};

const CHANNELS: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

/// A set of colors with exact per-channel bounds.
#[derive(Debug, Clone)]
struct ColorCube {
    colors: Vec<Rgb>,
    min: [u8; 3],
    max: [u8; 3],
    /// Creation order; decides heap ties and palette order
    seq: usize,
}

impl ColorCube {
    fn new(colors: Vec<Rgb>, seq: usize) -> Self {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for color in &colors {
            for (i, channel) in CHANNELS.iter().enumerate() {
                let v = color.channel(*channel);
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }
        Self {
            colors,
            min,
            max,
            seq,
        }
    }

    fn range(&self, i: usize) -> u32 {
        (self.max[i] - self.min[i]) as u32
    }

    /// Product of inclusive channel extents, so a single color has volume 1.
    fn volume(&self) -> u64 {
        (0..3).map(|i| self.range(i) as u64 + 1).product()
    }

    fn priority(&self) -> u64 {
        self.volume().saturating_mul(self.colors.len() as u64)
    }

    /// At least two distinct colors.
    fn is_splittable(&self) -> bool {
        (0..3).any(|i| self.range(i) > 0)
    }

    /// Widest channel; equal ranges resolve red, then green, then blue.
    fn widest_channel(&self) -> Channel {
        let (r, g, b) = (self.range(0), self.range(1), self.range(2));
        if r >= g && r >= b {
            Channel::Red
        } else if g >= b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    /// Split at the median of the widest channel. The cut is moved to the
    /// nearest value boundary so equal channel values never straddle the two
    /// children; both children are non-empty because the cube is splittable.
    fn split(mut self, next_seq: usize) -> (ColorCube, ColorCube) {
        let channel = self.widest_channel();
        self.colors.sort_by_key(|c| c.channel(channel));

        let len = self.colors.len();
        let mid = len / 2;
        let pivot = self.colors[mid].channel(channel);
        let lower = self.colors.partition_point(|c| c.channel(channel) < pivot);
        let upper = self.colors.partition_point(|c| c.channel(channel) <= pivot);

        let cut = match (lower > 0, upper < len) {
            (true, true) => {
                if mid - lower <= upper - mid {
                    lower
                } else {
                    upper
                }
            }
            (true, false) => lower,
            _ => upper,
        };

        let right = self.colors.split_off(cut);
        (
            ColorCube::new(self.colors, next_seq),
            ColorCube::new(right, next_seq + 1),
        )
    }

    /// Per-channel mean, rounded half up.
    fn average(&self) -> Rgb {
        let n = self.colors.len() as u64;
        let mut sums = [0u64; 3];
        for color in &self.colors {
            sums[0] += color.r as u64;
            sums[1] += color.g as u64;
            sums[2] += color.b as u64;
        }
        let mean = |sum: u64| ((sum + n / 2) / n) as u8;
        Rgb::new(mean(sums[0]), mean(sums[1]), mean(sums[2]))
    }
}

/// Heap entry: highest `volume x count` first, earliest created on ties.
struct QueuedCube {
    priority: u64,
    cube: ColorCube,
}

impl QueuedCube {
    fn new(cube: ColorCube) -> Self {
        Self {
            priority: cube.priority(),
            cube,
        }
    }

    fn key(&self) -> (u64, Reverse<usize>) {
        (self.priority, Reverse(self.cube.seq))
    }
}

impl PartialEq for QueuedCube {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedCube {}

impl PartialOrd for QueuedCube {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedCube {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Reduce `colors` to at most `palette_size` representative colors.
///
/// Returns an empty palette when `colors` is empty or `palette_size` is 0.
/// The palette may be shorter than requested when there are fewer distinct
/// colors. Entries are ordered by the creation order of their cubes.
pub fn quantize(colors: &[Rgb], palette_size: usize) -> Vec<Rgb> {
    if colors.is_empty() || palette_size < 1 {
        return Vec::new();
    }

    let mut next_seq = 0;
    let root = ColorCube::new(colors.to_vec(), next_seq);
    next_seq += 1;

    let mut heap = BinaryHeap::new();
    let mut leaves = Vec::with_capacity(palette_size);
    if root.is_splittable() {
        heap.push(QueuedCube::new(root));
    } else {
        leaves.push(root);
    }

    let mut cubes = 1;
    while cubes < palette_size {
        let Some(QueuedCube { cube, .. }) = heap.pop() else {
            break;
        };
        let (left, right) = cube.split(next_seq);
        next_seq += 2;
        cubes += 1;
        for child in [left, right] {
            if child.is_splittable() {
                heap.push(QueuedCube::new(child));
            } else {
                leaves.push(child);
            }
        }
    }

    leaves.extend(heap.into_iter().map(|queued| queued.cube));
    leaves.sort_by_key(|cube| cube.seq);

    debug!(
        "Quantized {} colors into {} cubes (requested {})",
        colors.len(),
        leaves.len(),
        palette_size
    );

    leaves.iter().map(ColorCube::average).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(color: Rgb, n: usize) -> Vec<Rgb> {
        vec![color; n]
    }

    #[test]
    fn empty_input_or_zero_size_gives_empty_palette() {
        assert!(quantize(&[], 5).is_empty());
        assert!(quantize(&[Rgb::new(1, 2, 3)], 0).is_empty());
    }

    #[test]
    fn identical_colors_collapse_to_one_entry() {
        let colors = repeat(Rgb::new(12, 34, 56), 50);
        assert_eq!(quantize(&colors, 5), vec![Rgb::new(12, 34, 56)]);
    }

    #[test]
    fn palette_never_exceeds_requested_size() {
        let colors: Vec<Rgb> = (0..=255u8)
            .map(|v| Rgb::new(v, v.wrapping_mul(7), 255 - v))
            .collect();
        for size in 1..=12 {
            let palette = quantize(&colors, size);
            assert!(palette.len() <= size, "size {size} gave {}", palette.len());
            assert!(!palette.is_empty());
        }
    }

    #[test]
    fn single_entry_is_the_rounded_mean() {
        let colors = vec![Rgb::new(0, 0, 0), Rgb::new(1, 3, 255)];
        // (0+1)/2 = 0.5 -> 1, 3/2 = 1.5 -> 2, 255/2 = 127.5 -> 128
        assert_eq!(quantize(&colors, 1), vec![Rgb::new(1, 2, 128)]);
    }

    #[test]
    fn splits_follow_priority_and_palette_follows_creation_order() {
        let black = Rgb::new(0, 0, 0);
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        let mut colors = repeat(black, 4);
        colors.extend(repeat(red, 4));
        colors.extend(repeat(blue, 2));

        // Root splits on red (tie with blue) into {black, blue} and {red};
        // {black, blue} splits on blue next.
        assert_eq!(quantize(&colors, 3), vec![red, black, blue]);
        assert_eq!(quantize(&colors, 10), vec![red, black, blue]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let colors: Vec<Rgb> = (0..500u32)
            .map(|i| Rgb::new((i * 31 % 256) as u8, (i * 17 % 256) as u8, (i * 5 % 256) as u8))
            .collect();
        assert_eq!(quantize(&colors, 8), quantize(&colors, 8));
    }

    #[test]
    fn widest_channel_ties_prefer_red_then_green() {
        let cube = ColorCube::new(vec![Rgb::new(0, 0, 0), Rgb::new(10, 10, 10)], 0);
        assert_eq!(cube.widest_channel(), Channel::Red);
        let cube = ColorCube::new(vec![Rgb::new(0, 0, 0), Rgb::new(0, 10, 10)], 0);
        assert_eq!(cube.widest_channel(), Channel::Green);
        let cube = ColorCube::new(vec![Rgb::new(0, 0, 0), Rgb::new(0, 0, 10)], 0);
        assert_eq!(cube.widest_channel(), Channel::Blue);
    }

    #[test]
    fn split_is_a_disjoint_partition_along_the_channel() {
        let colors = vec![
            Rgb::new(5, 0, 0),
            Rgb::new(5, 1, 0),
            Rgb::new(5, 2, 0),
            Rgb::new(9, 0, 0),
            Rgb::new(1, 0, 0),
        ];
        let cube = ColorCube::new(colors.clone(), 0);
        assert_eq!(cube.volume(), 9 * 3);
        let (left, right) = cube.split(1);
        assert_eq!(left.colors.len() + right.colors.len(), colors.len());
        assert!(left.max[0] < right.min[0]);
        assert_eq!((left.seq, right.seq), (1, 2));
    }

    #[test]
    fn heap_ties_pop_the_earliest_cube() {
        let mut heap = BinaryHeap::new();
        for seq in [3, 1, 2] {
            let cube = ColorCube::new(vec![Rgb::new(0, 0, 0), Rgb::new(1, 0, 0)], seq);
            heap.push(QueuedCube::new(cube));
        }
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|q| q.cube.seq)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
