//! Content-aware crop search.
//!
//! The source is downscaled to an analysis image, turned into a feature map
//! (skin, detail, saturation) and block-averaged into a score map. Candidate
//! rectangles with the target aspect ratio are laid out on a fixed grid for a
//! range of scales, each is scored against the score map, and the best one is
//! mapped back to source coordinates.
//!
//! Scan order is scale descending from `max_scale`, then y ascending, then x
//! ascending; the first candidate with the highest total wins.
use std::borrow::Cow;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::params::{CropHeuristics, CropOptions};
use crate::core::processing::features::{self, DETAIL, FeatureMap, SATURATION, SKIN};
use crate::core::processing::render::{Compositor, ResizeCompositor, resize_buffer};
use crate::error::{Error, Result};
use crate::types::{BoostRegion, CropCandidate, PixelBuffer, ResampleFilter};

/// Score breakdown of one candidate.
///
/// `detail`, `skin` and `saturation` are the mean feature levels of the score
/// cells inside the crop, in `[0, 1]`. `boost` is the weighted boost overlap
/// per crop pixel and is never negative. `total` is the ranking value: it
/// weights every cell by its composition importance, which is negative
/// outside the crop and near its edges, so it can drop below zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CropScore {
    pub boost: f64,
    pub detail: f64,
    pub saturation: f64,
    pub skin: f64,
    pub total: f64,
}

/// Diagnostics returned when `CropOptions::debug` is set.
#[derive(Clone, Debug, PartialEq)]
pub struct CropDebug {
    /// Skin/detail/saturation of the analysis image in R/G/B
    pub feature_map: PixelBuffer,
    pub candidates: usize,
    pub analysis_width: u32,
    pub analysis_height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CropResult {
    pub crop: CropCandidate,
    pub score: CropScore,
    pub debug: Option<CropDebug>,
}

/// Candidate in analysis-image space.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Candidate {
    x: u32,
    y: u32,
    width: f64,
    height: f64,
    scale: f64,
}

impl Candidate {
    fn contains(&self, x: f64, y: f64) -> bool {
        let (cx, cy) = (self.x as f64, self.y as f64);
        cx <= x && x < cx + self.width && cy <= y && y < cy + self.height
    }
}

fn validate(buffer: &PixelBuffer, options: &CropOptions) -> Result<()> {
    if !(options.min_scale > 0.0 && options.min_scale <= 1.0) {
        return Err(Error::InvalidArgument {
            arg: "min_scale",
            value: options.min_scale.to_string(),
        });
    }
    for boost in &options.boosts {
        boost.validate()?;
    }
    if options.width == 0 || options.height == 0 {
        return Err(Error::invalid_dimensions(format!(
            "target size {}x{} must be non-zero",
            options.width, options.height
        )));
    }
    if buffer.is_empty() {
        return Err(Error::invalid_dimensions("source image has zero size"));
    }
    let min_w = options.width as f64 * options.min_scale;
    let min_h = options.height as f64 * options.min_scale;
    if (buffer.width() as f64) < min_w || (buffer.height() as f64) < min_h {
        return Err(Error::invalid_dimensions(format!(
            "source {}x{} is smaller than {:.0}x{:.0} (target {}x{} at min scale {})",
            buffer.width(),
            buffer.height(),
            min_w,
            min_h,
            options.width,
            options.height,
            options.min_scale
        )));
    }
    Ok(())
}

fn thirds(x: f64) -> f64 {
    let x = (((x - 1.0 / 3.0 + 1.0) % 2.0) * 0.5 - 0.5) * 16.0;
    (1.0 - x * x).max(0.0)
}

/// Weight of an analysis-space position for a candidate: negative outside,
/// center-weighted inside with a penalty near the crop edges, plus a bonus on
/// the thirds lines when enabled.
fn importance(h: &CropHeuristics, rule_of_thirds: bool, crop: &Candidate, x: f64, y: f64) -> f64 {
    if !crop.contains(x, y) {
        return h.outside_importance;
    }
    let x = (x - crop.x as f64) / crop.width;
    let y = (y - crop.y as f64) / crop.height;
    let px = (0.5 - x).abs() * 2.0;
    let py = (0.5 - y).abs() * 2.0;
    let dx = (px - 1.0 + h.edge_radius).max(0.0);
    let dy = (py - 1.0 + h.edge_radius).max(0.0);
    let d = (dx * dx + dy * dy) * h.edge_weight;
    let mut s = 1.41 - (px * px + py * py).sqrt();
    if rule_of_thirds {
        s += (s + d + 0.5).max(0.0) * 1.2 * (thirds(px) + thirds(py));
    }
    s + d
}

/// Everything needed to score candidates for one image and option set.
struct CropSearch<'a> {
    options: &'a CropOptions,
    source_width: u32,
    source_height: u32,
    /// Largest target-aspect rectangle that fits the source
    base_width: u32,
    base_height: u32,
    analysis_width: u32,
    analysis_height: u32,
    feature_map: FeatureMap,
    score_map: FeatureMap,
    candidates: Vec<Candidate>,
}

impl<'a> CropSearch<'a> {
    fn prepare(
        buffer: &PixelBuffer,
        options: &'a CropOptions,
        compositor: &mut dyn Compositor,
    ) -> Result<Self> {
        validate(buffer, options)?;
        let h = &options.heuristics;
        let (source_width, source_height) = (buffer.width(), buffer.height());

        let scale = (source_width as f64 / options.width as f64)
            .min(source_height as f64 / options.height as f64);
        let base_width = ((options.width as f64 * scale).floor() as u32).min(source_width);
        let base_height = ((options.height as f64 * scale).floor() as u32).min(source_height);
        if base_width == 0 || base_height == 0 {
            return Err(Error::invalid_dimensions(format!(
                "no {}x{} crop fits a {}x{} source",
                options.width, options.height, source_width, source_height
            )));
        }
        // Never go below the scale that would need upscaling to reach the target
        let min_scale = h.max_scale.min((1.0 / scale).max(options.min_scale));

        let prescale = if h.prescale {
            let target = h.prescale_size as f64;
            (target / source_width as f64)
                .max(target / source_height as f64)
                .min(1.0)
        } else {
            1.0
        };

        let analysis: Cow<'_, PixelBuffer> = if prescale < 1.0 {
            let width = ((source_width as f64 * prescale) as u32).max(1);
            let height = ((source_height as f64 * prescale) as u32).max(1);
            Cow::Owned(resize_buffer(compositor, buffer, width, height)?)
        } else {
            Cow::Borrowed(buffer)
        };
        let (analysis_width, analysis_height) = (analysis.width(), analysis.height());
        let crop_width = ((base_width as f64 * prescale).floor()).max(1.0);
        let crop_height = ((base_height as f64 * prescale).floor()).max(1.0);

        debug!(
            "Crop search: source {}x{}, base crop {}x{}, analysis {}x{} (prescale {:.4}), scales {:.2}..={:.2}",
            source_width,
            source_height,
            base_width,
            base_height,
            analysis_width,
            analysis_height,
            prescale,
            min_scale,
            h.max_scale
        );

        let feature_map = features::analyse(&analysis, h)?;
        let score_map = feature_map.down_sample(h.score_down_sample as usize);

        let candidates = generate_candidates(
            h,
            min_scale,
            crop_width,
            crop_height,
            analysis_width,
            analysis_height,
        );

        Ok(Self {
            options,
            source_width,
            source_height,
            base_width,
            base_height,
            analysis_width,
            analysis_height,
            feature_map,
            score_map,
            candidates,
        })
    }

    /// Map an analysis-space candidate into source pixels, keeping it in bounds.
    fn to_source(&self, candidate: &Candidate) -> CropCandidate {
        let width = ((self.base_width as f64 * candidate.scale).floor() as u32)
            .clamp(1, self.source_width);
        let height = ((self.base_height as f64 * candidate.scale).floor() as u32)
            .clamp(1, self.source_height);
        let sx = self.source_width as f64 / self.analysis_width as f64;
        let sy = self.source_height as f64 / self.analysis_height as f64;
        let x = ((candidate.x as f64 * sx).round() as u32).min(self.source_width - width);
        let y = ((candidate.y as f64 * sy).round() as u32).min(self.source_height - height);
        CropCandidate::new(x, y, width, height)
    }

    /// Weighted overlap with the boost regions, summed in source pixels.
    fn boost_overlap(&self, crop: &CropCandidate) -> f64 {
        // fold from +0.0: an empty sum() is -0.0
        self.options
            .boosts
            .iter()
            .map(|boost: &BoostRegion| crop.overlap_area(boost) * boost.weight)
            .fold(0.0, |acc, v| acc + v)
    }

    fn score(&self, candidate: &Candidate) -> CropScore {
        let h = &self.options.heuristics;
        let factor = h.score_down_sample.max(1) as f64;

        // importance-weighted sums for ranking, plain sums for the breakdown
        let (mut skin_w, mut detail_w, mut saturation_w) = (0.0, 0.0, 0.0);
        let (mut skin_in, mut detail_in, mut saturation_in) = (0.0, 0.0, 0.0);
        let mut cells_in = 0usize;

        for row in 0..self.score_map.height() {
            for col in 0..self.score_map.width() {
                let (x, y) = (col as f64 * factor, row as f64 * factor);
                let i = importance(h, self.options.rule_of_thirds, candidate, x, y);
                let detail = self.score_map.get(row, col, DETAIL) as f64 / 255.0;
                let skin = self.score_map.get(row, col, SKIN) as f64 / 255.0;
                let saturation = self.score_map.get(row, col, SATURATION) as f64 / 255.0;

                skin_w += skin * (detail + h.skin_bias) * i;
                detail_w += detail * i;
                saturation_w += saturation * (detail + h.saturation_bias) * i;

                if candidate.contains(x, y) {
                    skin_in += skin;
                    detail_in += detail;
                    saturation_in += saturation;
                    cells_in += 1;
                }
            }
        }

        let source_crop = self.to_source(candidate);
        let boost = self.boost_overlap(&source_crop) / source_crop.area() as f64;

        let analysis_area = candidate.width * candidate.height;
        let total = (detail_w * h.detail_weight
            + skin_w * h.skin_weight
            + saturation_w * h.saturation_weight)
            / analysis_area
            + boost * h.boost_weight;

        let mean = |sum: f64| if cells_in == 0 { 0.0 } else { sum / cells_in as f64 };
        CropScore {
            boost,
            detail: mean(detail_in),
            saturation: mean(saturation_in),
            skin: mean(skin_in),
            total,
        }
    }

    fn score_all(&self) -> Vec<CropScore> {
        #[cfg(feature = "parallel")]
        {
            self.candidates.par_iter().map(|c| self.score(c)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.candidates.iter().map(|c| self.score(c)).collect()
        }
    }
}

fn generate_candidates(
    h: &CropHeuristics,
    min_scale: f64,
    crop_width: f64,
    crop_height: f64,
    width: u32,
    height: u32,
) -> Vec<Candidate> {
    let step = h.step.max(1);
    let mut candidates = Vec::new();
    let mut i = 0u32;
    loop {
        let scale = h.max_scale - i as f64 * h.scale_step;
        // tolerance for the accumulated decimal step
        if scale < min_scale - 1e-9 || scale <= 0.0 {
            break;
        }
        let (cw, ch) = (crop_width * scale, crop_height * scale);
        let mut y = 0u32;
        while y as f64 + ch <= height as f64 {
            let mut x = 0u32;
            while x as f64 + cw <= width as f64 {
                candidates.push(Candidate {
                    x,
                    y,
                    width: cw,
                    height: ch,
                    scale,
                });
                x += step;
            }
            y += step;
        }
        if h.scale_step <= 0.0 {
            break;
        }
        i += 1;
    }
    candidates
}

/// Find the best crop for `options.width x options.height` using a default
/// bilinear compositor for the analysis prescale.
pub fn find_best_crop(buffer: &PixelBuffer, options: &CropOptions) -> Result<CropResult> {
    let mut compositor = ResizeCompositor::new(ResampleFilter::Bilinear);
    find_best_crop_with(buffer, options, &mut compositor)
}

/// Find the best crop, resampling the analysis image through `compositor`.
///
/// # Errors
///
/// * `InvalidArgument` when `min_scale` is outside `(0, 1]`
/// * `InvalidDimensions` when the source is smaller than the target at
///   `min_scale`, or no candidate fits
pub fn find_best_crop_with(
    buffer: &PixelBuffer,
    options: &CropOptions,
    compositor: &mut dyn Compositor,
) -> Result<CropResult> {
    let search = CropSearch::prepare(buffer, options, compositor)?;
    let scores = search.score_all();

    let mut best: Option<(usize, CropScore)> = None;
    for (index, score) in scores.iter().enumerate() {
        if options.debug {
            trace!("candidate {:?}: {:?}", search.candidates[index], score);
        }
        if best.is_none_or(|(_, top)| score.total > top.total) {
            best = Some((index, *score));
        }
    }

    let Some((index, score)) = best else {
        return Err(Error::invalid_dimensions(format!(
            "no crop candidate fits the {}x{} analysis image",
            search.analysis_width, search.analysis_height
        )));
    };
    let crop = search.to_source(&search.candidates[index]);

    debug!(
        "Best crop {}x{}+{}+{} of {} candidates, total {:.5}",
        crop.width,
        crop.height,
        crop.x,
        crop.y,
        search.candidates.len(),
        score.total
    );

    let debug = if options.debug {
        Some(CropDebug {
            feature_map: search.feature_map.to_pixel_buffer()?,
            candidates: search.candidates.len(),
            analysis_width: search.analysis_width,
            analysis_height: search.analysis_height,
        })
    } else {
        None
    };

    Ok(CropResult { crop, score, debug })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::filled(width, height, [128, 128, 128, 255])
    }

    /// Gray image with a solid red block spanning the full height.
    fn gray_with_red_block(width: u32, height: u32, x0: u32, x1: u32) -> PixelBuffer {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _y in 0..height {
            for x in 0..width {
                if (x0..x1).contains(&x) {
                    data.extend_from_slice(&[255, 0, 0, 255]);
                } else {
                    data.extend_from_slice(&[128, 128, 128, 255]);
                }
            }
        }
        PixelBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn exact_size_source_returns_the_full_image() {
        for (w, h) in [(300, 200), (600, 400), (64, 64)] {
            let result = find_best_crop(&gray(w, h), &CropOptions::new(w, h)).unwrap();
            assert_eq!(result.crop, CropCandidate::new(0, 0, w, h), "{w}x{h}");
        }
    }

    #[test]
    fn wide_source_square_target_stays_square_and_in_bounds() {
        let source = gray(1000, 500);
        let result = find_best_crop(&source, &CropOptions::new(200, 200)).unwrap();
        let crop = result.crop;
        assert_eq!(crop.width, crop.height);
        assert_eq!(crop.width, 500);
        assert!(crop.fits_within(1000, 500));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let source = gray_with_red_block(320, 180, 200, 260);
        let options = CropOptions::new(100, 100).with_min_scale(0.5);
        let first = find_best_crop(&source, &options).unwrap();
        let second = find_best_crop(&source, &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.score.total.to_bits(), second.score.total.to_bits());
    }

    #[test]
    fn saturated_subject_pulls_the_crop() {
        let source = gray_with_red_block(300, 100, 220, 280);
        let result = find_best_crop(&source, &CropOptions::new(100, 100)).unwrap();
        assert!(result.crop.x >= 150, "crop {:?}", result.crop);
    }

    #[test]
    fn boost_region_pulls_the_crop() {
        let boost = BoostRegion {
            x: 300.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            weight: 1.0,
        };
        let options = CropOptions::new(100, 100).with_boost(boost);
        let result = find_best_crop(&gray(400, 100), &options).unwrap();
        assert!(result.crop.x >= 250, "crop {:?}", result.crop);
        assert!(result.score.boost > 0.0);
    }

    #[test]
    fn boost_is_monotone_in_weight() {
        let source = gray_with_red_block(400, 240, 40, 90);
        let region = BoostRegion {
            x: 120.0,
            y: 30.0,
            width: 150.0,
            height: 120.0,
            weight: 0.2,
        };
        let light = CropOptions::new(120, 120).with_min_scale(0.6).with_boost(region);
        let heavy = CropOptions::new(120, 120)
            .with_min_scale(0.6)
            .with_boost(BoostRegion { weight: 0.9, ..region });

        let mut compositor = ResizeCompositor::default();
        let light_search = CropSearch::prepare(&source, &light, &mut compositor).unwrap();
        let heavy_search = CropSearch::prepare(&source, &heavy, &mut compositor).unwrap();
        assert_eq!(light_search.candidates, heavy_search.candidates);

        let mut overlapping = 0;
        for candidate in &light_search.candidates {
            let a = light_search.score(candidate);
            let b = heavy_search.score(candidate);
            assert!(b.boost >= a.boost);
            if a.boost > 0.0 {
                overlapping += 1;
                assert!(b.boost > a.boost);
            }
            assert_eq!(a.detail, b.detail);
        }
        assert!(overlapping > 0);
    }

    #[test]
    fn score_components_are_non_negative_means() {
        let source = gray_with_red_block(300, 200, 120, 180);
        let options = CropOptions::new(100, 100).with_min_scale(0.5);
        let mut compositor = ResizeCompositor::default();
        let search = CropSearch::prepare(&source, &options, &mut compositor).unwrap();
        for candidate in &search.candidates {
            let score = search.score(candidate);
            for value in [score.detail, score.skin, score.saturation] {
                assert!((0.0..=1.0).contains(&value), "{score:?}");
            }
            assert!(score.boost.is_sign_positive() && score.boost == 0.0);
        }

        // exact-size gray source: the one candidate still reports clean components
        let result = find_best_crop(&gray(300, 200), &CropOptions::new(300, 200)).unwrap();
        assert!(result.score.detail >= 0.0);
        assert!(result.score.boost.is_sign_positive());
        assert_eq!(result.score.saturation, 0.0);
    }

    #[test]
    fn full_boost_overlap_reports_the_weight() {
        let boost = BoostRegion {
            x: 0.0,
            y: 0.0,
            width: 400.0,
            height: 100.0,
            weight: 0.5,
        };
        let result =
            find_best_crop(&gray(400, 100), &CropOptions::new(100, 100).with_boost(boost)).unwrap();
        assert_eq!(result.score.boost, 0.5);
    }

    #[test]
    fn invalid_boost_regions_are_rejected() {
        let bad = [
            BoostRegion { x: 0.0, y: 0.0, width: 10.0, height: 10.0, weight: 1.5 },
            BoostRegion { x: 0.0, y: 0.0, width: f64::NAN, height: 10.0, weight: 0.5 },
            BoostRegion { x: f64::INFINITY, y: 0.0, width: 10.0, height: 10.0, weight: 0.5 },
            BoostRegion { x: 0.0, y: 0.0, width: -1.0, height: 10.0, weight: 0.5 },
        ];
        for boost in bad {
            let err = find_best_crop(&gray(100, 100), &CropOptions::new(50, 50).with_boost(boost))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArgument { arg: "boost", .. }), "{boost:?}");
        }
    }

    #[test]
    fn candidates_scan_scale_then_rows_then_columns() {
        let h = CropHeuristics::default();
        let candidates = generate_candidates(&h, 0.8, 16.0, 16.0, 32, 24);
        assert_eq!(candidates[0], Candidate { x: 0, y: 0, width: 16.0, height: 16.0, scale: 1.0 });
        assert_eq!((candidates[1].x, candidates[1].y), (8, 0));
        assert_eq!((candidates[3].x, candidates[3].y), (0, 8));
        let scales: Vec<f64> = candidates.iter().map(|c| c.scale).collect();
        assert!(scales.windows(2).all(|w| w[0] >= w[1]));
        assert!((scales.last().copied().unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn rule_of_thirds_only_changes_inside_weights() {
        let h = CropHeuristics::default();
        let crop = Candidate { x: 0, y: 0, width: 90.0, height: 90.0, scale: 1.0 };
        let on_third = importance(&h, true, &crop, 30.0, 45.0);
        let plain = importance(&h, false, &crop, 30.0, 45.0);
        assert!(on_third > plain);
        assert_eq!(importance(&h, true, &crop, 95.0, 10.0), h.outside_importance);
    }

    #[test]
    fn thirds_bonus_follows_the_candidate() {
        let h = CropHeuristics::default();
        let left = Candidate { x: 0, y: 0, width: 90.0, height: 90.0, scale: 1.0 };
        let shifted = Candidate { x: 60, ..left };
        assert_eq!(
            importance(&h, true, &shifted, 90.0, 45.0),
            importance(&h, true, &left, 30.0, 45.0)
        );
        assert!(importance(&h, true, &shifted, 60.0, 45.0) < importance(&h, true, &left, 30.0, 45.0));
    }

    #[test]
    fn source_smaller_than_target_is_invalid_dimensions() {
        let err = find_best_crop(&gray(100, 100), &CropOptions::new(200, 200)).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));

        let ok = find_best_crop(&gray(100, 100), &CropOptions::new(200, 200).with_min_scale(0.5))
            .unwrap();
        assert_eq!(ok.crop, CropCandidate::new(0, 0, 100, 100));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        let err = find_best_crop(&gray(10, 10), &CropOptions::new(0, 10)).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));
        let err = find_best_crop(&gray(10, 10), &CropOptions::new(5, 5).with_min_scale(0.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { arg: "min_scale", .. }));
    }

    #[test]
    fn debug_returns_the_feature_map() {
        let options = CropOptions::new(200, 200).with_debug(true);
        let result = find_best_crop(&gray(1000, 500), &options).unwrap();
        let debug = result.debug.expect("debug output");
        assert_eq!((debug.analysis_width, debug.analysis_height), (512, 256));
        assert_eq!(debug.feature_map.width(), 512);
        assert_eq!(debug.candidates, 33);

        let quiet = find_best_crop(&gray(1000, 500), &CropOptions::new(200, 200)).unwrap();
        assert!(quiet.debug.is_none());
        assert_eq!(quiet.crop, result.crop);
    }
}
