//! Fit Scoring: pluggable, trait-based scorer measuring how well a photo fits a frame.
//!
//! Default: `AspectFitScorer` (pure, deterministic, fully testable).
//!
//! `AppState` holds an `Arc<dyn FitScorer>`; the assigner, composer, edit
//! operations and plan validation all take `&dyn FitScorer`.

use serde::{Deserialize, Serialize};

use crate::layout::catalog::Frame;
use crate::models::photo::{Orientation, Photo, LANDSCAPE_MIN_RATIO, PORTRAIT_MAX_RATIO};

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Compatibility between one photo and one frame. Higher is better; `0.0`
/// means the pair must never be placed.
pub trait FitScorer: Send + Sync {
    fn score(&self, photo: &Photo, frame: &Frame) -> f64;

    /// Short label for logs and plan reports.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// Thresholds
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitThresholds {
    pub portrait_max: f64,
    pub landscape_min: f64,
    /// Multiplier for portrait↔landscape placements.
    pub opposite_penalty: f64,
    /// Multiplier for portrait↔landscape placements beyond `severe_diff`.
    pub severe_opposite_penalty: f64,
    pub severe_diff: f64,
    /// Multiplier when exactly one side is square.
    pub adjacent_penalty: f64,
    /// Opposite orientation beyond this aspect difference scores 0.
    pub reject_diff: f64,
    /// Landscape photos get `1 + group_boost * area` in frames with an area.
    pub group_boost: f64,
}

impl Default for FitThresholds {
    fn default() -> Self {
        Self {
            portrait_max: PORTRAIT_MAX_RATIO,
            landscape_min: LANDSCAPE_MIN_RATIO,
            opposite_penalty: 0.1,
            severe_opposite_penalty: 0.01,
            severe_diff: 0.5,
            adjacent_penalty: 0.8,
            reject_diff: 0.75,
            group_boost: 0.5,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AspectFitScorer (default implementation)
// ────────────────────────────────────────────────────────────────────────────

/// Aspect-ratio scorer.
///
/// Algorithm:
/// 1. diff = |photo ratio − frame ratio|, base = 1 / (1 + diff²)
/// 2. portrait↔landscape → ×0.1 (×0.01 past diff 0.5), rejected (0) past diff 0.75
/// 3. square vs. non-square → ×0.8
/// 4. landscape photo in a frame with an area → ×(1 + 0.5 × area)
#[derive(Debug, Clone, Default)]
pub struct AspectFitScorer {
    pub thresholds: FitThresholds,
}

impl AspectFitScorer {
    pub fn classify(&self, aspect_ratio: f64) -> Orientation {
        Orientation::classify_with(
            aspect_ratio,
            self.thresholds.portrait_max,
            self.thresholds.landscape_min,
        )
    }
}

impl FitScorer for AspectFitScorer {
    fn score(&self, photo: &Photo, frame: &Frame) -> f64 {
        compute_aspect_fit(self, photo, frame)
    }

    fn backend(&self) -> &'static str {
        "aspect"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core scoring
// ────────────────────────────────────────────────────────────────────────────

fn compute_aspect_fit(scorer: &AspectFitScorer, photo: &Photo, frame: &Frame) -> f64 {
    let t = &scorer.thresholds;
    let aspect_diff = (photo.aspect_ratio - frame.target_aspect_ratio).abs();

    let photo_class = scorer.classify(photo.aspect_ratio);
    let frame_class = scorer.classify(frame.target_aspect_ratio);

    if photo_class.is_opposite(frame_class) && aspect_diff > t.reject_diff {
        return 0.0;
    }

    let mut score = 1.0 / (1.0 + aspect_diff * aspect_diff);

    if photo_class.is_opposite(frame_class) {
        score *= if aspect_diff > t.severe_diff {
            t.severe_opposite_penalty
        } else {
            t.opposite_penalty
        };
    } else if photo_class != frame_class {
        score *= t.adjacent_penalty;
    }

    if photo_class == Orientation::Landscape {
        if let Some(area) = frame.area {
            score *= 1.0 + t.group_boost * area;
        }
    }

    score
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ratio: f64) -> Frame {
        Frame {
            index: 1,
            target_aspect_ratio: ratio,
            area: None,
        }
    }

    fn frame_with_area(ratio: f64, area: f64) -> Frame {
        Frame {
            index: 1,
            target_aspect_ratio: ratio,
            area: Some(area),
        }
    }

    fn score(photo_ratio: f64, frame: &Frame) -> f64 {
        AspectFitScorer::default().score(&Photo::new("p", photo_ratio), frame)
    }

    #[test]
    fn test_exact_match_scores_one() {
        assert!((score(1.5, &frame(1.5)) - 1.0).abs() < 1e-12);
        assert!((score(0.7, &frame(0.7)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_strictly_decreases_with_distance_within_class() {
        // Landscape frame, landscape photos on both sides of the target.
        let f = frame(1.6);
        let photos = [1.6, 1.7, 1.85, 2.1, 2.6, 3.5];
        let scores: Vec<f64> = photos.iter().map(|&r| score(r, &f)).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] > pair[1], "scores not decreasing: {scores:?}");
        }

        // Portrait frame, portrait photos moving away below the target.
        let f = frame(0.8);
        let scores: Vec<f64> = [0.8, 0.7, 0.6, 0.45, 0.3].iter().map(|&r| score(r, &f)).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] > pair[1], "scores not decreasing: {scores:?}");
        }
    }

    #[test]
    fn test_monotonic_with_area_boost_inside_landscape_class() {
        let f = frame_with_area(1.5, 0.4);
        assert!(score(1.5, &f) > score(1.2, &f));
        assert!(score(1.2, &f) > score(2.0, &f));
        assert!(score(1.6, &f) > score(1.9, &f));
    }

    #[test]
    fn test_orientation_guard_at_equal_distance() {
        // Portrait photo 0.8, landscape frame 1.3 (diff 0.5) vs portrait frame 0.3 (diff 0.5)
        let photo = 0.8;
        let mismatched = score(photo, &frame(1.3));
        let matched = score(photo, &frame(0.3));
        assert!(mismatched < matched, "{mismatched} !< {matched}");

        // Landscape photo 1.25 vs portrait frame 0.75 (diff 0.5) vs landscape frame 1.75
        let mismatched = score(1.25, &frame(0.75));
        let matched = score(1.25, &frame(1.75));
        assert!(mismatched < matched);
    }

    #[test]
    fn test_orientation_guard_holds_across_a_grid() {
        let scorer = AspectFitScorer::default();
        for p in [0.3_f64, 0.5, 0.6, 0.7, 0.8, 0.84] {
            for f in [1.21, 1.3, 1.5, 1.8, 2.5] {
                let diff = f - p;
                let matched_ratio = (p - diff).max(0.01);
                let photo = Photo::new("p", p);
                let mismatched = scorer.score(&photo, &frame(f));
                let matched = scorer.score(&photo, &frame(matched_ratio));
                if p - diff > 0.0 {
                    assert!(mismatched < matched, "p={p} f={f}");
                } else {
                    // No portrait frame exists at that distance; still heavily penalised.
                    assert!(mismatched <= 0.1);
                }
            }
        }
    }

    #[test]
    fn test_hard_rejection_for_severe_opposite_mismatch() {
        assert_eq!(score(0.5, &frame(1.5)), 0.0);
        assert_eq!(score(2.0, &frame(0.7)), 0.0);
    }

    #[test]
    fn test_no_rejection_for_square_frames() {
        // Square is adjacent to both classes, never opposite.
        assert!(score(0.3, &frame(1.0)) > 0.0);
        assert!(score(3.0, &frame(1.0)) > 0.0);
    }

    #[test]
    fn test_severe_penalty_stronger_than_mild() {
        // diff 0.4 (mild) vs diff 0.6 (severe), both opposite
        let mild = score(0.8, &frame(1.2));
        let severe = score(0.8, &frame(1.4));
        assert!(mild > severe * 5.0);
    }

    #[test]
    fn test_adjacent_penalty_applied() {
        let s = score(1.0, &frame(0.8));
        let expected = 1.0 / (1.0 + 0.2_f64 * 0.2) * 0.8;
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn test_group_boost_only_for_landscape_photos() {
        let big = frame_with_area(1.5, 0.6);
        let plain = frame(1.5);
        assert!(score(1.5, &big) > score(1.5, &plain));

        let big_portrait = frame_with_area(0.7, 0.6);
        let plain_portrait = frame(0.7);
        assert_eq!(score(0.7, &big_portrait), score(0.7, &plain_portrait));
    }

    #[test]
    fn test_group_boost_prefers_larger_frame() {
        let large = frame_with_area(1.5, 0.5);
        let small = frame_with_area(1.5, 0.1);
        assert!(score(1.6, &large) > score(1.6, &small));
    }

    #[test]
    fn test_scores_never_negative() {
        for p in [0.1, 0.5, 1.0, 1.5, 4.0] {
            for f in [0.2, 0.7, 1.0, 1.5, 3.0] {
                assert!(score(p, &frame(f)) >= 0.0);
            }
        }
    }

    #[test]
    fn test_backend_label() {
        assert_eq!(AspectFitScorer::default().backend(), "aspect");
    }
}
