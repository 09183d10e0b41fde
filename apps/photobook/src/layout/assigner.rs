//! Frame Assignment: places a batch of photos into the frames of one layout.
//!
//! Greedy approximation of maximum-weight bipartite matching: every
//! (photo, frame) pair is scored, pairs are walked best-first, and a pair is
//! taken when neither side is used yet. Deterministic for a given input order.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::catalog::Frame;
use crate::layout::fit::FitScorer;
use crate::models::page::Assignment;
use crate::models::photo::Photo;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Whether a layout attempt may leave frames empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Every frame must be filled, otherwise the layout is unsatisfiable.
    #[default]
    Strict,
    /// Frames whose remaining candidates were all rejected by scoring stay
    /// empty. At least one frame must still be filled.
    Relaxed,
}

impl FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Strictness::Strict),
            "relaxed" => Ok(Strictness::Relaxed),
            other => Err(format!("unknown strictness '{other}' (expected strict|relaxed)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Unsatisfiable {
    #[error("Unsatisfiable: {photos} photos for {frames} frames")]
    TooFewPhotos { photos: usize, frames: usize },

    #[error("Unsatisfiable: {empty} of {frames} frames have no acceptable photo")]
    FramesLeftEmpty { empty: usize, frames: usize },
}

/// Raw result of the greedy walk, before any success policy is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matching {
    /// Sorted by frame index.
    pub assignments: Vec<Assignment>,
    /// Photo ids that were not placed, in input order.
    pub unmatched_photos: Vec<String>,
    /// Frame indices left empty, ascending.
    pub empty_frames: Vec<usize>,
}

#[derive(Debug, Clone)]
struct ScoredPair {
    score: f64,
    frame_index: usize,
    frame_pos: usize,
    photo_pos: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Core matching
// ────────────────────────────────────────────────────────────────────────────

/// Greedy best-first matching. Pairs scoring 0 are never placed.
///
/// Ties are broken by frame index, then by the photo's position in `photos`.
pub fn greedy_match(photos: &[&Photo], frames: &[Frame], scorer: &dyn FitScorer) -> Matching {
    let mut pairs: Vec<ScoredPair> = Vec::with_capacity(photos.len() * frames.len());

    for (frame_pos, frame) in frames.iter().enumerate() {
        for (photo_pos, photo) in photos.iter().enumerate() {
            let score = scorer.score(photo, frame);
            if score > 0.0 {
                pairs.push(ScoredPair {
                    score,
                    frame_index: frame.index,
                    frame_pos,
                    photo_pos,
                });
            }
        }
    }

    pairs.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.frame_index.cmp(&b.frame_index))
            .then(a.photo_pos.cmp(&b.photo_pos))
    });

    let mut frame_used = vec![false; frames.len()];
    let mut photo_used = vec![false; photos.len()];
    let mut assignments = Vec::with_capacity(frames.len());

    for pair in &pairs {
        if assignments.len() == frames.len() {
            break;
        }
        if frame_used[pair.frame_pos] || photo_used[pair.photo_pos] {
            continue;
        }
        frame_used[pair.frame_pos] = true;
        photo_used[pair.photo_pos] = true;
        assignments.push(Assignment {
            frame_index: pair.frame_index,
            photo_id: photos[pair.photo_pos].id.clone(),
        });
    }

    assignments.sort_by_key(|a| a.frame_index);

    let unmatched_photos = photos
        .iter()
        .zip(&photo_used)
        .filter(|(_, used)| !**used)
        .map(|(p, _)| p.id.clone())
        .collect();

    let mut empty_frames: Vec<usize> = frames
        .iter()
        .zip(&frame_used)
        .filter(|(_, used)| !**used)
        .map(|(f, _)| f.index)
        .collect();
    empty_frames.sort_unstable();

    Matching {
        assignments,
        unmatched_photos,
        empty_frames,
    }
}

/// Places unmatched photos into empty frames in order, ignoring scores.
///
/// Used where dropping a photo is worse than a poor crop. Photos beyond the
/// number of empty frames stay in `unmatched_photos`.
pub fn force_fill(mut matching: Matching) -> Matching {
    let fill = matching.empty_frames.len().min(matching.unmatched_photos.len());
    let frames: Vec<usize> = matching.empty_frames.drain(..fill).collect();
    let photos: Vec<String> = matching.unmatched_photos.drain(..fill).collect();

    for (frame_index, photo_id) in frames.into_iter().zip(photos) {
        matching.assignments.push(Assignment {
            frame_index,
            photo_id,
        });
    }
    matching.assignments.sort_by_key(|a| a.frame_index);
    matching
}

// ────────────────────────────────────────────────────────────────────────────
// FrameAssigner
// ────────────────────────────────────────────────────────────────────────────

pub struct FrameAssigner<'a> {
    scorer: &'a dyn FitScorer,
    strictness: Strictness,
}

impl<'a> FrameAssigner<'a> {
    pub fn new(scorer: &'a dyn FitScorer, strictness: Strictness) -> Self {
        Self { scorer, strictness }
    }

    /// Assigns photos to every frame of a layout, or reports why it cannot.
    ///
    /// Callers treat `Unsatisfiable` as "try another layout"; a partial fill is
    /// only returned in `Relaxed` mode.
    pub fn assign(
        &self,
        photos: &[&Photo],
        frames: &[Frame],
    ) -> Result<Vec<Assignment>, Unsatisfiable> {
        if photos.len() < frames.len() {
            return Err(Unsatisfiable::TooFewPhotos {
                photos: photos.len(),
                frames: frames.len(),
            });
        }

        let matching = greedy_match(photos, frames, self.scorer);

        match self.strictness {
            Strictness::Strict if !matching.empty_frames.is_empty() => {
                Err(Unsatisfiable::FramesLeftEmpty {
                    empty: matching.empty_frames.len(),
                    frames: frames.len(),
                })
            }
            Strictness::Relaxed if matching.assignments.is_empty() => {
                Err(Unsatisfiable::FramesLeftEmpty {
                    empty: frames.len(),
                    frames: frames.len(),
                })
            }
            _ => Ok(matching.assignments),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::catalog::Layout;
    use crate::layout::fit::AspectFitScorer;

    fn photos(ratios: &[f64]) -> Vec<Photo> {
        ratios
            .iter()
            .enumerate()
            .map(|(i, &r)| Photo::new(format!("p{i}"), r))
            .collect()
    }

    fn refs(photos: &[Photo]) -> Vec<&Photo> {
        photos.iter().collect()
    }

    fn photo_in(assignments: &[Assignment], frame_index: usize) -> &str {
        assignments
            .iter()
            .find(|a| a.frame_index == frame_index)
            .map(|a| a.photo_id.as_str())
            .unwrap()
    }

    #[test]
    fn test_matches_by_aspect_ratio() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[1.5, 0.7, 1.0]);
        let ps = photos(&[1.0, 0.7, 1.5]);
        let result = FrameAssigner::new(&scorer, Strictness::Strict)
            .assign(&refs(&ps), &layout.frames)
            .unwrap();

        assert_eq!(photo_in(&result, 1), "p2");
        assert_eq!(photo_in(&result, 2), "p1");
        assert_eq!(photo_in(&result, 3), "p0");
    }

    #[test]
    fn test_too_few_photos_is_unsatisfiable() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[1.0, 1.0, 1.0]);
        let ps = photos(&[1.0, 1.0]);
        let result = FrameAssigner::new(&scorer, Strictness::Relaxed).assign(&refs(&ps), &layout.frames);
        assert_eq!(
            result,
            Err(Unsatisfiable::TooFewPhotos {
                photos: 2,
                frames: 3
            })
        );
    }

    #[test]
    fn test_strict_rejects_when_a_frame_only_has_rejected_candidates() {
        let scorer = AspectFitScorer::default();
        // Frame 2 is very wide; the only leftover photo is very tall → score 0.
        let layout = Layout::with_ratios("l", &[0.6, 2.0]);
        let ps = photos(&[0.6, 0.5]);
        let result = FrameAssigner::new(&scorer, Strictness::Strict).assign(&refs(&ps), &layout.frames);
        assert!(matches!(result, Err(Unsatisfiable::FramesLeftEmpty { empty: 1, frames: 2 })));
    }

    #[test]
    fn test_relaxed_leaves_rejected_frame_empty() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[0.6, 2.0]);
        let ps = photos(&[0.6, 0.5]);
        let result = FrameAssigner::new(&scorer, Strictness::Relaxed)
            .assign(&refs(&ps), &layout.frames)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].frame_index, 1);
    }

    #[test]
    fn test_relaxed_still_fails_when_nothing_fits() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[2.5]);
        let ps = photos(&[0.5]);
        let result = FrameAssigner::new(&scorer, Strictness::Relaxed).assign(&refs(&ps), &layout.frames);
        assert!(result.is_err());
    }

    #[test]
    fn test_ties_broken_by_frame_then_photo_order() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[1.0, 1.0]);
        let ps = photos(&[1.0, 1.0, 1.0]);
        let result = FrameAssigner::new(&scorer, Strictness::Strict)
            .assign(&refs(&ps), &layout.frames)
            .unwrap();
        assert_eq!(photo_in(&result, 1), "p0");
        assert_eq!(photo_in(&result, 2), "p1");
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[1.5, 1.5, 0.7, 1.0]);
        let ps = photos(&[1.4, 1.6, 0.7, 0.9, 1.0, 1.5]);
        let a = FrameAssigner::new(&scorer, Strictness::Strict).assign(&refs(&ps), &layout.frames);
        let b = FrameAssigner::new(&scorer, Strictness::Strict).assign(&refs(&ps), &layout.frames);
        assert_eq!(a, b);
    }

    #[test]
    fn test_frames_and_photos_used_once() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[1.0, 1.0, 1.0, 1.0]);
        let ps = photos(&[1.0; 6]);
        let result = FrameAssigner::new(&scorer, Strictness::Strict)
            .assign(&refs(&ps), &layout.frames)
            .unwrap();

        let mut frames: Vec<usize> = result.iter().map(|a| a.frame_index).collect();
        let mut ids: Vec<&str> = result.iter().map(|a| a.photo_id.as_str()).collect();
        frames.dedup();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(frames.len(), 4);
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_greedy_match_reports_leftovers() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[1.5, 2.0]);
        let ps = photos(&[1.5, 0.5, 0.4]);
        let matching = greedy_match(&refs(&ps), &layout.frames, &scorer);

        assert_eq!(matching.assignments.len(), 1);
        assert_eq!(matching.unmatched_photos, vec!["p1", "p2"]);
        assert_eq!(matching.empty_frames, vec![2]);
    }

    #[test]
    fn test_force_fill_places_leftovers_in_order() {
        let scorer = AspectFitScorer::default();
        let layout = Layout::with_ratios("l", &[1.5, 2.0, 2.0]);
        let ps = photos(&[1.5, 0.5]);
        let matching = force_fill(greedy_match(&refs(&ps), &layout.frames, &scorer));

        assert_eq!(matching.assignments.len(), 2);
        assert_eq!(photo_in(&matching.assignments, 2), "p1");
        assert!(matching.unmatched_photos.is_empty());
        assert_eq!(matching.empty_frames, vec![3]);
    }

    #[test]
    fn test_strictness_parses_from_config_strings() {
        assert_eq!("strict".parse::<Strictness>(), Ok(Strictness::Strict));
        assert_eq!(" Relaxed ".parse::<Strictness>(), Ok(Strictness::Relaxed));
        assert!("loose".parse::<Strictness>().is_err());
    }
}
