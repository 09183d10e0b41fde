use serde::{Deserialize, Serialize};

/// Aspect ratios strictly below this are portrait.
pub const PORTRAIT_MAX_RATIO: f64 = 0.85;
/// Aspect ratios strictly above this are landscape.
pub const LANDSCAPE_MIN_RATIO: f64 = 1.15;

/// Orientation class of a photo or frame, derived from its aspect ratio.
///
/// The band between the two thresholds is `Square`, so ratios that hover around
/// 1.0 never flip between portrait and landscape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
    Square,
}

impl Orientation {
    pub fn classify(aspect_ratio: f64) -> Self {
        Self::classify_with(aspect_ratio, PORTRAIT_MAX_RATIO, LANDSCAPE_MIN_RATIO)
    }

    pub fn classify_with(aspect_ratio: f64, portrait_max: f64, landscape_min: f64) -> Self {
        if aspect_ratio < portrait_max {
            Orientation::Portrait
        } else if aspect_ratio > landscape_min {
            Orientation::Landscape
        } else {
            Orientation::Square
        }
    }

    /// True for portrait↔landscape pairs. Square is adjacent to both.
    pub fn is_opposite(self, other: Orientation) -> bool {
        matches!(
            (self, other),
            (Orientation::Portrait, Orientation::Landscape)
                | (Orientation::Landscape, Orientation::Portrait)
        )
    }
}

/// An analyzed photo. Pages reference photos by `id` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub aspect_ratio: f64,
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl Photo {
    pub fn new(id: impl Into<String>, aspect_ratio: f64) -> Self {
        Self {
            id: id.into(),
            aspect_ratio,
            orientation: Orientation::classify(aspect_ratio),
            priority: None,
        }
    }
}

/// Photo metadata as supplied by a client. Either `aspect_ratio` or both
/// `width` and `height` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoInput {
    pub id: String,
    pub aspect_ratio: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub orientation: Option<Orientation>,
    pub priority: Option<u8>,
}

impl TryFrom<PhotoInput> for Photo {
    type Error = String;

    fn try_from(input: PhotoInput) -> Result<Self, Self::Error> {
        if input.id.trim().is_empty() {
            return Err("photo id cannot be empty".to_string());
        }

        let aspect_ratio = match (input.aspect_ratio, input.width, input.height) {
            (Some(ratio), _, _) => ratio,
            (None, Some(w), Some(h)) if w > 0 && h > 0 => w as f64 / h as f64,
            _ => {
                return Err(format!(
                    "photo '{}' needs an aspect_ratio or a positive width and height",
                    input.id
                ))
            }
        };

        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(format!(
                "photo '{}' has invalid aspect ratio {aspect_ratio}",
                input.id
            ));
        }

        Ok(Photo {
            orientation: input
                .orientation
                .unwrap_or_else(|| Orientation::classify(aspect_ratio)),
            id: input.id,
            aspect_ratio,
            priority: input.priority,
        })
    }
}

/// Converts client input into photos, rejecting invalid records and duplicate ids.
pub fn photos_from_inputs(inputs: Vec<PhotoInput>) -> Result<Vec<Photo>, String> {
    let mut seen = std::collections::HashSet::new();
    let mut photos = Vec::with_capacity(inputs.len());

    for input in inputs {
        let photo = Photo::try_from(input)?;
        if !seen.insert(photo.id.clone()) {
            return Err(format!("duplicate photo id '{}'", photo.id));
        }
        photos.push(photo);
    }

    Ok(photos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str, ratio: Option<f64>, w: Option<u32>, h: Option<u32>) -> PhotoInput {
        PhotoInput {
            id: id.to_string(),
            aspect_ratio: ratio,
            width: w,
            height: h,
            orientation: None,
            priority: None,
        }
    }

    #[test]
    fn test_classify_bands() {
        assert_eq!(Orientation::classify(0.5), Orientation::Portrait);
        assert_eq!(Orientation::classify(0.85), Orientation::Square);
        assert_eq!(Orientation::classify(1.0), Orientation::Square);
        assert_eq!(Orientation::classify(1.15), Orientation::Square);
        assert_eq!(Orientation::classify(1.5), Orientation::Landscape);
    }

    #[test]
    fn test_square_is_not_opposite_of_anything() {
        assert!(!Orientation::Square.is_opposite(Orientation::Portrait));
        assert!(!Orientation::Square.is_opposite(Orientation::Landscape));
        assert!(Orientation::Portrait.is_opposite(Orientation::Landscape));
    }

    #[test]
    fn test_aspect_ratio_derived_from_dimensions() {
        let photo = Photo::try_from(input("a", None, Some(4000), Some(3000))).unwrap();
        assert!((photo.aspect_ratio - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(photo.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_missing_ratio_and_dimensions_rejected() {
        assert!(Photo::try_from(input("a", None, Some(100), None)).is_err());
        assert!(Photo::try_from(input("a", Some(0.0), None, None)).is_err());
        assert!(Photo::try_from(input("", Some(1.0), None, None)).is_err());
    }

    #[test]
    fn test_supplied_orientation_wins() {
        let mut raw = input("a", Some(1.0), None, None);
        raw.orientation = Some(Orientation::Portrait);
        let photo = Photo::try_from(raw).unwrap();
        assert_eq!(photo.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = photos_from_inputs(vec![
            input("a", Some(1.0), None, None),
            input("a", Some(1.5), None, None),
        ]);
        assert!(result.unwrap_err().contains("duplicate"));
    }
}
