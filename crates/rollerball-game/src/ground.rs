//! Ground classification
//!
//! Picks the ground normal out of the contacts touching the ball and sorts the
//! surface into flat, slope or steep by its angle to the up direction.

use glam::Vec3;
use rollerball_core::math::{angle_deg, is_zero};
use rollerball_physics::ContactPoint;
use serde::{Deserialize, Serialize};

use crate::profile::MovementProfile;

/// Steepness category of the surface under the ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundTilt {
    /// Angle in `[0, min_slope_angle]`
    Flat,
    /// Angle in `(min_slope_angle, max_slope_angle]`
    Slope,
    /// Angle in `(max_slope_angle, 90]`
    Steep,
}

/// A movement profile that applies on slopes within an angle range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeBand {
    /// Exclusive lower bound in degrees
    pub lower_angle: f32,
    /// Inclusive upper bound in degrees
    pub higher_angle: f32,
    /// Steering parameters on this band
    pub profile: MovementProfile,
}

impl Default for SlopeBand {
    fn default() -> Self {
        Self {
            lower_angle: 0.0,
            higher_angle: 45.0,
            profile: MovementProfile::default(),
        }
    }
}

impl SlopeBand {
    /// Whether `angle` falls inside `(lower, higher]`
    pub fn contains(&self, angle: f32) -> bool {
        angle > self.lower_angle && angle <= self.higher_angle
    }
}

/// Make bands contiguous and non-overlapping inside `[min_angle, max_angle]`.
///
/// The first band is clamped into the range, every later band starts where
/// the previous one ends.
pub fn normalize_bands(bands: &mut [SlopeBand], min_angle: f32, max_angle: f32) {
    let mut previous_higher = None;
    for band in bands.iter_mut() {
        match previous_higher {
            None => {
                band.lower_angle = band.lower_angle.clamp(min_angle, max_angle);
            }
            Some(higher) => band.lower_angle = higher,
        }
        band.higher_angle = band.higher_angle.clamp(band.lower_angle, max_angle);
        previous_higher = Some(band.higher_angle);
    }
}

/// Index of the band containing `angle`, if any
pub fn band_for_angle(bands: &[SlopeBand], angle: f32) -> Option<usize> {
    bands.iter().position(|band| band.contains(angle))
}

/// Result of classifying one tick's contacts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundContact {
    /// Unit normal of the best ground contact, or zero
    pub normal: Vec3,
    /// Unit normal of the steepest contact past the slope limit, or zero
    pub overslope: Vec3,
}

/// Sorts contacts into ground and overslope, and surfaces into tilt categories
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundClassifier {
    /// Largest angle still treated as flat ground
    pub min_slope_angle: f32,
    /// Largest angle still treated as a climbable slope
    pub max_slope_angle: f32,
}

impl GroundClassifier {
    pub fn new(min_slope_angle: f32, max_slope_angle: f32) -> Self {
        Self {
            min_slope_angle,
            max_slope_angle,
        }
    }

    /// Choose the ground and overslope normals among `contacts`.
    ///
    /// The ground normal is the contact closest to `up` within 90°; on ties
    /// the later contact wins. Contacts steeper than the slope limit are
    /// overslope candidates, the steepest of them wins.
    pub fn classify(&self, contacts: &[ContactPoint], up: Vec3) -> GroundContact {
        let mut result = GroundContact::default();
        let mut best_ground = f32::INFINITY;
        let mut best_overslope = f32::NEG_INFINITY;

        for contact in contacts {
            let Some(normal) = contact.normal.try_normalize() else {
                continue;
            };
            let angle = angle_deg(normal, up);

            if angle <= 90.0 && angle <= best_ground {
                best_ground = angle;
                result.normal = normal;
            }
            if angle > self.max_slope_angle && angle >= best_overslope {
                best_overslope = angle;
                result.overslope = normal;
            }
        }

        result
    }

    /// Tilt category for a surface at `angle` degrees, `None` past 90°
    pub fn tilt_for_angle(&self, angle: f32) -> Option<GroundTilt> {
        if angle <= self.min_slope_angle {
            Some(GroundTilt::Flat)
        } else if angle <= self.max_slope_angle {
            Some(GroundTilt::Slope)
        } else if angle <= 90.0 {
            Some(GroundTilt::Steep)
        } else {
            None
        }
    }

    /// Tilt category of `normal` measured against `up`
    pub fn tilt(&self, normal: Vec3, up: Vec3) -> Option<GroundTilt> {
        if is_zero(normal) {
            return None;
        }
        self.tilt_for_angle(angle_deg(normal, up))
    }

    /// Control factor in `[0, 1]` that fades steering out between the
    /// minimum and maximum slope angle
    pub fn auto_slope_modifier(&self, angle: f32) -> f32 {
        let range = self.max_slope_angle - self.min_slope_angle;
        if range <= 0.0 {
            return if angle <= self.min_slope_angle { 1.0 } else { 0.0 };
        }
        1.0 - ((angle - self.min_slope_angle) / range).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use rollerball_physics::SurfaceId;

    fn contact(normal: Vec3) -> ContactPoint {
        ContactPoint::new(normal, Vec3::ZERO, SurfaceId::default())
    }

    fn tilted(degrees: f32) -> Vec3 {
        Quat::from_rotation_x(degrees.to_radians()) * Vec3::Y
    }

    #[test]
    fn test_tilt_boundaries() {
        let classifier = GroundClassifier::new(10.0, 45.0);
        assert_eq!(classifier.tilt_for_angle(0.0), Some(GroundTilt::Flat));
        assert_eq!(classifier.tilt_for_angle(10.0), Some(GroundTilt::Flat));
        assert_eq!(classifier.tilt_for_angle(30.0), Some(GroundTilt::Slope));
        assert_eq!(classifier.tilt_for_angle(45.0), Some(GroundTilt::Slope));
        assert_eq!(classifier.tilt_for_angle(60.0), Some(GroundTilt::Steep));
        assert_eq!(classifier.tilt_for_angle(90.0), Some(GroundTilt::Steep));
        assert_eq!(classifier.tilt_for_angle(120.0), None);
    }

    #[test]
    fn test_classify_picks_flattest() {
        let classifier = GroundClassifier::new(10.0, 45.0);
        let contacts = [contact(tilted(60.0)), contact(tilted(5.0)), contact(tilted(30.0))];
        let ground = classifier.classify(&contacts, Vec3::Y);

        assert!(ground.normal.abs_diff_eq(tilted(5.0), 1e-5));
        assert!(ground.overslope.abs_diff_eq(tilted(60.0), 1e-5));
    }

    #[test]
    fn test_classify_ignores_ceilings() {
        let classifier = GroundClassifier::new(10.0, 45.0);
        let ground = classifier.classify(&[contact(Vec3::NEG_Y)], Vec3::Y);
        assert_eq!(ground.normal, Vec3::ZERO);
        assert_eq!(ground.overslope, Vec3::NEG_Y);
    }

    #[test]
    fn test_ground_normal_is_unit_or_zero() {
        let classifier = GroundClassifier::new(10.0, 45.0);
        let ground = classifier.classify(&[contact(Vec3::new(0.0, 3.0, 0.0))], Vec3::Y);
        assert!((ground.normal.length() - 1.0).abs() < 1e-6);

        let none = classifier.classify(&[], Vec3::Y);
        assert_eq!(none.normal.length(), 0.0);
    }

    #[test]
    fn test_equal_angles_last_wins() {
        let classifier = GroundClassifier::new(10.0, 45.0);
        let a = Quat::from_rotation_x(0.3) * Vec3::Y;
        let b = Quat::from_rotation_z(0.3) * Vec3::Y;
        let ground = classifier.classify(&[contact(a), contact(b)], Vec3::Y);
        assert!(ground.normal.abs_diff_eq(b, 1e-6));
    }

    #[test]
    fn test_auto_slope_modifier() {
        let classifier = GroundClassifier::new(10.0, 50.0);
        assert_eq!(classifier.auto_slope_modifier(5.0), 1.0);
        assert!((classifier.auto_slope_modifier(30.0) - 0.5).abs() < 1e-6);
        assert_eq!(classifier.auto_slope_modifier(80.0), 0.0);
    }

    #[test]
    fn test_normalize_bands_contiguous() {
        let mut bands = vec![
            SlopeBand {
                lower_angle: 0.0,
                higher_angle: 20.0,
                ..Default::default()
            },
            SlopeBand {
                lower_angle: 35.0,
                higher_angle: 15.0,
                ..Default::default()
            },
            SlopeBand {
                lower_angle: 0.0,
                higher_angle: 90.0,
                ..Default::default()
            },
        ];
        normalize_bands(&mut bands, 10.0, 45.0);

        assert_eq!(bands[0].lower_angle, 10.0);
        assert_eq!(bands[0].higher_angle, 20.0);
        assert_eq!(bands[1].lower_angle, 20.0);
        assert_eq!(bands[1].higher_angle, 20.0);
        assert_eq!(bands[2].lower_angle, 20.0);
        assert_eq!(bands[2].higher_angle, 45.0);

        assert_eq!(band_for_angle(&bands, 30.0), Some(2));
        assert_eq!(band_for_angle(&bands, 15.0), Some(0));
        assert_eq!(band_for_angle(&bands, 5.0), None);
    }
}
