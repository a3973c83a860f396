//! Body vs. platform contact classification.

use serde::{Deserialize, Serialize};

use crate::body::AgentBody;
use crate::level::{Level, Platform, PlatformId};

/// Contact class for a single (body, platform) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    None,
    Land,
    Slide,
}

/// Result of the per-tick collision pass over a whole level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collision {
    None,
    Land(PlatformId),
    Slide(PlatformId),
}

impl Collision {
    pub fn platform(self) -> Option<PlatformId> {
        match self {
            Self::None => None,
            Self::Land(id) | Self::Slide(id) => Some(id),
        }
    }

    pub fn landed_on(self) -> Option<PlatformId> {
        match self {
            Self::Land(id) => Some(id),
            Self::None | Self::Slide(_) => None,
        }
    }
}

#[inline]
fn overlaps(body: &AgentBody, platform: &Platform) -> bool {
    body.right() > platform.left()
        && body.x < platform.right()
        && body.bottom() >= platform.top()
        && body.y < platform.bottom()
}

/// Classifies the contact without touching the body. Land wins over Slide
/// when the body is moving down (or resting) and its bottom edge sits within
/// `tolerance` pixels below the platform top.
pub fn classify(body: &AgentBody, platform: &Platform, tolerance: f64) -> Contact {
    if !overlaps(body, platform) {
        return Contact::None;
    }
    let bottom = body.bottom();
    if body.vel_y >= 0.0 && bottom >= platform.top() && bottom <= platform.top() + tolerance {
        Contact::Land
    } else {
        Contact::Slide
    }
}

/// Tests platforms in level order and applies the first non-`None` contact.
///
/// Land snaps the body onto the platform, Slide damps horizontal velocity by
/// `friction` and leaves the body airborne.
pub fn resolve(body: &mut AgentBody, level: &Level, tolerance: f64, friction: f64) -> Collision {
    for (id, platform) in level.iter() {
        match classify(body, platform, tolerance) {
            Contact::None => continue,
            Contact::Land => {
                body.snap_onto(platform);
                return Collision::Land(id);
            }
            Contact::Slide => {
                body.damp_horizontal(friction);
                body.grounded = false;
                return Collision::Slide(id);
            }
        }
    }
    Collision::None
}
