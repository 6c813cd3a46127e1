#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement resolver that commits per-tick displacements.
//!
//! The resolver never inspects geometry itself. Callers hand it a validity
//! predicate describing whether an entity may stand at a candidate offset, and
//! the resolver walks a fixed fallback ladder until the predicate accepts one.

use glam::Vec2;
use log::trace;
use tileworld_core::Resolution;

/// Displacement committed by the resolver together with the fallback used.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved {
    applied: Vec2,
    resolution: Resolution,
}

impl Resolved {
    /// Displacement that should be added to the entity's position.
    #[must_use]
    pub const fn applied(&self) -> Vec2 {
        self.applied
    }

    /// Fallback that produced the committed displacement.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Reports whether the entity stays where it was.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.resolution == Resolution::Blocked
    }

    fn blocked() -> Self {
        Self {
            applied: Vec2::ZERO,
            resolution: Resolution::Blocked,
        }
    }
}

/// Resolves a proposed displacement against the provided validity predicate.
///
/// The fallback ladder has four rungs, tried in a fixed order:
///
/// 1. the full displacement,
/// 2. the vertical component alone (horizontal reverted),
/// 3. the horizontal component alone (vertical reverted),
/// 4. no movement at all.
///
/// The first candidate accepted by `is_valid` is committed. The last rung
/// needs no check since the entity already stands where it is, so `is_valid`
/// is called at most three times and [`Resolution::Blocked`] reports that the
/// ladder ended on the fourth rung. `is_valid` receives the candidate
/// displacement, not an absolute position.
pub fn resolve<F>(delta: Vec2, mut is_valid: F) -> Resolved
where
    F: FnMut(Vec2) -> bool,
{
    if delta == Vec2::ZERO || !delta.is_finite() {
        return Resolved::blocked();
    }

    let candidates = [
        (delta, Resolution::Full),
        (Vec2::new(0.0, delta.y), Resolution::SlideVertical),
        (Vec2::new(delta.x, 0.0), Resolution::SlideHorizontal),
    ];

    for (index, (candidate, resolution)) in candidates.into_iter().enumerate() {
        if candidate == Vec2::ZERO {
            continue;
        }
        if candidates[..index]
            .iter()
            .any(|(earlier, _)| *earlier == candidate)
        {
            continue;
        }
        if is_valid(candidate) {
            trace!("resolved {delta:?} as {resolution:?}");
            return Resolved {
                applied: candidate,
                resolution,
            };
        }
    }

    trace!("displacement {delta:?} fully blocked");
    Resolved::blocked()
}
