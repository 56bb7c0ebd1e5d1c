//! Friendly-Fire / Area Resolver
//!
//! Resolves the set of actors affected by an area ability:
//! - Sphere: every actor within `radius` of the center
//! - Cone: within `range` of the origin and within `half_angle` of the direction
//! - Line: projection onto the direction in `[0, range]` and perpendicular
//!   distance at most `width / 2`
//!
//! Ally/enemy classification comes from the `FactionProvider`. The global
//! friendly-fire switch overrides `include_allies` for harmful effects only.

use bevy::math::Vec3;
use std::collections::BTreeSet;

use super::ability::{ActorId, AreaShapeConfig, TargetHandle};
use super::world::{FactionProvider, PositionProvider};

/// Whether an area effect hurts or helps the actors it hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectIntent {
    Harmful,
    Beneficial,
}

/// An area shape placed in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AreaShape {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    Cone {
        origin: Vec3,
        direction: Vec3,
        range: f32,
        half_angle_degrees: f32,
    },
    Line {
        origin: Vec3,
        direction: Vec3,
        range: f32,
        width: f32,
    },
}

impl AreaShape {
    /// Place an authored shape. Spheres centre on the target position (or
    /// the caster when untargeted); cones and lines start at the caster and
    /// point at the target, falling back to `facing`.
    pub fn place(
        config: &AreaShapeConfig,
        caster_position: Vec3,
        target_position: Option<Vec3>,
        facing: Vec3,
    ) -> Self {
        let direction = target_position
            .map(|t| t - caster_position)
            .filter(|d| d.length_squared() > f32::EPSILON)
            .unwrap_or(facing);
        match *config {
            AreaShapeConfig::Sphere { radius } => AreaShape::Sphere {
                center: target_position.unwrap_or(caster_position),
                radius,
            },
            AreaShapeConfig::Cone {
                range,
                half_angle_degrees,
            } => AreaShape::Cone {
                origin: caster_position,
                direction,
                range,
                half_angle_degrees,
            },
            AreaShapeConfig::Line { range, width } => AreaShape::Line {
                origin: caster_position,
                direction,
                range,
                width,
            },
        }
    }

    /// Centre and radius of a sphere enclosing the shape, for the broad phase.
    fn bounds(&self) -> (Vec3, f32) {
        match *self {
            AreaShape::Sphere { center, radius } => (center, radius),
            AreaShape::Cone { origin, range, .. } => (origin, range),
            AreaShape::Line {
                origin,
                range,
                width,
                ..
            } => {
                let half = width * 0.5;
                (origin, (range * range + half * half).sqrt())
            }
        }
    }

    /// Exact containment test. Directional shapes with a zero direction
    /// contain nothing.
    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            AreaShape::Sphere { center, radius } => point.distance(center) <= radius,
            AreaShape::Cone {
                origin,
                direction,
                range,
                half_angle_degrees,
            } => {
                let Some(dir) = direction.try_normalize() else {
                    return false;
                };
                let offset = point - origin;
                let distance = offset.length();
                if distance > range {
                    return false;
                }
                if distance <= f32::EPSILON {
                    return true;
                }
                let cos = (offset / distance).dot(dir).clamp(-1.0, 1.0);
                cos.acos().to_degrees() <= half_angle_degrees
            }
            AreaShape::Line {
                origin,
                direction,
                range,
                width,
            } => {
                let Some(dir) = direction.try_normalize() else {
                    return false;
                };
                let offset = point - origin;
                let along = offset.dot(dir);
                if !(0.0..=range).contains(&along) {
                    return false;
                }
                let perpendicular = (offset - dir * along).length();
                perpendicular <= width * 0.5
            }
        }
    }

    fn is_degenerate(&self) -> bool {
        match *self {
            AreaShape::Sphere { .. } => false,
            AreaShape::Cone { direction, .. } | AreaShape::Line { direction, .. } => {
                direction.length_squared() <= f32::EPSILON
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AreaResolver {
    pub friendly_fire_enabled: bool,
}

impl AreaResolver {
    pub fn new(friendly_fire_enabled: bool) -> Self {
        Self {
            friendly_fire_enabled,
        }
    }

    /// Actors inside `shape`, filtered by the inclusion policy. The caster
    /// is never part of the result.
    pub fn targets_in_area<W>(
        &self,
        shape: &AreaShape,
        caster: ActorId,
        include_allies: bool,
        include_enemies: bool,
        intent: EffectIntent,
        world: &W,
    ) -> BTreeSet<TargetHandle>
    where
        W: FactionProvider + PositionProvider + ?Sized,
    {
        let mut result = BTreeSet::new();
        if shape.is_degenerate() {
            return result;
        }
        let allies_allowed = include_allies
            && (intent == EffectIntent::Beneficial || self.friendly_fire_enabled);

        let (center, radius) = shape.bounds();
        for candidate in world.actors_within(center, radius) {
            if candidate == caster {
                continue;
            }
            let Some(position) = world.position(candidate) else {
                continue;
            };
            if !shape.contains(position) {
                continue;
            }
            let allowed = if world.is_ally(caster, candidate) {
                allies_allowed
            } else {
                include_enemies
            };
            if allowed {
                result.insert(candidate);
            }
        }
        result
    }
}
