/*
 * Boid Module
 *
 * This module defines the Boid struct and its per-tick steering update.
 * Each tick a boid:
 * 1. Turns toward the target and picks a forward speed proportional to the
 *    distance (a spring)
 * 2. Blends its velocity toward that forward velocity
 * 3. Applies the flocking rules against its neighbors: cohesion, alignment
 *    and separation
 * 4. Flees a nearby predator and is pushed back from the volume boundary
 * 5. Is damped, speed-limited, jittered and integrated
 *
 * Boids never read each other directly. Neighbors arrive as Neighbor
 * snapshots taken before the tick started, which is what allows the whole
 * flock to be updated in parallel.
 */

use glam::{Quat, Vec3};
use rand::Rng;

use crate::params::SimulationParams;
use crate::target::Target;

// Per-tick copy of another agent's state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub position: Vec3,
    pub velocity: Vec3,
}

// Everything outside the flock that a boid reacts to
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    pub target: &'a Target,
    pub predator: Option<Vec3>,
    pub params: &'a SimulationParams,
}

// What the flocking rules saw and applied during one update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlockReport {
    pub cohesion_count: usize,
    pub separation_count: usize,
    pub cohesion: Vec3,
    pub alignment: Vec3,
    pub separation: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boid {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
    pub speed: f32,
}

impl Boid {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            orientation: Quat::IDENTITY,
            speed: 0.0,
        }
    }

    // Random position inside +/- extent with a random velocity in the unit cube
    pub fn random<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> Self {
        let position = Vec3::new(
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
        );
        let velocity = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        Self::new(position, velocity)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    pub fn snapshot(&self, index: usize) -> Neighbor {
        Neighbor { index, position: self.position, velocity: self.velocity }
    }

    // Advance this boid by one tick. `self_index` is skipped if it shows up
    // in `neighbors`.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        neighbors: &[Neighbor],
        self_index: usize,
        dt: f32,
        env: &Environment<'_>,
        rng: &mut R,
    ) -> FlockReport {
        let params = env.params;

        self.seek(env.target.position, params);

        // Steering: exponential smoothing toward the desired forward velocity
        let desired = self.forward() * self.speed;
        self.velocity += (desired - self.velocity) * params.steering_strength;

        let report = self.flock(neighbors, self_index, params);
        self.velocity += report.cohesion + report.alignment + report.separation;

        if let Some(predator) = env.predator {
            self.flee(predator, params);
        }

        if params.contain_boids {
            self.velocity += containment(self.position, params);
        }

        self.velocity *= params.damping;
        self.limit_speed(params, rng);

        // Small per-axis noise keeps the flock from moving in lockstep
        self.velocity += Vec3::new(
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
        ) * params.velocity_jitter;

        self.position += self.velocity * dt;

        report
    }

    // Turn toward the target by a fixed fraction per tick. The blend is not
    // scaled by dt, unlike the translation.
    fn seek(&mut self, target: Vec3, params: &SimulationParams) {
        let offset = target - self.position;
        if let Some(direction) = offset.try_normalize() {
            let facing = Quat::from_rotation_arc(Vec3::Z, direction);
            self.orientation = self.orientation.slerp(facing, params.seek_blend).normalize();
        }
        self.speed = params.spring * offset.length();
    }

    fn flock(&self, neighbors: &[Neighbor], self_index: usize, params: &SimulationParams) -> FlockReport {
        let mut center = Vec3::ZERO;
        let mut velocity_sum = Vec3::ZERO;
        let mut repulsion = Vec3::ZERO;
        let mut report = FlockReport::default();

        // Process all neighbors in a single pass
        for other in neighbors {
            if other.index == self_index {
                continue;
            }
            let distance = self.position.distance(other.position);

            if distance < params.cohesion_radius {
                center += other.position;
                velocity_sum += other.velocity;
                report.cohesion_count += 1;
            }

            if distance < params.separation_radius && distance > 0.0 {
                // Push away, weighted by inverse distance
                let push = (self.position - other.position) / (distance * distance);
                if push.is_finite() {
                    repulsion += push;
                    report.separation_count += 1;
                }
            }
        }

        if report.cohesion_count > 0 {
            let count = report.cohesion_count as f32;
            report.cohesion = (center / count - self.position) * params.cohesion_strength;
            report.alignment = (velocity_sum / count) * params.alignment_strength;
        }

        if report.separation_count > 0 {
            report.separation = (repulsion / report.separation_count as f32) * params.separation_strength;
        }

        report
    }

    fn flee(&mut self, predator: Vec3, params: &SimulationParams) {
        let away = self.position - predator;
        let distance = away.length();
        if distance < params.flee_radius && distance > 0.0 {
            let urgency = 1.0 - distance / params.flee_radius;
            self.velocity += away / distance * params.flee_strength * urgency;
        }
    }

    // Rescale to max_speed, give or take speed_clamp_jitter, so the flock
    // does not all cruise at one identical speed
    fn limit_speed<R: Rng + ?Sized>(&mut self, params: &SimulationParams, rng: &mut R) {
        let speed = self.velocity.length();
        if speed > params.max_speed {
            let jitter = (rng.gen::<f32>() * 2.0 - 1.0) * params.speed_clamp_jitter;
            self.velocity *= (params.max_speed + jitter) / speed;
        }
    }
}

// Restoring force for a position inside the soft shell near the cube faces.
// Zero in the interior, growing linearly with penetration depth.
pub fn containment(position: Vec3, params: &SimulationParams) -> Vec3 {
    let edge = params.bounds - params.bounds_softness;
    let gain = params.bounds_strength / params.bounds_softness;
    let mut force = Vec3::ZERO;

    for axis in 0..3 {
        let p = position[axis];
        if p > edge {
            force[axis] = -(p - edge) * gain;
        } else if p < -edge {
            force[axis] = (-edge - p) * gain;
        }
    }
    force
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    fn still_target(position: Vec3) -> Target {
        Target::new(position, Vec3::ZERO, 100.0)
    }

    #[test]
    fn separation_pushes_close_neighbors_apart() {
        let params = SimulationParams {
            cohesion_radius: 10.0,
            separation_radius: 3.0,
            ..Default::default()
        };
        let target = still_target(Vec3::new(0.0, 50.0, 0.0));
        let env = Environment { target: &target, predator: None, params: &params };
        let mut rng = SmallRng::seed_from_u64(1);

        let mut boids = [
            Boid::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO),
            Boid::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO),
        ];
        let snapshot: Vec<Neighbor> = boids.iter().enumerate().map(|(i, b)| b.snapshot(i)).collect();

        let report = boids[0].update(&snapshot, 0, 1.0 / 60.0, &env, &mut rng);

        assert_eq!(report.cohesion_count, 1);
        assert_eq!(report.separation_count, 1);
        // normalize(-2, 0, 0) / 2 scaled by the separation strength
        assert!((report.separation - Vec3::new(-4.0, 0.0, 0.0)).length() < 1e-5);
        assert!((report.cohesion - Vec3::new(2.0 * params.cohesion_strength, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(report.alignment, Vec3::ZERO);
        assert!(boids[0].velocity.x < 0.0);
    }

    #[test]
    fn coincident_neighbors_do_not_poison_velocity() {
        let params = SimulationParams::default();
        let target = still_target(Vec3::new(20.0, 0.0, 0.0));
        let env = Environment { target: &target, predator: Some(Vec3::ZERO), params: &params };
        let mut rng = SmallRng::seed_from_u64(2);

        let mut boid = Boid::new(Vec3::ZERO, Vec3::ZERO);
        let twin = Neighbor { index: 1, position: Vec3::ZERO, velocity: Vec3::X };

        let report = boid.update(&[twin], 0, 1.0 / 60.0, &env, &mut rng);

        assert_eq!(report.separation_count, 0);
        assert_eq!(report.cohesion_count, 1);
        assert!(boid.velocity.is_finite());
        assert!(boid.position.is_finite());
    }

    #[test]
    fn self_entries_are_ignored() {
        let params = SimulationParams::default();
        let target = still_target(Vec3::ZERO);
        let env = Environment { target: &target, predator: None, params: &params };
        let mut rng = SmallRng::seed_from_u64(3);

        let mut boid = Boid::new(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO);
        let me = boid.snapshot(4);
        let report = boid.update(&[me, me], 4, 1.0 / 60.0, &env, &mut rng);

        assert_eq!(report, FlockReport::default());
    }

    #[test]
    fn boid_on_the_target_has_no_spring_speed_and_slows_down() {
        let params = SimulationParams { velocity_jitter: 0.0, ..Default::default() };
        let target = still_target(Vec3::new(10.0, 10.0, 10.0));
        let env = Environment { target: &target, predator: None, params: &params };
        let mut rng = SmallRng::seed_from_u64(4);

        let mut boid = Boid::new(target.position, Vec3::new(10.0, 0.0, 0.0));
        let orientation = boid.orientation;
        boid.update(&[], 0, 1.0 / 60.0, &env, &mut rng);

        assert_eq!(boid.speed, 0.0);
        assert_eq!(boid.orientation, orientation);
        assert!(boid.velocity.length() < 10.0);

        for _ in 0..10 {
            boid.update(&[], 0, 1.0 / 60.0, &env, &mut rng);
        }
        assert!(boid.velocity.length() < 7.0, "velocity {:?}", boid.velocity);
    }

    #[test]
    fn orientation_turns_toward_the_target_gradually() {
        let params = SimulationParams::default();
        let target = still_target(Vec3::new(50.0, 0.0, 0.0));
        let env = Environment { target: &target, predator: None, params: &params };
        let mut rng = SmallRng::seed_from_u64(5);

        let mut boid = Boid::new(Vec3::ZERO, Vec3::ZERO);
        boid.update(&[], 0, 1.0 / 60.0, &env, &mut rng);
        let first = boid.forward().angle_between(Vec3::X);
        assert!(first > 1.0, "a single tick only blends part of the way");

        for _ in 0..30 {
            boid.update(&[], 0, 1.0 / 60.0, &env, &mut rng);
        }
        let heading = (target.position - boid.position).normalize();
        assert!(boid.forward().angle_between(heading) < 0.6);
        assert!((boid.orientation.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn speed_never_exceeds_the_limit_by_more_than_the_tolerance() {
        let params = SimulationParams::default();
        let target = still_target(Vec3::new(-90.0, 90.0, -90.0));
        let env = Environment { target: &target, predator: Some(Vec3::new(90.0, 0.0, 0.0)), params: &params };
        let mut rng = SmallRng::seed_from_u64(6);

        let mut boid = Boid::new(Vec3::new(95.0, -95.0, 95.0), Vec3::new(500.0, -500.0, 500.0));
        for _ in 0..500 {
            boid.update(&[], 0, 1.0 / 60.0, &env, &mut rng);
            assert!(boid.velocity.length() <= params.max_speed + params.speed_tolerance() + 1e-3);
        }
    }

    #[test]
    fn predator_close_by_adds_a_flee_impulse() {
        let params = SimulationParams { contain_boids: false, ..Default::default() };
        let target = still_target(Vec3::ZERO);
        let calm = Environment { target: &target, predator: None, params: &params };
        let scared = Environment { predator: Some(Vec3::new(0.0, 5.0, 0.0)), ..calm };

        let start = Boid::new(Vec3::ZERO, Vec3::ZERO);
        let mut a = start.clone();
        let mut b = start.clone();
        a.update(&[], 0, 1.0 / 60.0, &calm, &mut SmallRng::seed_from_u64(7));
        b.update(&[], 0, 1.0 / 60.0, &scared, &mut SmallRng::seed_from_u64(7));

        assert!(b.velocity.y < a.velocity.y - 1.0);
    }

    #[test]
    fn containment_is_zero_inside_and_restoring_outside() {
        let params = SimulationParams::default();
        assert_eq!(containment(Vec3::new(89.0, -89.0, 0.0), &params), Vec3::ZERO);

        let force = containment(Vec3::new(95.0, -100.0, 0.0), &params);
        assert!((force.x - -10.0).abs() < 1e-5);
        assert!((force.y - 20.0).abs() < 1e-5);
        assert_eq!(force.z, 0.0);
    }
}
