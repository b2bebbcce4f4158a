/*
 * Predator Module
 *
 * A single hunter that shares the boids' volume. While no prey is within
 * its chase radius it cruises toward the target like a boid would. Once
 * something is close enough it turns faster and runs straight at the
 * nearest prey. The mode is decided from scratch every tick.
 */

use glam::{Quat, Vec3};

use crate::boid::{containment, Neighbor};
use crate::params::SimulationParams;
use crate::target::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredatorMode {
    #[default]
    Cruise,
    Pursue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predator {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
    pub speed: f32,
    pub mode: PredatorMode,
}

impl Predator {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            speed: 0.0,
            mode: PredatorMode::Cruise,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    // Closest entry of `prey` and its distance
    pub fn nearest(&self, prey: &[Neighbor]) -> Option<(Neighbor, f32)> {
        prey.iter()
            .map(|p| (*p, self.position.distance(p.position)))
            .filter(|(_, d)| d.is_finite())
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn update(&mut self, prey: &[Neighbor], target: &Target, params: &SimulationParams, dt: f32) -> PredatorMode {
        let settings = &params.predator;

        self.mode = match self.nearest(prey) {
            Some((victim, distance)) if distance < settings.chase_radius => {
                self.speed = settings.pursuit_speed;
                if let Some(direction) = (victim.position - self.position).try_normalize() {
                    let aim = Quat::from_rotation_arc(Vec3::Z, direction);
                    self.orientation = self.orientation.slerp(aim, settings.pursuit_blend).normalize();
                    // Velocity follows the full aim, the body only turns partway
                    self.velocity = aim * Vec3::Z * self.speed;
                }
                PredatorMode::Pursue
            }
            _ => {
                self.speed = settings.cruise_speed;
                if let Some(direction) = (target.position - self.position).try_normalize() {
                    let facing = Quat::from_rotation_arc(Vec3::Z, direction);
                    self.orientation = self.orientation.slerp(facing, settings.cruise_blend).normalize();
                    self.velocity = direction * self.speed;
                }
                PredatorMode::Cruise
            }
        };

        if params.contain_boids {
            self.velocity += containment(self.position, params);
        }
        self.velocity = self.velocity.clamp_length_max(settings.max_speed);
        self.position += self.velocity * dt;

        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prey_at(index: usize, position: Vec3) -> Neighbor {
        Neighbor { index, position, velocity: Vec3::ZERO }
    }

    #[test]
    fn cruises_toward_the_target_without_prey() {
        let params = SimulationParams::default();
        let target = Target::new(Vec3::new(0.0, 0.0, 40.0), Vec3::ZERO, 100.0);
        let mut predator = Predator::new(Vec3::ZERO);

        let far = [prey_at(0, Vec3::new(30.0, 0.0, 0.0))];
        assert_eq!(predator.update(&far, &target, &params, 0.1), PredatorMode::Cruise);
        assert_eq!(predator.speed, params.predator.cruise_speed);
        assert!((predator.velocity - Vec3::new(0.0, 0.0, 20.0)).length() < 1e-4);
        assert!((predator.position.z - 2.0).abs() < 1e-4);

        assert_eq!(predator.update(&[], &target, &params, 0.1), PredatorMode::Cruise);
    }

    #[test]
    fn pursues_the_nearest_prey_inside_the_chase_radius() {
        let params = SimulationParams::default();
        let target = Target::new(Vec3::new(0.0, 0.0, 40.0), Vec3::ZERO, 100.0);
        let mut predator = Predator::new(Vec3::ZERO);

        let prey = [
            prey_at(0, Vec3::new(0.0, 7.0, 0.0)),
            prey_at(1, Vec3::new(-3.0, 0.0, 0.0)),
            prey_at(2, Vec3::new(0.0, 0.0, -50.0)),
        ];
        assert_eq!(predator.nearest(&prey).map(|(p, _)| p.index), Some(1));

        assert_eq!(predator.update(&prey, &target, &params, 0.01), PredatorMode::Pursue);
        assert_eq!(predator.mode, PredatorMode::Pursue);
        assert_eq!(predator.speed, params.predator.pursuit_speed);
        assert!((predator.velocity - Vec3::new(-30.0, 0.0, 0.0)).length() < 1e-3);
        assert!(predator.position.x < 0.0);
    }

    #[test]
    fn chase_radius_is_exclusive() {
        let params = SimulationParams::default();
        let target = Target::new(Vec3::new(0.0, 0.0, 40.0), Vec3::ZERO, 100.0);
        let mut predator = Predator::new(Vec3::ZERO);

        let edge = [prey_at(0, Vec3::new(params.predator.chase_radius, 0.0, 0.0))];
        assert_eq!(predator.update(&edge, &target, &params, 0.0), PredatorMode::Cruise);
    }

    #[test]
    fn speed_is_capped_even_when_pushed_back_from_the_boundary() {
        let params = SimulationParams::default();
        let target = Target::new(Vec3::new(99.0, 0.0, 0.0), Vec3::ZERO, 100.0);
        let mut predator = Predator::new(Vec3::new(120.0, 0.0, 0.0));

        predator.update(&[], &target, &params, 1.0 / 60.0);
        assert!(predator.velocity.length() <= params.predator.max_speed + 1e-3);
        assert!(predator.velocity.x < 0.0);
    }
}
