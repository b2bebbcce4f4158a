/*
 * Target Module
 *
 * The target is the moving point every boid seeks. It travels in a straight
 * line and bounces off the faces of the simulation cube.
 */

use glam::Vec3;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Vec3,
    pub velocity: Vec3,
    pub bounds: f32,
}

impl Target {
    pub fn new(position: Vec3, velocity: Vec3, bounds: f32) -> Self {
        Self { position, velocity, bounds }
    }

    // Random start inside the cube, heading in a random direction at `speed`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: f32, speed: f32) -> Self {
        let position = Vec3::new(
            rng.gen_range(-bounds..=bounds),
            rng.gen_range(-bounds..=bounds),
            rng.gen_range(-bounds..=bounds),
        );
        let direction = Vec3::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5)
            .try_normalize()
            .unwrap_or(Vec3::X);
        Self::new(position, direction * speed, bounds)
    }

    // Keep the heading, change the speed
    pub fn set_speed(&mut self, speed: f32) {
        self.velocity = self.velocity.try_normalize().unwrap_or(Vec3::X) * speed;
    }

    // Advance by `dt` seconds and reflect off the cube faces
    pub fn update(&mut self, dt: f32) {
        self.position += self.velocity * dt;

        for axis in 0..3 {
            if self.position[axis].abs() > self.bounds {
                self.velocity[axis] = -self.velocity[axis];
                self.position[axis] = self.position[axis].signum() * self.bounds;
            }
        }
    }
}
