// src/physics.rs
//
// Host-side rigid-body world. rapier integrates the chassis bodies; the
// dynamics core decides what velocity each car should have every tick.

use std::collections::HashMap;

use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use tracing::{debug, info, warn};

use crate::dynamics::{
    self, ControlInput, CurbContact, EngineState, Recovery, Telemetry, TickOutput,
    TireCompound, Transform, VehicleConstants, VehicleDynamics, Weather,
};

const GROUP_GROUND: Group  = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

pub struct ChassisConfig {
    pub half_extents: [f32; 3], // [hx, hy, hz] meters
    pub com_offset: [f32; 3],   // local offset from collider center
    pub linear_damping: f32,
    pub angular_damping: f32,
}

pub const GT_CHASSIS: ChassisConfig = ChassisConfig {
    half_extents: [0.9, 0.35, 2.1],
    com_offset: [0.0, -0.15, 0.0], // slightly below visual center
    linear_damping: 0.0,           // drag lives in the dynamics core
    angular_damping: 0.6,
};

pub struct Vehicle {
    pub body: RigidBodyHandle,       // the chassis body
    pub dynamics: VehicleDynamics,   // per-car model + state
    pub input: ControlInput,         // latest input, sampled once per tick
    pub tires: TireCompound,
    pub curb: CurbContact,
    pub telemetry: Telemetry,        // last emitted snapshot
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>, // gravity vector
    pub pipeline: PhysicsPipeline, // physics pipeline
    pub island_manager: IslandManager, // manages islands of bodies
    pub broad_phase: DefaultBroadPhase, // broad-phase collision detection
    pub narrow_phase: NarrowPhase, // collision detection
    pub bodies: RigidBodySet, // for rigid bodies
    pub colliders: ColliderSet, // for collision shapes
    pub joints: ImpulseJointSet, // for constraints
    pub multibody_joints: MultibodyJointSet,// for articulated bodies
    pub ccd: CCDSolver, // continuous collision detection
    pub query_pipeline: QueryPipeline, // for raycasting
    pub vehicles: HashMap<String, Vehicle>, // playerId → vehicle
    pub constants: VehicleConstants, // shared by every car
    pub weather: Weather,
}

#[inline]
fn to_core_vec(v: &Vector<Real>) -> ::nalgebra::Vector3<f32> {
    ::nalgebra::Vector3::new(v.x, v.y, v.z)
}

#[inline]
fn to_core_rot(r: &Rotation<Real>) -> ::nalgebra::UnitQuaternion<f32> {
    ::nalgebra::UnitQuaternion::new_unchecked(::nalgebra::Quaternion::new(r.w, r.i, r.j, r.k))
}

fn to_isometry(t: &Transform) -> Isometry3<Real> {
    let q = t.rotation.quaternion();
    Isometry3::from_parts(
        Translation3::new(t.position.x, t.position.y, t.position.z),
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.i, q.j, q.k)),
    )
}

/// What the core sees of a rapier body.
pub fn engine_state(body: &RigidBody) -> EngineState {
    EngineState {
        position: to_core_vec(body.translation()),
        rotation: to_core_rot(body.rotation()),
        linear_velocity: to_core_vec(body.linvel()),
        angular_velocity: to_core_vec(body.angvel()),
    }
}

/// Write one tick's command back onto the body.
pub fn apply_output(body: &mut RigidBody, out: &TickOutput) {
    if let Some(t) = out.teleport {
        body.set_position(to_isometry(&t), true);
    }
    let v = out.linear_velocity;
    let w = out.angular_velocity;
    body.set_linvel(vector![v.x, v.y, v.z], true);
    body.set_angvel(vector![w.x, w.y, w.z], true);
}

impl PhysicsWorld {

    pub fn new(constants: VehicleConstants) -> Self {
        let gravity = vector![0.0, -dynamics::GRAVITY, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // === 1. Create a big static ground box at y = 0 ===
        //
        // Size: 1000 x 2 x 1000, top surface at y = 0.
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -1.0, 0.0])
            .build();

        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 1.0, 500.0)
            .collision_groups(InteractionGroups::new(
                GROUP_GROUND,
                GROUP_CHASSIS,
            ))
            .friction(1.2)
            .restitution(0.0)
            .build();

        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: HashMap::new(),
            constants,
            weather: Weather::default(),
        }
    }

    /// Store the player's input; it is consumed by the next `step`.
    pub fn apply_player_input(&mut self, player_id: &str, input: ControlInput) {
        if let Some(v) = self.vehicles.get_mut(player_id) {
            v.input = input;
        }
    }

    pub fn set_tires(&mut self, player_id: &str, tires: TireCompound) {
        if let Some(v) = self.vehicles.get_mut(player_id) {
            info!(player = player_id, ?tires, "tire compound changed");
            v.tires = tires;
        }
    }

    /// Curb under the car, from whatever track geometry the host knows about.
    pub fn set_curb(&mut self, player_id: &str, curb: CurbContact) {
        if let Some(v) = self.vehicles.get_mut(player_id) {
            if v.curb != curb {
                debug!(player = player_id, ?curb, "curb contact changed");
            }
            v.curb = curb;
        }
    }

    pub fn set_weather(&mut self, weather: Weather) {
        info!(?weather, "weather changed");
        self.weather = weather;
    }

    /// Spawn a chassis body for this player at its grid slot.
    pub fn spawn_vehicle_for_player(&mut self, id: String, spawn: Transform) {
        let chassis = GT_CHASSIS;
        let [hx, hy, hz] = chassis.half_extents;
        let [cx, cy, cz] = chassis.com_offset;
        let volume = 8.0 * hx * hy * hz;            // box size
        let density = self.constants.mass / volume; // ρ = m / V

        // Rigid body
        let rb = RigidBodyBuilder::dynamic()
            .position(to_isometry(&spawn))
            .linear_damping(chassis.linear_damping)
            .angular_damping(chassis.angular_damping)
            .ccd_enabled(true)
            .build();

        // Box collider
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![cx, cy, cz]) // COM offset
            .collision_groups(InteractionGroups::new(
                GROUP_CHASSIS,
                GROUP_GROUND | GROUP_CHASSIS,
            ))
            .density(density)
            .friction(0.0) // velocity is driven directly
            .friction_combine_rule(CoefficientCombineRule::Min)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb); // insert rigid body
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies); // attach to body

        self.vehicles.insert(
            id.clone(),
            Vehicle {
                body: handle,
                dynamics: VehicleDynamics::new(self.constants, spawn),
                input: ControlInput::default(),
                tires: TireCompound::default(),
                curb: CurbContact::default(),
                telemetry: Telemetry::default(),
            },
        );

        info!(player = %id, position = ?spawn.position, body = ?handle, "spawned vehicle");
    }

    pub fn remove_vehicle(&mut self, player_id: &str) {
        if let Some(v) = self.vehicles.remove(player_id) {
            self.bodies.remove(
                v.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.joints,
                &mut self.multibody_joints,
                true,
            );
            info!(player = player_id, "removed vehicle");
        }
    }

    // --------------------------------------------------------------
    // Run the dynamics core for every car and write the targets back
    // --------------------------------------------------------------
    pub fn drive_vehicles(&mut self, dt: Real) {
        let weather = self.weather;
        let weather_mods = weather.modifiers();

        for (id, v) in self.vehicles.iter_mut() {
            let Some(body) = self.bodies.get_mut(v.body) else { continue };

            let engine = engine_state(body);
            let modifiers = dynamics::compose(
                &weather_mods,
                &v.tires.modifiers(weather),
                v.curb.modifiers().as_ref(),
            );

            let out = v.dynamics.integrate(dt, &v.input, &engine, &modifiers);
            apply_output(body, &out);

            if out.recovery == Recovery::Reset {
                warn!(player = %id, teleported = out.teleport.is_some(), "vehicle state reset");
            }

            v.telemetry = out.telemetry;
        }
    }

    pub fn step(&mut self, dt: Real) {

        let hooks = ();
        let mut events = ();

        // 1) Inputs + state -> target velocities
        self.drive_vehicles(dt);

        // 2) Step physics.
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &mut events,
            &hooks,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_at(x: f32, z: f32) -> Transform {
        Transform::new(::nalgebra::Vector3::new(x, 0.6, z), 0.0)
    }

    #[test]
    fn engine_state_round_trips_body_transform() {
        let mut world = PhysicsWorld::new(VehicleConstants::default());
        let spawn = Transform::new(::nalgebra::Vector3::new(1.0, 2.0, 3.0), 0.7);
        world.spawn_vehicle_for_player("p".into(), spawn);
        let body = &world.bodies[world.vehicles["p"].body];
        let e = engine_state(body);
        assert!((e.position - spawn.position).norm() < 1e-5);
        assert!(e.rotation.angle_to(&spawn.rotation) < 1e-4);
    }

    #[test]
    fn throttle_moves_car_forward() {
        let mut world = PhysicsWorld::new(VehicleConstants::default());
        world.spawn_vehicle_for_player("p".into(), spawn_at(0.0, 0.0));
        world.apply_player_input("p", ControlInput { forward: true, ..Default::default() });
        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }
        let v = &world.vehicles["p"];
        let body = &world.bodies[v.body];
        assert!(body.translation().z > 1.0);
        assert!(v.telemetry.speed_kmh > 5.0);
        assert!(v.telemetry.gear >= 1);
    }

    #[test]
    fn corrupted_body_is_sent_back_to_spawn() {
        let mut world = PhysicsWorld::new(VehicleConstants::default());
        let spawn = spawn_at(4.0, -8.0);
        world.spawn_vehicle_for_player("p".into(), spawn);
        let handle = world.vehicles["p"].body;
        world.bodies[handle].set_translation(vector![f32::NAN, 0.0, 0.0], true);

        world.drive_vehicles(1.0 / 60.0);

        let body = &world.bodies[handle];
        assert!((body.translation().x - 4.0).abs() < 1e-5);
        assert_eq!(*body.linvel(), vector![0.0, 0.0, 0.0]);
    }

    #[test]
    fn curb_contact_reduces_grip() {
        let mut world = PhysicsWorld::new(VehicleConstants::default());
        world.spawn_vehicle_for_player("flat".into(), spawn_at(0.0, 0.0));
        world.spawn_vehicle_for_player("curb".into(), spawn_at(10.0, 0.0));
        world.set_curb("curb", CurbContact::Sausage);
        world.set_curb("nobody", CurbContact::Flat);
        assert_eq!(world.vehicles["curb"].curb, CurbContact::Sausage);

        world.drive_vehicles(1.0 / 60.0);

        let grip = |id: &str| world.vehicles[id].dynamics.diagnostics().grip.combined;
        assert!(grip("curb") < grip("flat"));
    }

    #[test]
    fn removed_vehicle_releases_body() {
        let mut world = PhysicsWorld::new(VehicleConstants::default());
        world.spawn_vehicle_for_player("p".into(), spawn_at(0.0, 0.0));
        let handle = world.vehicles["p"].body;
        world.remove_vehicle("p");
        assert!(world.vehicles.is_empty());
        assert!(world.bodies.get(handle).is_none());
    }
}
