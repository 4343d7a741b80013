//! Contract for the game world the scripts run against
//!
//! The host process owns the real entities. Scripts only ever see them through
//! [`World`], by [`EntityId`]. Queries against an entity that no longer exists
//! return `None`; mutations return [`WorldError::EntityGone`].

use std::fmt;

use bitflags::bitflags;
use glam::Vec3;
use thiserror::Error;

/// Opaque handle to a world entity (ped, vehicle or projectile)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Broad category of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Ped,
    Vehicle,
    Projectile,
}

/// Seat a ped occupies inside a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleSeat {
    Driver,
    Passenger,
}

/// Vehicle category, used to pick out aircraft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleClass {
    Car,
    Helicopter,
    Plane,
    Boat,
}

impl VehicleClass {
    pub fn is_flying(&self) -> bool {
        matches!(self, VehicleClass::Helicopter | VehicleClass::Plane)
    }
}

bitflags! {
    /// Flags controlling how an AI driver handles a vehicle
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VehicleDrivingFlags: u32 {
        const STOP_FOR_VEHICLES = 1 << 0;
        const STOP_FOR_PEDS = 1 << 1;
        const AVOID_VEHICLES = 1 << 2;
        const ALLOW_GOING_WRONG_WAY = 1 << 9;
        const ALLOW_MEDIAN_CROSSING = 1 << 18;
        const DRIVE_BY_SIGHT = 1 << 22;
        const IGNORE_PATH_FINDING = 1 << 24;
    }
}

impl VehicleDrivingFlags {
    /// Aggressive pursuit style used when one vehicle chases another
    pub fn pursuit() -> Self {
        Self::ALLOW_GOING_WRONG_WAY
            | Self::IGNORE_PATH_FINDING
            | Self::DRIVE_BY_SIGHT
            | Self::ALLOW_MEDIAN_CROSSING
    }
}

/// Driving style assigned to a ped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrivingStyle {
    Normal,
    Custom(VehicleDrivingFlags),
}

/// An RGB color, used for vehicle neon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const DARK_RED: Rgb = Rgb { r: 139, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// AI task handed to a ped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PedTask {
    /// Drop all tasks, finishing the current animation
    ClearAll,
    /// Drop all tasks right now
    ClearAllImmediately,
    /// Attack anything hostile within `radius`
    FightHatedTargets { radius: f32 },
    /// Run to a point in the world
    RunTo { target: Vec3, ignore_paths: bool },
    /// Drive `vehicle` after `target`
    VehicleFollow {
        vehicle: EntityId,
        target: EntityId,
        speed: f32,
        flags: VehicleDrivingFlags,
        min_distance: f32,
    },
}

/// Errors surfaced by world mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("entity {0} no longer exists")]
    EntityGone(EntityId),
    #[error("the game refused to change entity {0}")]
    Rejected(EntityId),
    #[error("entity {entity} is not a {expected:?}")]
    WrongKind {
        entity: EntityId,
        expected: EntityKind,
    },
}

pub type WorldResult<T> = Result<T, WorldError>;

/// Query/mutate access to the game world
pub trait World {
    /// The player-controlled character
    fn player(&self) -> EntityId;

    /// Whether the entity still exists
    fn exists(&self, entity: EntityId) -> bool;

    /// Whether the entity is controlled by the player
    fn is_player(&self, entity: EntityId) -> bool;

    /// Whether the entity is alive (false for missing entities)
    fn is_alive(&self, entity: EntityId) -> bool;

    /// Peds within `radius` of `center`, the player included
    fn nearby_peds(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    /// Projectiles within `radius` of `center`
    fn nearby_projectiles(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    /// Vehicles within `radius` of `center`, occupied or not
    fn nearby_vehicles(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    fn position(&self, entity: EntityId) -> Option<Vec3>;

    fn forward_vector(&self, entity: EntityId) -> Option<Vec3>;

    fn velocity(&self, entity: EntityId) -> Option<Vec3>;

    fn height_above_ground(&self, entity: EntityId) -> Option<f32>;

    /// Ped that fired a projectile, if known
    fn projectile_owner(&self, projectile: EntityId) -> Option<EntityId>;

    /// Vehicle a ped is sitting in
    fn current_vehicle(&self, ped: EntityId) -> Option<EntityId>;

    fn seat(&self, ped: EntityId) -> Option<VehicleSeat>;

    fn vehicle_class(&self, vehicle: EntityId) -> Option<VehicleClass>;

    fn set_velocity(&mut self, entity: EntityId, velocity: Vec3) -> WorldResult<()>;

    /// Apply an impulse, with an optional rotational component
    fn apply_force(&mut self, entity: EntityId, force: Vec3, rotation: Vec3) -> WorldResult<()>;

    fn set_position(&mut self, entity: EntityId, position: Vec3) -> WorldResult<()>;

    fn assign_task(&mut self, ped: EntityId, task: PedTask) -> WorldResult<()>;

    /// Keep the ped on its current task even when it would normally bail
    fn set_keep_task(&mut self, ped: EntityId, keep: bool) -> WorldResult<()>;

    fn set_driving_style(&mut self, ped: EntityId, style: DrivingStyle) -> WorldResult<()>;

    /// Front neon light; `None` switches it off
    fn set_neon(&mut self, vehicle: EntityId, color: Option<Rgb>) -> WorldResult<()>;

    fn set_doors_open(&mut self, vehicle: EntityId, open: bool) -> WorldResult<()>;

    /// Position of the player character
    fn player_position(&self) -> Option<Vec3> {
        self.position(self.player())
    }

    /// NPC drivers are peds not controlled by the player sitting in the driver seat
    fn is_npc_driver(&self, ped: EntityId) -> bool {
        !self.is_player(ped)
            && self.current_vehicle(ped).is_some()
            && self.seat(ped) == Some(VehicleSeat::Driver)
    }
}
