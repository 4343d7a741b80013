//! In-memory world and notification sink
//!
//! Lets scripts run without a game attached. Nothing here simulates physics:
//! forces and tasks are only recorded so callers can inspect them.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use glam::Vec3;

use super::notification::{NotificationHandle, NotificationSink};
use super::world::{
    DrivingStyle, EntityId, EntityKind, PedTask, Rgb, VehicleClass, VehicleSeat, World,
    WorldError, WorldResult,
};

/// Recorded state of one sandbox entity
#[derive(Debug, Clone)]
pub struct SandboxEntity {
    pub kind: EntityKind,
    pub position: Vec3,
    pub forward: Vec3,
    pub velocity: Vec3,
    pub alive: bool,
    pub height_above_ground: f32,
    /// Set for projectiles
    pub owner: Option<EntityId>,
    /// Set for seated peds
    pub vehicle: Option<(EntityId, VehicleSeat)>,
    /// Set for vehicles
    pub class: Option<VehicleClass>,
    pub tasks: Vec<PedTask>,
    pub keep_task: bool,
    pub driving_style: Option<DrivingStyle>,
    pub neon: Option<Rgb>,
    pub doors_open: bool,
    /// Every force applied, as (force, rotation)
    pub forces: Vec<(Vec3, Vec3)>,
}

impl SandboxEntity {
    fn new(kind: EntityKind, position: Vec3) -> Self {
        Self {
            kind,
            position,
            forward: Vec3::Y,
            velocity: Vec3::ZERO,
            alive: true,
            height_above_ground: 0.0,
            owner: None,
            vehicle: None,
            class: None,
            tasks: Vec::new(),
            keep_task: false,
            driving_style: None,
            neon: None,
            doors_open: false,
            forces: Vec::new(),
        }
    }

    /// Most recently assigned task
    pub fn last_task(&self) -> Option<&PedTask> {
        self.tasks.last()
    }

    /// Sum of all applied forces
    pub fn total_force(&self) -> Vec3 {
        self.forces.iter().map(|(force, _)| *force).sum()
    }
}

/// World backed by a map of entities. The player is spawned at the origin
/// facing +Y.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    entities: BTreeMap<EntityId, SandboxEntity>,
    player: EntityId,
    next_id: u64,
    /// Entities whose mutations fail with [`WorldError::Rejected`]
    locked: BTreeSet<EntityId>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        let mut world = Self {
            entities: BTreeMap::new(),
            player: EntityId(0),
            next_id: 1,
            locked: BTreeSet::new(),
        };
        world.player = world.insert(SandboxEntity::new(EntityKind::Ped, Vec3::ZERO));
        world
    }

    fn insert(&mut self, entity: SandboxEntity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, entity);
        id
    }

    pub fn spawn_ped(&mut self, position: Vec3) -> EntityId {
        self.insert(SandboxEntity::new(EntityKind::Ped, position))
    }

    pub fn spawn_vehicle(&mut self, position: Vec3, class: VehicleClass) -> EntityId {
        let mut vehicle = SandboxEntity::new(EntityKind::Vehicle, position);
        vehicle.class = Some(class);
        self.insert(vehicle)
    }

    pub fn spawn_projectile(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        owner: Option<EntityId>,
    ) -> EntityId {
        let mut projectile = SandboxEntity::new(EntityKind::Projectile, position);
        projectile.velocity = velocity;
        projectile.owner = owner;
        self.insert(projectile)
    }

    /// Spawn a vehicle of `class` with a fresh ped in the driver seat.
    /// Returns (driver, vehicle).
    pub fn spawn_driver(&mut self, position: Vec3, class: VehicleClass) -> (EntityId, EntityId) {
        let vehicle = self.spawn_vehicle(position, class);
        let driver = self.spawn_ped(position);
        self.seat_ped(driver, vehicle, VehicleSeat::Driver);
        (driver, vehicle)
    }

    /// Put a ped into a vehicle seat. Ignored if either entity is missing.
    pub fn seat_ped(&mut self, ped: EntityId, vehicle: EntityId, seat: VehicleSeat) {
        if !self.entities.contains_key(&vehicle) {
            return;
        }
        if let Some(entity) = self.entities.get_mut(&ped) {
            entity.vehicle = Some((vehicle, seat));
        }
    }

    pub fn leave_vehicle(&mut self, ped: EntityId) {
        if let Some(entity) = self.entities.get_mut(&ped) {
            entity.vehicle = None;
        }
    }

    pub fn despawn(&mut self, entity: EntityId) {
        self.entities.remove(&entity);
        for other in self.entities.values_mut() {
            if other.vehicle.map(|(v, _)| v) == Some(entity) {
                other.vehicle = None;
            }
        }
    }

    pub fn kill(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.alive = false;
        }
    }

    pub fn set_height(&mut self, entity: EntityId, height: f32) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.height_above_ground = height;
        }
    }

    pub fn set_forward(&mut self, entity: EntityId, forward: Vec3) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.forward = forward.normalize_or_zero();
        }
    }

    /// Make every mutation of `entity` fail until unlocked
    pub fn set_locked(&mut self, entity: EntityId, locked: bool) {
        if locked {
            self.locked.insert(entity);
        } else {
            self.locked.remove(&entity);
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&SandboxEntity> {
        self.entities.get(&id)
    }

    fn entity_mut(&mut self, id: EntityId) -> WorldResult<&mut SandboxEntity> {
        if self.locked.contains(&id) && self.entities.contains_key(&id) {
            return Err(WorldError::Rejected(id));
        }
        self.entities.get_mut(&id).ok_or(WorldError::EntityGone(id))
    }

    fn entity_of_kind(&mut self, id: EntityId, kind: EntityKind) -> WorldResult<&mut SandboxEntity> {
        let entity = self.entity_mut(id)?;
        if entity.kind != kind {
            return Err(WorldError::WrongKind {
                entity: id,
                expected: kind,
            });
        }
        Ok(entity)
    }

    fn nearby(&self, kind: EntityKind, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.kind == kind && e.position.distance(center) <= radius)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl World for SandboxWorld {
    fn player(&self) -> EntityId {
        self.player
    }

    fn exists(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn is_player(&self, entity: EntityId) -> bool {
        entity == self.player
    }

    fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|e| e.alive)
    }

    fn nearby_peds(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.nearby(EntityKind::Ped, center, radius)
    }

    fn nearby_projectiles(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.nearby(EntityKind::Projectile, center, radius)
    }

    fn nearby_vehicles(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.nearby(EntityKind::Vehicle, center, radius)
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.entities.get(&entity).map(|e| e.position)
    }

    fn forward_vector(&self, entity: EntityId) -> Option<Vec3> {
        self.entities.get(&entity).map(|e| e.forward)
    }

    fn velocity(&self, entity: EntityId) -> Option<Vec3> {
        self.entities.get(&entity).map(|e| e.velocity)
    }

    fn height_above_ground(&self, entity: EntityId) -> Option<f32> {
        self.entities.get(&entity).map(|e| e.height_above_ground)
    }

    fn projectile_owner(&self, projectile: EntityId) -> Option<EntityId> {
        self.entities.get(&projectile).and_then(|e| e.owner)
    }

    fn current_vehicle(&self, ped: EntityId) -> Option<EntityId> {
        self.entities
            .get(&ped)
            .and_then(|e| e.vehicle)
            .map(|(vehicle, _)| vehicle)
    }

    fn seat(&self, ped: EntityId) -> Option<VehicleSeat> {
        self.entities
            .get(&ped)
            .and_then(|e| e.vehicle)
            .map(|(_, seat)| seat)
    }

    fn vehicle_class(&self, vehicle: EntityId) -> Option<VehicleClass> {
        self.entities.get(&vehicle).and_then(|e| e.class)
    }

    fn set_velocity(&mut self, entity: EntityId, velocity: Vec3) -> WorldResult<()> {
        self.entity_mut(entity)?.velocity = velocity;
        Ok(())
    }

    fn apply_force(&mut self, entity: EntityId, force: Vec3, rotation: Vec3) -> WorldResult<()> {
        self.entity_mut(entity)?.forces.push((force, rotation));
        Ok(())
    }

    fn set_position(&mut self, entity: EntityId, position: Vec3) -> WorldResult<()> {
        self.entity_mut(entity)?.position = position;
        Ok(())
    }

    fn assign_task(&mut self, ped: EntityId, task: PedTask) -> WorldResult<()> {
        self.entity_of_kind(ped, EntityKind::Ped)?.tasks.push(task);
        Ok(())
    }

    fn set_keep_task(&mut self, ped: EntityId, keep: bool) -> WorldResult<()> {
        self.entity_of_kind(ped, EntityKind::Ped)?.keep_task = keep;
        Ok(())
    }

    fn set_driving_style(&mut self, ped: EntityId, style: DrivingStyle) -> WorldResult<()> {
        self.entity_of_kind(ped, EntityKind::Ped)?.driving_style = Some(style);
        Ok(())
    }

    fn set_neon(&mut self, vehicle: EntityId, color: Option<Rgb>) -> WorldResult<()> {
        self.entity_of_kind(vehicle, EntityKind::Vehicle)?.neon = color;
        Ok(())
    }

    fn set_doors_open(&mut self, vehicle: EntityId, open: bool) -> WorldResult<()> {
        self.entity_of_kind(vehicle, EntityKind::Vehicle)?.doors_open = open;
        Ok(())
    }
}

/// Notification sink that records everything it is asked to display
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Every notification ever shown, in order
    shown: Vec<(NotificationHandle, String)>,
    /// Handles hidden so far, in order
    pub hidden: Vec<NotificationHandle>,
    /// Every subtitle shown, in order
    pub subtitles: Vec<(String, Duration)>,
    next_handle: u64,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of every notification shown, in order
    pub fn shown_texts(&self) -> Vec<&str> {
        self.shown.iter().map(|(_, text)| text.as_str()).collect()
    }

    /// Texts still on screen
    pub fn visible(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter(|(handle, _)| !self.hidden.contains(handle))
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn is_visible(&self, handle: NotificationHandle) -> bool {
        self.shown.iter().any(|(h, _)| *h == handle) && !self.hidden.contains(&handle)
    }

    /// Text of the most recent subtitle
    pub fn last_subtitle(&self) -> Option<&str> {
        self.subtitles.last().map(|(text, _)| text.as_str())
    }
}

impl NotificationSink for RecordingSink {
    fn show(&mut self, text: &str) -> NotificationHandle {
        let handle = NotificationHandle(self.next_handle);
        self.next_handle += 1;
        self.shown.push((handle, text.to_string()));
        handle
    }

    fn hide(&mut self, handle: NotificationHandle) {
        if !self.hidden.contains(&handle) {
            self.hidden.push(handle);
        }
    }

    fn show_subtitle(&mut self, text: &str, duration: Duration) {
        self.subtitles.push((text.to_string(), duration));
    }
}
