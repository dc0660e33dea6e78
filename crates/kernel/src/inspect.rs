use crate::config::LabKind;
use crate::error::SessionError;
use crate::lab::LabWorld;
use physlab_common::SessionId;
use serde::Serialize;
use std::fmt;

/// Read-only queries against a running lab, for the CLI and debug overlays.
pub struct LabInspector;

impl LabInspector {
    pub fn summary(lab: &LabWorld) -> LabSummary {
        LabSummary {
            id: lab.id(),
            generation: lab.generation(),
            kind: lab.kind(),
            limits_enabled: lab.limits_enabled(),
            ticks: lab.ticks(),
            physics_steps: lab.physics().steps(),
            sim_time: lab.physics().time(),
            bodies: lab.physics().body_count(),
            meshes: lab.scene().mesh_count(),
        }
    }

    pub fn inspect_entity(lab: &LabWorld, name: &str) -> Result<Option<EntityInfo>, SessionError> {
        let Some(entity) = lab.entity(name) else {
            return Ok(None);
        };
        let physics = lab.physics();
        let pose = physics.pose(entity.body)?;
        let (p, r, v) = (pose.position, pose.rotation, physics.velocity(entity.body)?);
        Ok(Some(EntityInfo {
            name: entity.name,
            position: [p.x, p.y, p.z],
            rotation: [r.x, r.y, r.z, r.w],
            velocity: [v.x, v.y, v.z],
        }))
    }

    /// Summary plus every tracked entity, in creation order.
    pub fn snapshot(lab: &LabWorld) -> Result<LabSnapshot, SessionError> {
        let mut entities = Vec::with_capacity(lab.entities().len());
        for entity in lab.entities() {
            if let Some(info) = Self::inspect_entity(lab, entity.name)? {
                entities.push(info);
            }
        }
        Ok(LabSnapshot {
            summary: Self::summary(lab),
            entities,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabSummary {
    pub id: SessionId,
    pub generation: u64,
    pub kind: LabKind,
    pub limits_enabled: bool,
    pub ticks: u64,
    pub physics_steps: u64,
    pub sim_time: f64,
    pub bodies: usize,
    pub meshes: usize,
}

impl fmt::Display for LabSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lab {} [{}] gen={} limits={} ticks={} steps={} t={:.3}s bodies={} meshes={}",
            self.kind,
            self.id.short(),
            self.generation,
            if self.limits_enabled { "on" } else { "off" },
            self.ticks,
            self.physics_steps,
            self.sim_time,
            self.bodies,
            self.meshes
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityInfo {
    pub name: &'static str,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub velocity: [f32; 3],
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<14} pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2})",
            self.name,
            self.position[0],
            self.position[1],
            self.position[2],
            self.velocity[0],
            self.velocity[1],
            self.velocity[2]
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabSnapshot {
    pub summary: LabSummary,
    pub entities: Vec<EntityInfo>,
}

impl LabSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabConfig;
    use physlab_input::InputState;

    #[test]
    fn summary_counts() {
        let mut lab = LabWorld::build(&LabConfig::vehicle_arena(), true, 4).unwrap();
        lab.tick(&InputState::new(), 0.04).unwrap();
        let summary = LabInspector::summary(&lab);
        assert_eq!(summary.generation, 4);
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.physics_steps, 2);
        assert_eq!(summary.bodies, 3);
        assert!(summary.to_string().starts_with("Lab vehicle-arena"));
    }

    #[test]
    fn unknown_entity_is_none() {
        let lab = LabWorld::build(&LabConfig::barrier_course(), false, 0).unwrap();
        assert!(LabInspector::inspect_entity(&lab, "car").unwrap().is_none());
        let player = LabInspector::inspect_entity(&lab, "player").unwrap().unwrap();
        assert_eq!(player.position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let lab = LabWorld::build(&LabConfig::vehicle_arena(), true, 0).unwrap();
        let snapshot = LabInspector::snapshot(&lab).unwrap();
        let names: Vec<_> = snapshot.entities.iter().map(|e| e.name).collect();
        assert_eq!(names, ["car", "ball"]);

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["kind"], "vehicle-arena");
        assert_eq!(json["entities"][1]["position"][0], 2.0);
    }
}
