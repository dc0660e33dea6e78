use physlab_input::Action;
use physlab_kernel::{LabInspector, LabKind, Session, SessionHost};

/// What the control panel asked for this frame. Applied after drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCommand {
    Act(Action),
    SwitchLab(LabKind),
}

struct Slider {
    name: &'static str,
    value: f32,
    min: f32,
    max: f32,
    step: f32,
}

/// Read-only copy of the session state the panel shows.
pub struct PanelModel {
    kind: LabKind,
    toggle_label: &'static str,
    has_sound: bool,
    sliders: Vec<Slider>,
    summary: String,
    entities: Vec<String>,
}

impl PanelModel {
    pub fn capture<H: SessionHost>(session: &Session<H>) -> Option<Self> {
        let world = session.world()?;
        let sliders = world
            .panel()
            .params()
            .iter()
            .map(|p| Slider {
                name: p.name,
                value: p.value,
                min: p.min,
                max: p.max,
                step: p.step,
            })
            .collect();
        let entities = match LabInspector::snapshot(world) {
            Ok(snapshot) => snapshot.entities.iter().map(ToString::to_string).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "inspector snapshot failed");
                Vec::new()
            }
        };
        Some(Self {
            kind: session.kind(),
            toggle_label: session.toggle_label(),
            has_sound: session.config().sound.is_some(),
            sliders,
            summary: LabInspector::summary(world).to_string(),
            entities,
        })
    }

    pub fn draw(&mut self, ctx: &egui::Context, commands: &mut Vec<UiCommand>) {
        egui::SidePanel::right("controls")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading(self.kind.title());
                ui.horizontal(|ui| {
                    for kind in LabKind::ALL {
                        if ui.selectable_label(kind == self.kind, kind.title()).clicked() && kind != self.kind {
                            commands.push(UiCommand::SwitchLab(kind));
                        }
                    }
                });
                ui.separator();

                if ui.button(self.toggle_label).clicked() {
                    commands.push(UiCommand::Act(Action::ToggleLimits));
                }
                if self.has_sound && ui.button("Play Sound").clicked() {
                    commands.push(UiCommand::Act(Action::PlaySound));
                }
                ui.separator();

                for slider in &mut self.sliders {
                    let before = slider.value;
                    ui.add(
                        egui::Slider::new(&mut slider.value, slider.min..=slider.max)
                            .step_by(f64::from(slider.step))
                            .text(slider.name),
                    );
                    if slider.value != before {
                        commands.push(UiCommand::Act(Action::SetParameter {
                            name: slider.name,
                            value: slider.value,
                        }));
                    }
                }
                ui.separator();

                ui.small(&self.summary);
                for line in &self.entities {
                    ui.monospace(line);
                }
                ui.separator();
                let keys = match self.kind {
                    LabKind::BarrierCourse => "WASD: push",
                    LabKind::VehicleArena => "Arrows: drive",
                };
                ui.small(format!("{keys} | LMB drag: orbit | wheel: zoom"));
            });
    }
}
