use physlab_render::{LightId, Scene};

/// One slider: a bounded numeric value driving light intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub targets: Vec<LightId>,
}

impl Parameter {
    pub fn new(name: &'static str, value: f32, min: f32, max: f32, step: f32) -> Self {
        Self {
            name,
            value,
            min,
            max,
            step,
            targets: Vec::new(),
        }
    }

    pub fn driving(mut self, light: LightId) -> Self {
        self.targets.push(light);
        self
    }

    /// Clamp into `[min, max]`, then snap to the nearest multiple of `step`.
    pub fn quantize(&self, value: f32) -> f32 {
        let v = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            ((v / self.step).round() * self.step).clamp(self.min, self.max)
        } else {
            v
        }
    }
}

/// The per-lab GUI panel. Rebuilt together with the rest of the world.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlPanel {
    params: Vec<Parameter>,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, param: Parameter) {
        self.params.push(param);
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.params.iter().find(|p| p.name == name).map(|p| p.value)
    }

    /// Set a parameter by name. Returns the stored value, or `None` for an
    /// unknown name. Non-finite input is ignored.
    pub fn set(&mut self, name: &str, value: f32) -> Option<f32> {
        let param = self.params.iter_mut().find(|p| p.name == name)?;
        if value.is_finite() {
            param.value = param.quantize(value);
        }
        Some(param.value)
    }

    /// Push every parameter onto its target lights.
    pub fn apply(&self, scene: &mut Scene) {
        for param in &self.params {
            for &light in &param.targets {
                if let Some(l) = scene.light_mut(light) {
                    l.set_intensity(param.value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlab_render::{Color, Light};

    fn ambient_panel(scene: &mut Scene) -> (ControlPanel, LightId) {
        let light = scene.add_light(Light::Ambient {
            color: Color::WHITE,
            intensity: 2.1,
        });
        let mut panel = ControlPanel::new();
        panel.add(Parameter::new("Amb. Light", 2.1, 0.0, 3.0, 0.1).driving(light));
        (panel, light)
    }

    #[test]
    fn set_clamps_and_snaps() {
        let mut scene = Scene::new();
        let (mut panel, _) = ambient_panel(&mut scene);
        assert_eq!(panel.set("Amb. Light", 9.0), Some(3.0));
        assert_eq!(panel.set("Amb. Light", -1.0), Some(0.0));
        let v = panel.set("Amb. Light", 1.26).unwrap();
        assert!((v - 1.3).abs() < 1e-5);
        assert_eq!(panel.set("Amb. Light", f32::NAN), Some(v));
        assert_eq!(panel.set("Gamma", 1.0), None);
    }

    #[test]
    fn apply_drives_lights() {
        let mut scene = Scene::new();
        let (mut panel, light) = ambient_panel(&mut scene);
        panel.set("Amb. Light", 0.5);
        panel.apply(&mut scene);
        assert!((scene.light(light).unwrap().intensity() - 0.5).abs() < 1e-6);
    }
}
