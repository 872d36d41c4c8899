//! Keyboard control surface for scene parameters.
//!
//! Tab / arrow up and down pick a parameter (digits jump straight to one),
//! left and right adjust it (shift for coarse steps), space or enter toggles,
//! `R` resets everything to defaults and escape quits.

use lumen_engine::input::{InputFrame, InputState, Key};
use lumen_engine::params::{ParameterDescriptor, ParameterKind, ParameterValue};
use lumen_engine::session::ParameterTarget;
use lumen_engine::window::AppControl;

/// Multiplier applied to the step while shift is held.
const COARSE: f32 = 10.0;

#[derive(Debug, Default)]
pub struct ControlPanel {
    selected: usize,
    /// Option cursor inside a multi-choice parameter.
    option: usize,
    /// Last value set per descriptor, in descriptor order.
    values: Vec<ParameterValue>,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn values(&self) -> &[ParameterValue] {
        &self.values
    }

    pub fn handle(
        &mut self,
        target: &mut dyn ParameterTarget,
        input: &InputState,
        frame: &InputFrame,
    ) -> AppControl {
        if frame.pressed(Key::Escape) {
            return AppControl::Exit;
        }

        let descriptors = target.describe().to_vec();
        if descriptors.is_empty() {
            return AppControl::Continue;
        }
        self.sync(&descriptors);

        let shift = input.modifiers.shift;
        let before = self.selected;
        let count = descriptors.len();
        if frame.pressed(Key::Tab) {
            self.selected = if shift {
                (self.selected + count - 1) % count
            } else {
                (self.selected + 1) % count
            };
        }
        if frame.pressed(Key::ArrowUp) {
            self.selected = (self.selected + count - 1) % count;
        }
        if frame.pressed(Key::ArrowDown) {
            self.selected = (self.selected + 1) % count;
        }
        if let Some(index) = frame.keys_pressed.iter().find_map(|k| digit_index(*k)) {
            if index < count {
                self.selected = index;
            }
        }
        if self.selected != before {
            self.option = 0;
            let d = &descriptors[self.selected];
            log::info!("[{}] {} = {}", self.selected + 1, d.label, self.values[self.selected]);
        }

        if frame.pressed(Key::R) {
            for (i, d) in descriptors.iter().enumerate() {
                self.apply(target, i, d, d.default_value());
            }
            return AppControl::Continue;
        }

        let index = self.selected;
        let descriptor = &descriptors[index];
        let direction = match (frame.pressed(Key::ArrowLeft), frame.pressed(Key::ArrowRight)) {
            (true, false) => Some(-1.0),
            (false, true) => Some(1.0),
            _ => None,
        };

        if let Some(dir) = direction {
            if let ParameterKind::MultiChoice { options, .. } = &descriptor.kind {
                let n = options.len().max(1);
                self.option = if dir < 0.0 {
                    (self.option + n - 1) % n
                } else {
                    (self.option + 1) % n
                };
                if let Some(option) = options.get(self.option) {
                    log::info!("{}: option `{option}`", descriptor.label);
                }
            } else if let Some(value) =
                step_value(&descriptor.kind, &self.values[index], dir, shift)
            {
                self.apply(target, index, descriptor, value);
            }
        }

        if frame.pressed(Key::Space) || frame.pressed(Key::Enter) {
            if let Some(value) = toggle_value(&descriptor.kind, &self.values[index], self.option) {
                self.apply(target, index, descriptor, value);
            }
        }

        AppControl::Continue
    }

    /// Resets local values whenever the target's descriptor list changes shape.
    fn sync(&mut self, descriptors: &[ParameterDescriptor]) {
        if self.values.len() == descriptors.len() {
            return;
        }
        self.values = descriptors.iter().map(|d| d.default_value()).collect();
        self.selected = 0;
        self.option = 0;

        log::info!("{} parameters:", descriptors.len());
        for (i, d) in descriptors.iter().enumerate() {
            log::info!("  [{}] {} ({}) = {}", i + 1, d.label, d.kind.name(), self.values[i]);
        }
    }

    fn apply(
        &mut self,
        target: &mut dyn ParameterTarget,
        index: usize,
        descriptor: &ParameterDescriptor,
        value: ParameterValue,
    ) {
        match target.set_parameter(descriptor.label, value.clone()) {
            Ok(()) => {
                log::info!("{} = {}", descriptor.label, value);
                self.values[index] = value;
            }
            Err(err) => log::warn!("{} rejected: {err}", descriptor.label),
        }
    }
}

/// Digit keys 1-9 select the first nine parameters, 0 the tenth.
fn digit_index(key: Key) -> Option<usize> {
    match key.digit()? {
        0 => Some(9),
        d => Some(d as usize - 1),
    }
}

/// Value one step away from `current` in `direction`, or `None` if nothing
/// changes.
///
/// Numbers are clamped to their range. Single choices wrap around; booleans
/// flip either way.
pub fn step_value(
    kind: &ParameterKind,
    current: &ParameterValue,
    direction: f32,
    coarse: bool,
) -> Option<ParameterValue> {
    match (kind, current) {
        (ParameterKind::Numeric { min, max, step, .. }, ParameterValue::Numeric(v)) => {
            let scale = if coarse { COARSE } else { 1.0 };
            let next = (v + direction * step * scale).clamp(*min, *max);
            (next != *v).then_some(ParameterValue::Numeric(next))
        }
        (ParameterKind::SingleChoice { options, .. }, ParameterValue::Choice(choice)) => {
            let n = options.len();
            if n == 0 {
                return None;
            }
            let at = options.iter().position(|o| o == choice).unwrap_or(0);
            let next = if direction < 0.0 { (at + n - 1) % n } else { (at + 1) % n };
            Some(ParameterValue::Choice(options[next].to_string()))
        }
        (ParameterKind::Boolean { .. }, ParameterValue::Boolean(b)) => {
            Some(ParameterValue::Boolean(!b))
        }
        _ => None,
    }
}

/// Toggle action: flips booleans, advances single choices and adds or
/// removes option `option` of a multi choice. Numbers have no toggle.
pub fn toggle_value(
    kind: &ParameterKind,
    current: &ParameterValue,
    option: usize,
) -> Option<ParameterValue> {
    match (kind, current) {
        (ParameterKind::MultiChoice { options, .. }, ParameterValue::Selection(selected)) => {
            let toggled = options.get(option)?;
            // Rebuilt in option order so the selection stays canonical.
            let next = options
                .iter()
                .filter(|o| selected.iter().any(|s| s == *o) != (*o == toggled))
                .map(|o| o.to_string())
                .collect();
            Some(ParameterValue::Selection(next))
        }
        (ParameterKind::Numeric { .. }, _) => None,
        _ => step_value(kind, current, 1.0, false),
    }
}
