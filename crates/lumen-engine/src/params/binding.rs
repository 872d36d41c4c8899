use crate::math::deg_to_rad;
use crate::session::TransformState;

use super::{ParameterDescriptor, ParameterValue, StateCommand, StateTarget};

/// Writes `value` into the field `command` targets.
///
/// The value must already be validated against its descriptor; a value whose
/// kind does not fit the target is ignored and reported as `false`.
pub fn apply_command(
    state: &mut TransformState,
    command: &StateCommand,
    value: &ParameterValue,
) -> bool {
    match (command.target, value) {
        (StateTarget::Translation(axis), ParameterValue::Numeric(v)) => {
            state.translation = state.translation.with_axis(axis.index(), *v);
        }
        (StateTarget::Rotation(axis), ParameterValue::Numeric(v)) => {
            state.rotation = state.rotation.with_axis(axis.index(), deg_to_rad(*v));
        }
        (StateTarget::Scale(axis), ParameterValue::Numeric(v)) => {
            state.scale = state.scale.with_axis(axis.index(), *v);
        }
        (StateTarget::Scalar(key), ParameterValue::Numeric(v)) => {
            state.scalars.insert(key, *v);
        }
        (StateTarget::Angle(key), ParameterValue::Numeric(v)) => {
            state.scalars.insert(key, deg_to_rad(*v));
        }
        (StateTarget::Flag(key), ParameterValue::Boolean(v)) => {
            state.flags.insert(key, *v);
        }
        (StateTarget::Choice(key), ParameterValue::Choice(v)) => {
            state.choices.insert(key, v.clone());
        }
        (StateTarget::Selection(key), ParameterValue::Selection(v)) => {
            state.selections.insert(key, v.clone());
        }
        (target, value) => {
            log::warn!("parameter value {value:?} cannot drive {target:?}; ignored");
            return false;
        }
    }
    true
}

/// Writes every descriptor's default into `state`.
pub fn apply_defaults(state: &mut TransformState, descriptors: &[ParameterDescriptor]) {
    for d in descriptors {
        apply_command(state, &d.command, &d.default_value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::params::{Axis, ParameterSet};

    #[test]
    fn translation_writes_one_axis() {
        let mut state = TransformState::new().with_translation(Vec3::new(1.0, 2.0, 3.0));
        let command = StateCommand::set(StateTarget::Translation(Axis::Y));
        assert!(apply_command(&mut state, &command, &ParameterValue::Numeric(50.0)));
        assert_eq!(state.translation, Vec3::new(1.0, 50.0, 3.0));
    }

    #[test]
    fn rotation_is_stored_in_radians() {
        let mut state = TransformState::new();
        let command = StateCommand::set(StateTarget::Rotation(Axis::Z));
        apply_command(&mut state, &command, &ParameterValue::Numeric(180.0));
        assert!((state.rotation.z - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn named_fields() {
        let mut state = TransformState::new();
        apply_command(
            &mut state,
            &StateCommand::set(StateTarget::Angle("fov")),
            &ParameterValue::Numeric(90.0),
        );
        apply_command(
            &mut state,
            &StateCommand::set(StateTarget::Flag("wire")),
            &ParameterValue::Boolean(true),
        );
        apply_command(
            &mut state,
            &StateCommand::set(StateTarget::Selection("show")),
            &ParameterValue::Selection(vec!["a".into()]),
        );
        assert!((state.scalar("fov") - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!(state.flag("wire"));
        assert!(state.is_selected("show", "a"));
    }

    #[test]
    fn mismatched_value_is_ignored() {
        let mut state = TransformState::new();
        let before = state.clone();
        let command = StateCommand::set(StateTarget::Flag("wire"));
        assert!(!apply_command(&mut state, &command, &ParameterValue::Numeric(1.0)));
        assert_eq!(state, before);
    }

    #[test]
    fn defaults_populate_state() {
        let set = ParameterSet::new(vec![
            ParameterDescriptor::numeric(
                "scale x",
                2.0,
                (0.1, 10.0),
                0.1,
                StateCommand::set(StateTarget::Scale(Axis::X)),
            ),
            ParameterDescriptor::single_choice(
                "mode",
                "lines",
                &["lines", "points"],
                StateCommand::set(StateTarget::Choice("mode")),
            ),
        ])
        .unwrap();
        let mut state = TransformState::new();
        apply_defaults(&mut state, set.describe());
        assert_eq!(state.scale.x, 2.0);
        assert_eq!(state.choice("mode"), Some("lines"));
    }
}
