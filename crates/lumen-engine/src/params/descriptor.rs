use std::fmt;

/// Errors from building descriptor lists or setting values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("invalid value for `{label}`: {reason}")]
    InvalidParameterValue { label: String, reason: String },

    #[error("duplicate parameter label `{0}`")]
    DuplicateLabel(String),

    #[error("invalid descriptor `{label}`: {reason}")]
    InvalidDescriptor { label: String, reason: String },
}

impl ParameterError {
    fn invalid_value(label: &str, reason: impl Into<String>) -> Self {
        ParameterError::InvalidParameterValue {
            label: label.to_string(),
            reason: reason.into(),
        }
    }

    fn invalid_descriptor(label: &str, reason: impl Into<String>) -> Self {
        ParameterError::InvalidDescriptor {
            label: label.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Field of the session state a descriptor writes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StateTarget {
    Translation(Axis),
    /// Value in degrees, stored in radians.
    Rotation(Axis),
    Scale(Axis),
    Scalar(&'static str),
    /// Named angle: value in degrees, stored in radians under the key.
    Angle(&'static str),
    Flag(&'static str),
    Choice(&'static str),
    Selection(&'static str),
}

/// What applying a value does: the target field plus whether scene geometry
/// must be rebuilt before the next draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StateCommand {
    pub target: StateTarget,
    pub rebuild_geometry: bool,
}

impl StateCommand {
    pub const fn set(target: StateTarget) -> Self {
        Self {
            target,
            rebuild_geometry: false,
        }
    }

    pub const fn rebuilding(target: StateTarget) -> Self {
        Self {
            target,
            rebuild_geometry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    Boolean {
        default: bool,
    },
    Numeric {
        default: f32,
        min: f32,
        max: f32,
        step: f32,
    },
    SingleChoice {
        default: &'static str,
        options: &'static [&'static str],
    },
    MultiChoice {
        default: &'static [&'static str],
        options: &'static [&'static str],
    },
}

impl ParameterKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParameterKind::Boolean { .. } => "boolean",
            ParameterKind::Numeric { .. } => "numeric",
            ParameterKind::SingleChoice { .. } => "single choice",
            ParameterKind::MultiChoice { .. } => "multi choice",
        }
    }
}

/// Value supplied by a control surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Boolean(bool),
    Numeric(f32),
    Choice(String),
    Selection(Vec<String>),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Boolean(v) => write!(f, "{v}"),
            ParameterValue::Numeric(v) => write!(f, "{v}"),
            ParameterValue::Choice(v) => f.write_str(v),
            ParameterValue::Selection(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

/// Declarative description of one tunable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub label: &'static str,
    pub kind: ParameterKind,
    pub command: StateCommand,
}

impl ParameterDescriptor {
    pub fn boolean(label: &'static str, default: bool, command: StateCommand) -> Self {
        Self {
            label,
            kind: ParameterKind::Boolean { default },
            command,
        }
    }

    pub fn numeric(
        label: &'static str,
        default: f32,
        (min, max): (f32, f32),
        step: f32,
        command: StateCommand,
    ) -> Self {
        Self {
            label,
            kind: ParameterKind::Numeric {
                default,
                min,
                max,
                step,
            },
            command,
        }
    }

    pub fn single_choice(
        label: &'static str,
        default: &'static str,
        options: &'static [&'static str],
        command: StateCommand,
    ) -> Self {
        Self {
            label,
            kind: ParameterKind::SingleChoice { default, options },
            command,
        }
    }

    pub fn multi_choice(
        label: &'static str,
        default: &'static [&'static str],
        options: &'static [&'static str],
        command: StateCommand,
    ) -> Self {
        Self {
            label,
            kind: ParameterKind::MultiChoice { default, options },
            command,
        }
    }

    pub fn default_value(&self) -> ParameterValue {
        match &self.kind {
            ParameterKind::Boolean { default } => ParameterValue::Boolean(*default),
            ParameterKind::Numeric { default, .. } => ParameterValue::Numeric(*default),
            ParameterKind::SingleChoice { default, .. } => {
                ParameterValue::Choice(default.to_string())
            }
            ParameterKind::MultiChoice { default, .. } => {
                ParameterValue::Selection(default.iter().map(|s| s.to_string()).collect())
            }
        }
    }

    /// Checks `value` against the kind. Never clamps.
    pub fn validate(&self, value: &ParameterValue) -> Result<(), ParameterError> {
        let label = self.label;
        match (&self.kind, value) {
            (ParameterKind::Boolean { .. }, ParameterValue::Boolean(_)) => Ok(()),
            (ParameterKind::Numeric { min, max, .. }, ParameterValue::Numeric(v)) => {
                if !v.is_finite() {
                    Err(ParameterError::invalid_value(label, format!("{v} is not finite")))
                } else if v < min || v > max {
                    Err(ParameterError::invalid_value(
                        label,
                        format!("{v} is outside [{min}, {max}]"),
                    ))
                } else {
                    Ok(())
                }
            }
            (ParameterKind::SingleChoice { options, .. }, ParameterValue::Choice(choice)) => {
                if options.contains(&choice.as_str()) {
                    Ok(())
                } else {
                    Err(ParameterError::invalid_value(
                        label,
                        format!("`{choice}` is not one of {options:?}"),
                    ))
                }
            }
            (ParameterKind::MultiChoice { options, .. }, ParameterValue::Selection(selected)) => {
                if let Some(bad) = selected.iter().find(|s| !options.contains(&s.as_str())) {
                    return Err(ParameterError::invalid_value(
                        label,
                        format!("`{bad}` is not one of {options:?}"),
                    ));
                }
                let mut seen: Vec<&str> = Vec::with_capacity(selected.len());
                for s in selected {
                    if seen.contains(&s.as_str()) {
                        return Err(ParameterError::invalid_value(
                            label,
                            format!("`{s}` selected twice"),
                        ));
                    }
                    seen.push(s.as_str());
                }
                Ok(())
            }
            (kind, value) => Err(ParameterError::invalid_value(
                label,
                format!("expected a {} value, got {value:?}", kind.name()),
            )),
        }
    }

    /// Checks the descriptor is self-consistent and its command accepts the kind.
    fn check(&self) -> Result<(), ParameterError> {
        let target = self.command.target;
        let compatible = match self.kind {
            ParameterKind::Boolean { .. } => matches!(target, StateTarget::Flag(_)),
            ParameterKind::Numeric { .. } => matches!(
                target,
                StateTarget::Translation(_)
                    | StateTarget::Rotation(_)
                    | StateTarget::Scale(_)
                    | StateTarget::Scalar(_)
                    | StateTarget::Angle(_)
            ),
            ParameterKind::SingleChoice { .. } => matches!(target, StateTarget::Choice(_)),
            ParameterKind::MultiChoice { .. } => matches!(target, StateTarget::Selection(_)),
        };
        if !compatible {
            return Err(ParameterError::invalid_descriptor(
                self.label,
                format!("a {} parameter cannot drive {target:?}", self.kind.name()),
            ));
        }

        if let ParameterKind::Numeric { min, max, step, .. } = self.kind
            && !(min <= max && step > 0.0 && step.is_finite())
        {
            return Err(ParameterError::invalid_descriptor(
                self.label,
                format!("range [{min}, {max}] with step {step}"),
            ));
        }
        self.validate(&self.default_value())
            .map_err(|e| ParameterError::invalid_descriptor(self.label, e.to_string()))
    }
}

/// Ordered descriptor list with unique labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    descriptors: Vec<ParameterDescriptor>,
}

impl ParameterSet {
    pub fn new(descriptors: Vec<ParameterDescriptor>) -> Result<Self, ParameterError> {
        for (i, d) in descriptors.iter().enumerate() {
            if descriptors[..i].iter().any(|other| other.label == d.label) {
                return Err(ParameterError::DuplicateLabel(d.label.to_string()));
            }
            d.check()?;
        }
        Ok(Self { descriptors })
    }

    /// Descriptors in declaration order.
    pub fn describe(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, label: &str) -> Option<&ParameterDescriptor> {
        self.descriptors.iter().find(|d| d.label == label)
    }

    /// Looks up `label` and validates `value` against it.
    pub fn validate(
        &self,
        label: &str,
        value: &ParameterValue,
    ) -> Result<&ParameterDescriptor, ParameterError> {
        let descriptor = self
            .get(label)
            .ok_or_else(|| ParameterError::invalid_value(label, "unknown parameter"))?;
        descriptor.validate(value)?;
        Ok(descriptor)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x_slider() -> ParameterDescriptor {
        ParameterDescriptor::numeric(
            "x",
            0.0,
            (-150.0, 100.0),
            1.0,
            StateCommand::set(StateTarget::Translation(Axis::X)),
        )
    }

    fn mode_choice() -> ParameterDescriptor {
        ParameterDescriptor::single_choice(
            "mode",
            "lines",
            &["lines", "points"],
            StateCommand::set(StateTarget::Choice("mode")),
        )
    }

    #[test]
    fn numeric_range_is_inclusive() {
        let d = x_slider();
        assert!(d.validate(&ParameterValue::Numeric(-150.0)).is_ok());
        assert!(d.validate(&ParameterValue::Numeric(100.0)).is_ok());
        assert!(d.validate(&ParameterValue::Numeric(100.5)).is_err());
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let d = x_slider();
        assert!(d.validate(&ParameterValue::Numeric(f32::NAN)).is_err());
        assert!(d.validate(&ParameterValue::Numeric(f32::INFINITY)).is_err());
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let err = x_slider().validate(&ParameterValue::Boolean(true)).unwrap_err();
        assert!(matches!(err, ParameterError::InvalidParameterValue { .. }));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let d = mode_choice();
        assert!(d.validate(&ParameterValue::Choice("points".into())).is_ok());
        assert!(d.validate(&ParameterValue::Choice("mesh".into())).is_err());
    }

    #[test]
    fn selection_must_be_distinct_known_options() {
        let d = ParameterDescriptor::multi_choice(
            "show",
            &["a"],
            &["a", "b"],
            StateCommand::set(StateTarget::Selection("show")),
        );
        assert!(d.validate(&ParameterValue::Selection(vec![])).is_ok());
        assert!(d.validate(&ParameterValue::Selection(vec!["a".into(), "b".into()])).is_ok());
        assert!(d.validate(&ParameterValue::Selection(vec!["c".into()])).is_err());
        assert!(d.validate(&ParameterValue::Selection(vec!["a".into(), "a".into()])).is_err());
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let err = ParameterSet::new(vec![x_slider(), mode_choice(), x_slider()]).unwrap_err();
        assert_eq!(err, ParameterError::DuplicateLabel("x".into()));
    }

    #[test]
    fn describe_keeps_declaration_order() {
        let set = ParameterSet::new(vec![mode_choice(), x_slider()]).unwrap();
        let labels: Vec<_> = set.describe().iter().map(|d| d.label).collect();
        assert_eq!(labels, vec!["mode", "x"]);
    }

    #[test]
    fn default_outside_range_is_rejected() {
        let d = ParameterDescriptor::numeric(
            "z",
            0.0,
            (-500.0, -200.0),
            1.0,
            StateCommand::set(StateTarget::Translation(Axis::Z)),
        );
        assert!(matches!(
            ParameterSet::new(vec![d]),
            Err(ParameterError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn command_must_accept_kind() {
        let d = ParameterDescriptor::boolean(
            "flag",
            false,
            StateCommand::set(StateTarget::Scalar("flag")),
        );
        assert!(ParameterSet::new(vec![d]).is_err());
    }

    #[test]
    fn unknown_label_is_invalid_value() {
        let set = ParameterSet::new(vec![x_slider()]).unwrap();
        assert!(matches!(
            set.validate("y", &ParameterValue::Numeric(0.0)),
            Err(ParameterError::InvalidParameterValue { .. })
        ));
    }
}
