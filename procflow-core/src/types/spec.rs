use std::fmt;

use crate::expressions::Expression;

/// Identifies one immutable version of a process or step specification.
///
/// A version of `0` in a lookup means "latest version registered under this
/// name". Equality and hashing only consider `name` and `version`; `active`
/// is carried along but is a property of the registered spec, not of the
/// reference.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "SpecIdRepr")]
pub struct SpecId {
    pub name: String,
    pub version: u32,
    pub active: bool,
}

impl SpecId {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            active: true,
        }
    }

    /// Reference to the highest registered version of `name`.
    pub fn latest(name: impl Into<String>) -> Self {
        Self::new(name, 0)
    }

    pub fn is_latest_query(&self) -> bool {
        self.version == 0
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

impl PartialEq for SpecId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for SpecId {}

impl std::hash::Hash for SpecId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version == 0 {
            write!(f, "{}@latest", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.version)
        }
    }
}

// Spec documents may reference specs either as `name`, `name@version` or as a
// full `{name, version, active}` mapping.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SpecIdRepr {
    Short(String),
    Full {
        name: String,
        #[serde(default)]
        version: u32,
        #[serde(default = "default_active")]
        active: bool,
    },
}

fn default_active() -> bool {
    true
}

impl TryFrom<SpecIdRepr> for SpecId {
    type Error = String;

    fn try_from(repr: SpecIdRepr) -> Result<Self, Self::Error> {
        match repr {
            SpecIdRepr::Full {
                name,
                version,
                active,
            } => Ok(SpecId {
                name,
                version,
                active,
            }),
            SpecIdRepr::Short(s) => match s.split_once('@') {
                None => Ok(SpecId::latest(s)),
                Some((name, "latest")) => Ok(SpecId::latest(name)),
                Some((name, version)) => version
                    .parse::<u32>()
                    .map(|v| SpecId::new(name, v))
                    .map_err(|_| format!("invalid spec version in reference '{s}'")),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    #[default]
    Any,
}

/// A named, typed input field of a process together with its optional
/// validation expression.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataFieldSpec {
    pub name: String,

    #[serde(default, rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpec {
    pub spec_id: SpecId,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub data_field_specs: Vec<DataFieldSpec>,

    pub initial_steps: Vec<SpecId>,
}

impl ProcessSpec {
    pub fn is_active(&self) -> bool {
        self.spec_id.active
    }

    pub fn field(&self, name: &str) -> Option<&DataFieldSpec> {
        self.data_field_specs.iter().find(|f| f.name == name)
    }
}

/// A point where an external actor supplies part of the process data.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputStepSpec {
    pub spec_id: SpecId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_expression: Option<Expression>,

    #[serde(default)]
    pub predecessor_steps: Vec<SpecId>,

    #[serde(default)]
    pub successor_steps: Vec<SpecId>,

    #[serde(default)]
    pub input_field_names: Vec<String>,
}

/// A step executed automatically by the engine, without an external actor.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStepSpec {
    pub spec_id: SpecId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_expression: Option<Expression>,

    #[serde(default)]
    pub predecessor_steps: Vec<SpecId>,

    #[serde(default)]
    pub successor_steps: Vec<SpecId>,

    pub action: SystemAction,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SystemAction {
    /// Succeeds when the expression evaluates to true against process data.
    Expression { expression: Expression },
    /// Delegates to a handler registered with the engine under `name`.
    Handler { name: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepSpec {
    Input(InputStepSpec),
    System(SystemStepSpec),
}

impl StepSpec {
    pub fn spec_id(&self) -> &SpecId {
        match self {
            StepSpec::Input(s) => &s.spec_id,
            StepSpec::System(s) => &s.spec_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec_id().name
    }

    pub fn is_active(&self) -> bool {
        self.spec_id().active
    }

    pub fn guard_expression(&self) -> Option<&Expression> {
        match self {
            StepSpec::Input(s) => s.guard_expression.as_ref(),
            StepSpec::System(s) => s.guard_expression.as_ref(),
        }
    }

    pub fn predecessor_steps(&self) -> &[SpecId] {
        match self {
            StepSpec::Input(s) => &s.predecessor_steps,
            StepSpec::System(s) => &s.predecessor_steps,
        }
    }

    pub fn successor_steps(&self) -> &[SpecId] {
        match self {
            StepSpec::Input(s) => &s.successor_steps,
            StepSpec::System(s) => &s.successor_steps,
        }
    }

    pub fn as_input(&self) -> Option<&InputStepSpec> {
        match self {
            StepSpec::Input(s) => Some(s),
            StepSpec::System(_) => None,
        }
    }

    pub fn as_system(&self) -> Option<&SystemStepSpec> {
        match self {
            StepSpec::System(s) => Some(s),
            StepSpec::Input(_) => None,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            StepSpec::Input(_) => "input",
            StepSpec::System(_) => "system",
        }
    }
}

/// The unit of spec registration: a set of processes and the steps they use.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpecDocument {
    #[serde(default)]
    pub processes: Vec<ProcessSpec>,

    #[serde(default)]
    pub steps: Vec<StepSpec>,
}
