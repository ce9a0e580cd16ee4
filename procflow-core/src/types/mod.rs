mod instance;
mod record;
mod spec;

pub use instance::{
    AdminData, LogItem, ProcessInstance, ProcessStatus, StepInstance, StepInstanceKind, StepStatus,
};
pub use record::{lookup_path, merge_fields, value_to_text, Record};
pub use spec::{
    DataFieldSpec, FieldType, InputStepSpec, ProcessSpec, SpecDocument, SpecId, StepSpec,
    SystemAction, SystemStepSpec,
};
