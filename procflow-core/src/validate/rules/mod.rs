pub(crate) mod document;
pub(crate) mod graph;
pub(crate) mod process;
pub(crate) mod step;
