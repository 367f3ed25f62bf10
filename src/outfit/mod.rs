pub(crate) mod catalog;
pub(crate) mod generator;
pub(crate) mod selection;
