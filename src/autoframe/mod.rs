pub(crate) mod focus;
pub(crate) mod resolver;
