pub mod builder;
pub mod encoding;
pub mod index;
pub mod ordering;
pub mod persist;
pub mod record;
