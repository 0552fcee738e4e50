pub mod access;
pub mod roster;
pub mod validate;
