pub mod compose_keys;
pub mod finger;
pub mod keymap;
pub mod model;
