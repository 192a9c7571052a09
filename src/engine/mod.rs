pub mod align;
pub mod compose;
pub mod pool;

pub use align::{Alignment, InputState};
