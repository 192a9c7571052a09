pub mod lists;
pub mod stream;
pub mod word_sets;

pub use lists::BuiltinLists;
pub use word_sets::WordSet;
