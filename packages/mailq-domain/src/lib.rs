pub mod field;
pub mod hit;
pub mod predicate;

pub use field::KnownField;
pub use hit::RawHit;
pub use predicate::{Condition, FilterPredicate, MatchOp};
