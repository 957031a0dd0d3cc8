//! Data model and XML reader for simplified RELAX NG schemas, the desugared
//! form produced by tools like `rng2srng` (section 4 of the RELAX NG
//! specification).

pub mod scrub;
pub mod types;
pub mod xml;

pub use scrub::remove_todos;
pub use types::{Data, Define, Grammar, NameOrPattern, Pair, Param, Value};
