pub mod fixtures;
pub mod summarizers;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use summarizers::*;
