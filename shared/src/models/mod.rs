//! Domain models for the liquor inventory platform

mod bottle;
mod branch;
mod ingredient;
mod inspection;
mod pos;
mod product;
mod report;

pub use bottle::*;
pub use branch::*;
pub use ingredient::*;
pub use inspection::*;
pub use pos::*;
pub use product::*;
pub use report::*;
