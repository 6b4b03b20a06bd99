pub mod defaults;
pub mod filter;
pub mod projection;

pub use defaults::*;
pub use filter::*;
pub use projection::*;
