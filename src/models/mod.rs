mod order;
mod script;
mod user;

pub use order::*;
pub use script::*;
pub use user::*;
