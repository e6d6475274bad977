//! Auth-domain token models, scope sets, and the user login session.

pub mod scope;
pub mod session;
pub mod token;

pub use scope::*;
pub use session::*;
pub use token::{app::*, secret::*, user::*};
