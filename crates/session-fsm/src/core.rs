mod session;
mod state;

pub use session::{Emit, Session};
pub use state::{SessionState, SessionTransition, StateHandle};
