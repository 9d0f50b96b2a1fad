pub mod error;
pub mod handlers;
pub mod routes;
pub mod schema;
pub mod state;

pub use error::Error;
pub use routes::admin_router;
pub use state::AdminState;

pub type Result<T, E = Error> = std::result::Result<T, E>;
