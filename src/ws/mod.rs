//! Socket.IO server: the dashboard's live plot feed.
//!
//! Clients connect to `/socket.io/?EIO=4&transport=websocket`, join the
//! default namespace and then receive every plot as a `plots` event:
//! first the ones already published, then each new one as it arrives.

pub mod connection;
pub mod handler;
pub mod session;

pub use connection::{SessionContext, run_connection};
pub use handler::socket_io_handler;
pub use session::{SessionCounter, SessionGuard};
