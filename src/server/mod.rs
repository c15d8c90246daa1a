pub mod admin;
pub mod error;
pub mod handler;
pub mod listener;
pub mod manager;

pub use admin::AdminHandler;
pub use error::Error;
pub use handler::RequestHandler;
pub use listener::ServerListener;
pub use manager::ServerManager;

pub type Result<T> = std::result::Result<T, Error>;
