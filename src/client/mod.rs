pub mod account;
pub mod counter;
pub mod session;
pub mod uri;

pub use account::{Account, ActionDispatcher};
pub use counter::{Badge, CounterError, CounterService};
pub use session::{LocalAccount, LocalSession};
pub use uri::{SystemUriHandler, UriHandler};
