pub mod config;
pub mod error;
pub mod pki;
pub mod setup;
pub mod setup_args;
pub mod token;
pub mod vault;
pub mod vault_factory;

pub use error::{SetupError, SetupErrorKind};
pub use setup::{SetupRequest, SetupResult, provision, run_setup};
pub use setup_args::SetupArgs;
