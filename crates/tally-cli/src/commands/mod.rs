//! Command implementations.

mod call;
mod contracts;
mod deploy;
mod init_config;

pub use call::CallCommand;
pub use contracts::ContractsCommand;
pub use deploy::DeployCommand;
pub use init_config::InitConfigCommand;
