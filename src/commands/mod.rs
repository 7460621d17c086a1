pub mod build;
pub mod check;
pub mod expand;
pub mod init;

pub use build::{execute_build, BuildResult, TargetSummary};
pub use check::{execute_check, CheckResult};
pub use expand::{execute_expand, ExpandResult};
pub use init::{execute_init, InitResult};

#[cfg(feature = "cli")]
pub use build::print_build_summary;
#[cfg(feature = "cli")]
pub use check::print_check_summary;
#[cfg(feature = "cli")]
pub use expand::print_expand_summary;
#[cfg(feature = "cli")]
pub use init::print_init_summary;
