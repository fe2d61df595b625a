//! Host-side collaborators used by the Redock CLI.
//!
//! None of these touch the state store; they are small, single-step
//! helpers around the local machine.

mod error;
pub mod ids;
pub mod keys;
pub mod mirror;
pub mod net;
pub mod shell;
pub mod terminal;

pub use error::{HostError, Result};
pub use ids::{slug, summarize_id};
pub use keys::{KeyPairStatus, KeyProvisioner};
pub use mirror::{HttpMirrorList, MirrorSelector, MirrorSource, DEFAULT_MIRROR_LIST_URL};
pub use net::local_ipv4_addresses;
pub use shell::{apt_get_install, quote_command_line};
pub use terminal::{AttachedTerminal, RemoteTerminal};
