//! Core library for otto: the command registry and resolution engine.
//!
//! # Architecture
//!
//! - **Layout**: where the global (`~/.otto`) and project-local (`./.otto`)
//!   scopes live, and where each pack's directory sits inside them.
//! - **Pack lifecycle**: [`pack::PackDirectory`] keeps a pack's scripts, its
//!   index document and its scope's root document consistent across create,
//!   move, clone and delete. [`repair`] rebuilds all of it from the files on
//!   disk. [`archive`] packages and installs packs as `.opack` tarballs.
//! - **Registry**: [`CommandRegistry`] indexes `(pack, command)` pairs to either
//!   a compiled-in handle or a script path, resolves bare and qualified names
//!   with `local` > installed > `base` precedence, and loads only the command
//!   being run.
//! - **Capabilities**: [`ProcessRunner`] and [`Reporter`] are injected so the
//!   core never talks to the terminal or spawns processes directly.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.otto/                 ./.otto/
//! ├── config.json          ├── config.json
//! ├── res/                 ├── res/
//! └── <pack>/              └── local/
//!     ├── cmds.json            ├── cmds.json
//!     └── <command>.sh         └── <command>.sh
//! ```

pub mod archive;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod interrupt;
pub mod pack;
pub mod paths;
pub mod process;
pub mod registry;
pub mod repair;
pub mod reporter;
pub mod script;

pub use command::{CodeRef, Command, CommandHandle, CommandLoader, Invocation, ScriptLoader, Session};
pub use dispatcher::Dispatcher;
pub use error::CommandError;
pub use interrupt::Interrupt;
pub use paths::{Layer, Layout};
pub use process::{DryRunner, ProcessError, ProcessRequest, ProcessRunner, SystemRunner};
pub use registry::{CommandRegistry, PackListing, RegistryError};
pub use reporter::{NullReporter, Reporter};
