pub mod analysis;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod resolve;
pub mod schema;
pub mod table;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use table::{Table, Value};
pub use ui::{Phase, SilentUi, Ui, UiApp};
