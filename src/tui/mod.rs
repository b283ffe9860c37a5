mod handler;
mod host;
mod ui;

pub use handler::{handle_key_event, AppAction};
pub use host::TuiHost;
pub use ui::draw;
