//! Dashboard widgets.

mod device;
mod processes;
mod system;

pub use device::{BAR_WIDTH, bar, bar_fill, render_device, spark_level, sparkline};
pub use processes::render_processes;
pub use system::render_system;
