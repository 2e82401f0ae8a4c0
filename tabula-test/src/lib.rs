mod memory;
mod recording;

pub use memory::MemoryExecutor;
pub use recording::{RecordingExecutor, Reply};
