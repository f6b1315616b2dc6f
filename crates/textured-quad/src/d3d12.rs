pub mod device;

pub mod barrier;
pub mod command_queue;
pub mod descriptor;
pub mod fence;
pub mod pipeline;
pub mod resource;
pub mod shader;
pub mod swap_chain;
pub mod util;
