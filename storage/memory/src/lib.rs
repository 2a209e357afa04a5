mod apply;
mod check;
mod memory;
mod page;
mod sequence;
mod state;

pub use memory::MemoryStore;
