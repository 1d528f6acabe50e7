pub mod block;
pub mod engine;
pub mod state;
pub mod structures;
