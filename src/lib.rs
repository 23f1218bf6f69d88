pub mod dimred;
pub mod error;
pub mod interop;
pub mod neighbors;

pub use dimred::lle::{LLEBuilder, LleFit, LocallyLinearEmbedding, ReconstructionPolicy};
pub use error::LleError;
pub use interop::embed_flat;
