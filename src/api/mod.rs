// Thin namespace wrapper for the caller-facing API surface
pub mod models {
    pub use crate::models::*;
}

pub mod state {
    pub use crate::state::*;
}
