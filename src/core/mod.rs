// Domain-layer modules and shared errors/models
pub mod indicators {
    pub use crate::indicators::*;
}

pub mod risk {
    pub use crate::risk::*;
}

pub mod risk_cache {
    pub use crate::risk_cache::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
