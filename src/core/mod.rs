// Domain-layer modules and shared errors/models
pub mod features {
    pub use crate::features::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}

pub mod model {
    pub use crate::model::*;
}

pub mod sentiment {
    pub use crate::sentiment::*;
}

pub mod signals {
    pub use crate::signals::*;
}

pub mod conversation {
    pub use crate::conversation::*;
}

pub mod preprocess {
    pub use crate::preprocess::*;
}

pub mod errors {
    pub use crate::errors::*;
}
