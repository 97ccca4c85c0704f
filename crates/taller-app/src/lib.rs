// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod context;
pub mod directory;
pub mod format;
pub mod forms;
pub mod ids;
pub mod lookup;
pub mod modals;
pub mod model;
pub mod orders;
pub mod state;
pub mod validation;
pub mod workflow;

pub use context::*;
pub use directory::*;
pub use forms::*;
pub use ids::*;
pub use lookup::*;
pub use modals::*;
pub use model::*;
pub use orders::*;
pub use state::*;
pub use workflow::*;
