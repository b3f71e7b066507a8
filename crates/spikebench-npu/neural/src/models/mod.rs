// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron Model Architecture
//!
//! Neuron models are described by a parameter struct implementing
//! [`NeuronModel`]. The engine precomputes the timestep-dependent constants
//! once (`derive`) and then calls `update` per neuron per step.
//!
//! ## Adding a New Neuron Model
//!
//! 1. Create `src/models/your_model.rs`
//! 2. Implement `NeuronModel` for its parameter struct
//! 3. Add tests
//! 4. Export in `mod.rs`

pub mod init;
pub mod lif;
pub mod traits;

pub use init::VarInit;
pub use lif::{LifDerived, LifParameters};
pub use traits::NeuronModel;
