// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus-core: Data model for the Nexus task runner

pub mod condition;
pub mod event;
pub mod facts;
pub mod host;
pub mod id;
pub mod resource;
pub mod result;
pub mod task;

pub use condition::{Condition, ConditionError, Value};
pub use event::Event;
pub use facts::Facts;
pub use host::{ConnectionKind, Host, HostGroup, Target};
pub use id::PipelineId;
pub use resource::{DesiredState, PackageState, ResourceSpec, ServiceState};
pub use result::{
    CommandResult, HostResult, HostStatus, PipelineResult, RunStatus, TaskResult, TaskStatus,
};
pub use task::{ArtifactDecl, Step, StepAction, Strategy, Task, WaitForKind, WaitForSpec};
