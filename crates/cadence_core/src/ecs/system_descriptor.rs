use crate::ecs::{ComponentId, ComponentMeta};
use crate::time::CallRate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// When and where a system runs.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Once per tick on the scheduler thread, before main-thread systems.
    PerFrame,
    /// On a dedicated worker with its own timer.
    Threaded(CallRate),
    /// Once per tick on the thread that called `start`.
    MainThreadOnly,
}

impl ExecutionMode {
    pub fn is_threaded(&self) -> bool {
        matches!(self, ExecutionMode::Threaded(_))
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::PerFrame => write!(f, "per-frame"),
            ExecutionMode::Threaded(rate) => write!(f, "threaded@{rate}"),
            ExecutionMode::MainThreadOnly => write!(f, "main-thread"),
        }
    }
}

/// Metadata describing how a system interacts with the ECS world.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemDescriptor {
    name: String,
    components: Vec<ComponentId>,
    component_names: Vec<&'static str>,
    mode: ExecutionMode,
}

impl SystemDescriptor {
    /// Create a new descriptor with the provided name.
    pub fn new(name: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            component_names: Vec::new(),
            mode,
        }
    }

    /// Replace the component list. Order is kept: it is the order the
    /// system receives its lists in.
    pub fn with_components<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = ComponentMeta>,
    {
        self.components.clear();
        self.component_names.clear();
        for meta in components {
            self.components.push(meta.id);
            self.component_names.push(meta.name);
        }
        self
    }

    /// System name (not required to be unique).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared component types, in parameter order.
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    pub fn component_names(&self) -> &[&'static str] {
        &self.component_names
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

impl fmt::Display for SystemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.name, self.component_names.join(", "), self.mode)
    }
}
