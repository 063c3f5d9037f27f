use crate::ecs::system::System;
use crate::ecs::{ExecutionMode, SystemDescriptor, SystemHandle, SystemRegistrationError, World};
use std::time::Duration;

/// Counters the scheduler keeps per system across one or more runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct SystemStats {
    pub invocations: u64,
    pub failures: u64,
    pub aborted: bool,
    pub busy: Duration,
}

pub(crate) struct RegisteredSystem<S: ?Sized> {
    pub handle: SystemHandle,
    pub descriptor: SystemDescriptor,
    pub stats: SystemStats,
    pub system: Box<S>,
}

/// Systems that may run on a worker thread.
pub(crate) type SharedSystem = RegisteredSystem<dyn System + Send>;

/// Systems pinned to the thread that owns the game.
pub(crate) type LocalSystem = RegisteredSystem<dyn System>;

/// Disjoint mutable views of the three mode buckets.
pub(crate) struct RegistrySplit<'a> {
    pub per_frame: &'a mut [SharedSystem],
    pub threaded: &'a mut [SharedSystem],
    pub main_thread: &'a mut [LocalSystem],
}

pub(crate) struct SystemRegistry {
    per_frame: Vec<SharedSystem>,
    threaded: Vec<SharedSystem>,
    main_thread: Vec<LocalSystem>,
    descriptors: Vec<SystemDescriptor>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self {
            per_frame: Vec::new(),
            threaded: Vec::new(),
            main_thread: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    /// Check a descriptor against the component types `world` recognizes.
    pub fn validate(
        &self,
        descriptor: &SystemDescriptor,
        world: &World,
    ) -> Result<(), SystemRegistrationError> {
        let components = descriptor.components();
        let names = descriptor.component_names();

        for (component, name) in components.iter().zip(names) {
            if !world.is_registered(*component) {
                return Err(SystemRegistrationError::InvalidSystemSignature {
                    name: descriptor.name().to_string(),
                    component: *name,
                });
            }
        }

        for (i, component) in components.iter().enumerate() {
            if components[..i].contains(component) {
                return Err(SystemRegistrationError::DuplicateComponent {
                    name: descriptor.name().to_string(),
                    component: names[i],
                });
            }
        }

        Ok(())
    }

    /// Store a validated system whose body may move between threads.
    pub fn register_shared(
        &mut self,
        descriptor: SystemDescriptor,
        system: Box<dyn System + Send>,
    ) -> SystemHandle {
        let handle = self.next_handle(&descriptor);
        let entry = RegisteredSystem {
            handle,
            descriptor,
            stats: SystemStats::default(),
            system,
        };
        match entry.descriptor.mode() {
            ExecutionMode::PerFrame => self.per_frame.push(entry),
            ExecutionMode::Threaded(_) => self.threaded.push(entry),
            ExecutionMode::MainThreadOnly => self.main_thread.push(RegisteredSystem {
                handle: entry.handle,
                descriptor: entry.descriptor,
                stats: entry.stats,
                system: entry.system,
            }),
        }
        handle
    }

    /// Store a validated `MainThreadOnly` system.
    pub fn register_local(&mut self, descriptor: SystemDescriptor, system: Box<dyn System>) -> SystemHandle {
        let handle = self.next_handle(&descriptor);
        self.main_thread.push(RegisteredSystem {
            handle,
            descriptor,
            stats: SystemStats::default(),
            system,
        });
        handle
    }

    fn next_handle(&mut self, descriptor: &SystemDescriptor) -> SystemHandle {
        let handle = SystemHandle::new(self.descriptors.len() as u32);
        self.descriptors.push(descriptor.clone());
        handle
    }

    pub fn descriptor(&self, handle: SystemHandle) -> Option<&SystemDescriptor> {
        self.descriptors.get(handle.index() as usize)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SystemHandle, &SystemDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, descriptor)| (SystemHandle::new(i as u32), descriptor))
    }

    pub fn per_frame_systems(&self) -> impl Iterator<Item = (SystemHandle, &SystemDescriptor)> {
        self.per_frame.iter().map(|entry| (entry.handle, &entry.descriptor))
    }

    pub fn threaded_systems(&self) -> impl Iterator<Item = (SystemHandle, &SystemDescriptor)> {
        self.threaded.iter().map(|entry| (entry.handle, &entry.descriptor))
    }

    pub fn main_thread_systems(&self) -> impl Iterator<Item = (SystemHandle, &SystemDescriptor)> {
        self.main_thread.iter().map(|entry| (entry.handle, &entry.descriptor))
    }

    pub fn stats(&self, handle: SystemHandle) -> Option<SystemStats> {
        self.per_frame
            .iter()
            .chain(&self.threaded)
            .find(|entry| entry.handle == handle)
            .map(|entry| entry.stats)
            .or_else(|| {
                self.main_thread
                    .iter()
                    .find(|entry| entry.handle == handle)
                    .map(|entry| entry.stats)
            })
    }

    pub fn split_mut(&mut self) -> RegistrySplit<'_> {
        RegistrySplit {
            per_frame: &mut self.per_frame,
            threaded: &mut self.threaded,
            main_thread: &mut self.main_thread,
        }
    }
}
