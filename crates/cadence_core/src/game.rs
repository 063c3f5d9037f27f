//! The runtime instance: one world, one system registry, one scheduler.
//!
//! Nothing here is global. Two `Game`s in the same process share no state.
//! The world is reference counted: [`Game::world_handle`] gives systems and
//! other threads their own handle, usable while the game runs.
//!
//! ```ignore
//! let mut game = Game::new();
//! game.create_entity()
//!     .with(Position::new(50.0, 50.0))?
//!     .with(Velocity::new(2.0, -1.0))?;
//!
//! game.add_system(movement)?;
//! game.add_threaded_system(physics, 60.0)?;
//! game.add_main_thread_system(render)?;
//!
//! let stop = game.stop_handle();
//! // hand `stop` to whatever decides the game is over ...
//! let summary = game.start()?;
//! ```

use crate::config::SchedulerConfig;
use crate::ecs::system::{short_type_name, FunctionSystem, SystemFn};
use crate::ecs::system_registry::SystemRegistry;
use crate::ecs::{
    Component, ComponentMeta, Entity, EntityRef, ExecutionMode, SystemDescriptor, SystemHandle,
    SystemRegistrationError, World, WorldError,
};
use crate::scheduler::{
    self, ErrorHook, RunSummary, SchedulerError, SchedulerState, StopHandle, StopSignal,
    SystemInvocationError,
};
use crate::time::CallRate;
use cadence_metrics::SystemProfiler;
use std::sync::Arc;
use tracing::info;

pub struct Game {
    world: Arc<World>,
    systems: SystemRegistry,
    config: SchedulerConfig,
    signal: Arc<StopSignal>,
    error_hook: Option<ErrorHook>,
}

impl Game {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            world: Arc::new(World::new()),
            systems: SystemRegistry::new(),
            config,
            signal: Arc::new(StopSignal::new()),
            error_hook: None,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Shared handle to the world, for systems and other threads to capture.
    ///
    /// Every `World` method is safe to call while the game runs. Inside a
    /// system body, changes to the types that system queries go through
    /// [`World::commands`].
    pub fn world_handle(&self) -> Arc<World> {
        Arc::clone(&self.world)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SchedulerConfig {
        &mut self.config
    }

    // ---- entities and components -------------------------------------

    pub fn register_component<T: Component>(&self) -> ComponentMeta {
        self.world.register_component::<T>()
    }

    pub fn create_entity(&self) -> EntityRef<'_> {
        self.world.create_entity()
    }

    pub fn add_component<T: Component>(&self, entity: Entity, value: T) -> Result<Option<T>, WorldError> {
        self.world.add_component(entity, value)
    }

    // ---- systems ------------------------------------------------------

    /// Register `system` to run once per tick on the scheduler thread.
    pub fn add_system<Q, F>(&mut self, system: F) -> Result<SystemHandle, SystemRegistrationError>
    where
        Q: 'static,
        F: SystemFn<Q> + Send + 'static,
    {
        self.add_system_named(short_type_name::<F>(), ExecutionMode::PerFrame, system)
    }

    /// Register `system` on its own worker thread, invoked about `hz` times
    /// per second.
    pub fn add_threaded_system<Q, F>(&mut self, system: F, hz: f64) -> Result<SystemHandle, SystemRegistrationError>
    where
        Q: 'static,
        F: SystemFn<Q> + Send + 'static,
    {
        let name = short_type_name::<F>();
        let rate = CallRate::new(hz).map_err(|source| SystemRegistrationError::InvalidCallRate {
            name: name.to_string(),
            source,
        })?;
        self.add_system_named(name, ExecutionMode::Threaded(rate), system)
    }

    /// Register `system` to run once per tick on the thread that calls
    /// [`Game::start`]. The system does not need to be `Send`.
    pub fn add_main_thread_system<Q, F>(&mut self, system: F) -> Result<SystemHandle, SystemRegistrationError>
    where
        Q: 'static,
        F: SystemFn<Q> + 'static,
    {
        let descriptor = SystemDescriptor::new(short_type_name::<F>(), ExecutionMode::MainThreadOnly)
            .with_components(F::components());
        self.systems.validate(&descriptor, &self.world)?;
        info!(system = %descriptor, "system registered");
        Ok(self
            .systems
            .register_local(descriptor, Box::new(FunctionSystem::new(system))))
    }

    /// Register `system` under an explicit name and mode.
    pub fn add_system_named<Q, F>(
        &mut self,
        name: impl Into<String>,
        mode: ExecutionMode,
        system: F,
    ) -> Result<SystemHandle, SystemRegistrationError>
    where
        Q: 'static,
        F: SystemFn<Q> + Send + 'static,
    {
        let descriptor = SystemDescriptor::new(name, mode).with_components(F::components());
        self.systems.validate(&descriptor, &self.world)?;
        info!(system = %descriptor, "system registered");
        Ok(self
            .systems
            .register_shared(descriptor, Box::new(FunctionSystem::new(system))))
    }

    pub fn system(&self, handle: SystemHandle) -> Option<&SystemDescriptor> {
        self.systems.descriptor(handle)
    }

    /// Every registered system, in registration order.
    pub fn systems(&self) -> impl Iterator<Item = (SystemHandle, &SystemDescriptor)> {
        self.systems.iter()
    }

    pub fn per_frame_systems(&self) -> impl Iterator<Item = (SystemHandle, &SystemDescriptor)> {
        self.systems.per_frame_systems()
    }

    pub fn threaded_systems(&self) -> impl Iterator<Item = (SystemHandle, &SystemDescriptor)> {
        self.systems.threaded_systems()
    }

    pub fn main_thread_systems(&self) -> impl Iterator<Item = (SystemHandle, &SystemDescriptor)> {
        self.systems.main_thread_systems()
    }

    /// Install a callback for every failed system invocation. It runs on
    /// whichever thread ran the failing system.
    pub fn on_system_error<H>(&mut self, hook: H)
    where
        H: Fn(&SystemInvocationError) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
    }

    // ---- running ------------------------------------------------------

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(Arc::clone(&self.signal))
    }

    /// Request a stop; same as [`StopHandle::stop`].
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    pub fn state(&self) -> SchedulerState {
        self.signal.state()
    }

    /// Run until stopped, blocking the calling thread.
    ///
    /// Spawns one worker per threaded system, runs the tick loop on this
    /// thread, and joins every worker before returning. The game may be
    /// started again afterwards.
    pub fn start(&mut self) -> Result<RunSummary, SchedulerError> {
        scheduler::run(
            &self.world,
            &mut self.systems,
            &self.config,
            &self.signal,
            self.error_hook.as_ref(),
        )
    }

    /// Alias for [`Game::start`].
    pub fn run(&mut self) -> Result<RunSummary, SchedulerError> {
        self.start()
    }

    /// Run exactly one tick (per-frame, then main-thread systems) on the
    /// calling thread without starting any workers.
    pub fn tick(&mut self) -> Vec<SystemInvocationError> {
        let split = self.systems.split_mut();
        let mut profiler = SystemProfiler::new();
        let failures = scheduler::tick(
            &self.world,
            split.per_frame,
            split.main_thread,
            self.error_hook.as_ref(),
            &mut profiler,
        );
        for entry in split.per_frame.iter_mut() {
            entry.stats.busy += profiler.timing(&entry.handle);
        }
        for entry in split.main_thread.iter_mut() {
            entry.stats.busy += profiler.timing(&entry.handle);
        }
        failures
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;
    use crate::ecs::SystemResult;
    use std::sync::Mutex;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Counter(u32);
    define_component!(Counter);

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Unseen;
    define_component!(Unseen);

    fn count(counters: Vec<&mut Counter>) -> SystemResult {
        for c in counters {
            c.0 += 1;
        }
        Ok(())
    }

    #[test]
    fn registration_validates_signature() {
        let mut game = Game::new();
        game.register_component::<Counter>();

        assert!(game.add_system(count).is_ok());
        let err = game
            .add_system(|_: Vec<&mut Unseen>| -> SystemResult { Ok(()) })
            .unwrap_err();
        assert!(matches!(
            err,
            SystemRegistrationError::InvalidSystemSignature { component: "Unseen", .. }
        ));

        let err = game.add_threaded_system(count, 0.0).unwrap_err();
        assert!(matches!(err, SystemRegistrationError::InvalidCallRate { .. }));
        assert_eq!(game.systems().count(), 1);
    }

    #[test]
    fn default_names_come_from_the_function() {
        let mut game = Game::new();
        game.register_component::<Counter>();
        let handle = game.add_system(count).unwrap();
        assert_eq!(game.system(handle).map(|d| d.name()), Some("count"));

        let named = game
            .add_system_named("tally", ExecutionMode::PerFrame, count)
            .unwrap();
        assert_eq!(game.system(named).map(|d| d.name()), Some("tally"));
    }

    #[test]
    fn tick_runs_per_frame_before_main_thread_in_order() {
        let mut game = Game::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["render", "overlay"] {
            let order = Arc::clone(&order);
            game.add_main_thread_system(move || -> SystemResult {
                order.lock().unwrap().push(label);
                Ok(())
            })
            .unwrap();
        }
        for label in ["s1", "s2", "s3"] {
            let order = Arc::clone(&order);
            game.add_system(move || -> SystemResult {
                order.lock().unwrap().push(label);
                Ok(())
            })
            .unwrap();
        }

        assert!(game.tick().is_empty());
        assert!(game.tick().is_empty());
        let expected = ["s1", "s2", "s3", "render", "overlay"];
        let seen = order.lock().unwrap().clone();
        assert_eq!(seen[..5], expected);
        assert_eq!(seen[5..], expected);
    }

    #[test]
    fn main_thread_systems_need_not_be_send() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut game = Game::new();
        let calls = Rc::new(RefCell::new(0));
        let inner = Rc::clone(&calls);
        game.add_main_thread_system(move || -> SystemResult {
            *inner.borrow_mut() += 1;
            Ok(())
        })
        .unwrap();

        game.tick();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(game.main_thread_systems().count(), 1);
    }

    #[test]
    fn stop_before_start_ends_the_run_at_once() {
        let mut game = Game::with_config(SchedulerConfig::unpaced());
        game.create_entity().with(Counter(0)).unwrap();
        let per_frame = game.add_system(count).unwrap();
        let threaded = game
            .add_threaded_system(
                |_: Vec<&mut Counter>| -> SystemResult { Ok(()) },
                1000.0,
            )
            .unwrap();

        game.stop_handle().stop();
        assert_eq!(game.state(), SchedulerState::Stopped);

        let started = std::time::Instant::now();
        let summary = game.start().unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.system(per_frame).map(|r| r.invocations), Some(0));
        assert_eq!(summary.system(threaded).map(|r| r.invocations), Some(0));
        assert_eq!(game.state(), SchedulerState::Stopped);

        // The early stop was used up; a bounded run now ticks normally.
        game.config_mut().max_ticks = 3;
        assert_eq!(game.start().unwrap().ticks, 3);
    }

    #[test]
    fn systems_spawn_through_the_world_handle() {
        let mut game = Game::with_config(SchedulerConfig::unpaced().with_max_ticks(3));
        game.create_entity().with(Counter(0)).unwrap();

        let world = game.world_handle();
        game.add_system(move |counters: Vec<&mut Counter>| -> SystemResult {
            let commands = world.commands();
            for _ in counters {
                let child = commands.spawn();
                commands.insert(child, Counter(0));
            }
            Ok(())
        })
        .unwrap();

        let summary = game.start().unwrap();
        assert_eq!(summary.total_failures(), 0);
        // 1 -> 2 -> 4 -> 8: each tick doubles, the last batch lands after the run.
        assert_eq!(game.world().count_with::<Counter>(), 8);
        assert_eq!(game.world().entity_count(), 8);
    }

    #[test]
    fn games_do_not_share_state() {
        let a = Game::new();
        let b = Game::new();
        let e = a.create_entity().with(Counter(1)).unwrap().id();
        assert_eq!(a.world().entity_count(), 1);
        assert_eq!(b.world().entity_count(), 0);
        assert_eq!(b.world().get::<Counter>(e), None);
    }

    #[test]
    fn max_ticks_bounds_a_run() {
        let mut game = Game::with_config(SchedulerConfig::unpaced().with_max_ticks(5));
        game.create_entity().with(Counter(0)).unwrap();
        let handle = game.add_system(count).unwrap();

        let summary = game.start().unwrap();
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.system(handle).map(|r| r.invocations), Some(5));
        assert_eq!(game.world().all_with_type::<Counter>()[0].1, Counter(5));
        assert_eq!(game.state(), SchedulerState::Stopped);
    }
}
