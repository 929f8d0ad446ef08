//! Handler definitions and the registry built from them.
//!
//! A [`Definition`] describes one of three handler kinds - a command chain, a
//! scheduled job, or an adapter-bound handler - with the discriminant fixed
//! at construction time. [`HandlerRegistry::load`] consumes an ordered
//! collection of definitions exactly once, before the dispatcher starts
//! accepting events; the registry is immutable thereafter.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::foundation::context::{AdapterContext, Context};
use crate::foundation::directory::ChannelDirectory;
use crate::foundation::error::HandlerResult;
use crate::framework::jobs::{ScheduledJob, parse_schedule};
use crate::integration::adapter::EventAdapter;
use crate::integration::client::BoxedClient;

/// A type-erased command handler.
///
/// Handlers receive the shared per-dispatch [`Context`] and return a
/// [`HandlerResult`]; the same shape is used for command chains and
/// scheduled jobs.
pub type CommandHandler = Arc<dyn Fn(Arc<Context>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Boxes an async closure into a [`CommandHandler`].
pub fn handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Type-erased binding for an adapter-bound handler.
///
/// Invoked once at load time with the freshly bound context; spawns the
/// subscription task and returns its handle.
type AdapterBinding = Box<dyn FnOnce(Arc<Context>) -> JoinHandle<()> + Send>;

/// A handler definition, tagged by kind at construction.
pub enum Definition {
    /// An ordered handler chain registered under a command token.
    Command {
        /// The command token (the leading word of a message).
        name: String,
        /// The chain, in invocation order.
        handlers: Vec<CommandHandler>,
    },
    /// A timer-driven handler registered under a job name.
    Job {
        /// The job name.
        name: String,
        /// Cron schedule expression, parsed at load time.
        schedule: String,
        /// The handler invoked on each tick.
        handler: CommandHandler,
    },
    /// A handler subscribed to an [`EventAdapter`]'s emissions.
    Adapter {
        /// The adapter-bound handler's name.
        name: String,
        /// The load-time binding closure.
        bind: AdapterBinding,
    },
}

impl Definition {
    /// Creates a command definition.
    pub fn command(name: impl Into<String>, handlers: Vec<CommandHandler>) -> Self {
        Self::Command {
            name: name.into(),
            handlers,
        }
    }

    /// Creates a scheduled-job definition.
    ///
    /// The schedule expression stays opaque until load, when it is parsed by
    /// the cron scheduler.
    pub fn job(
        name: impl Into<String>,
        schedule: impl Into<String>,
        handler: CommandHandler,
    ) -> Self {
        Self::Job {
            name: name.into(),
            schedule: schedule.into(),
            handler,
        }
    }

    /// Creates an adapter-bound definition.
    ///
    /// At load time the handler is subscribed to `adapter`: every emission is
    /// placed into the context's payload slot and the handler invoked.
    /// Handler failures are logged and do not end the subscription.
    pub fn adapter<T, F, Fut>(
        name: impl Into<String>,
        adapter: &EventAdapter<T>,
        handler: F,
    ) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Arc<AdapterContext<T>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        let mut rx = adapter.subscribe();
        let bind: AdapterBinding = Box::new(move |base: Arc<Context>| {
            let ctx = Arc::new(AdapterContext::new(base));
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(data) => {
                            ctx.set_payload(data);
                            if let Err(e) = handler(Arc::clone(&ctx)).await {
                                error!(handler = %task_name, error = %e, "adapter handler failed");
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(handler = %task_name, missed, "adapter handler lagged");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            })
        });
        Self::Adapter { name, bind }
    }

    /// Returns the registered name of this definition.
    pub fn name(&self) -> &str {
        match self {
            Self::Command { name, .. } | Self::Job { name, .. } | Self::Adapter { name, .. } => {
                name
            }
        }
    }
}

impl std::fmt::Debug for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Command { .. } => "command",
            Self::Job { .. } => "job",
            Self::Adapter { .. } => "adapter",
        };
        f.debug_struct("Definition")
            .field("kind", &kind)
            .field("name", &self.name())
            .finish()
    }
}

/// Errors that can occur while loading definitions.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A job's schedule expression failed to parse.
    #[error("invalid schedule for job '{name}': {reason}")]
    InvalidSchedule {
        /// The job name.
        name: String,
        /// Parse failure detail.
        reason: String,
    },
}

/// Mapping from command name to handler chain, plus the job table.
///
/// Built once during the load phase; read-only afterwards, so it needs no
/// synchronization.
pub struct HandlerRegistry {
    commands: HashMap<String, Vec<CommandHandler>>,
    jobs: HashMap<String, Arc<ScheduledJob>>,
    adapter_tasks: Vec<JoinHandle<()>>,
}

impl HandlerRegistry {
    /// Builds a registry from an ordered collection of definitions.
    ///
    /// Command and job names are independently unique; registering the same
    /// name twice replaces the prior entry (last registration wins).
    /// `on_register` is invoked with each registered name, in order - callers
    /// typically use it for startup logging. An empty collection is a valid
    /// no-op load.
    ///
    /// Scheduled jobs are bound to a fresh [`Context`] sharing the live
    /// channel directory. Adapter definitions spawn their subscription task
    /// here, so loading them requires a running tokio runtime.
    pub fn load(
        definitions: Vec<Definition>,
        client: BoxedClient,
        directory: Arc<ChannelDirectory>,
        mut on_register: impl FnMut(&str),
    ) -> Result<Self, RegistryError> {
        let mut registry = Self {
            commands: HashMap::new(),
            jobs: HashMap::new(),
            adapter_tasks: Vec::new(),
        };

        for definition in definitions {
            match definition {
                Definition::Command { name, handlers } => {
                    on_register(&name);
                    registry.commands.insert(name, handlers);
                }
                Definition::Job {
                    name,
                    schedule,
                    handler,
                } => {
                    let schedule = parse_schedule(&schedule).map_err(|e| {
                        RegistryError::InvalidSchedule {
                            name: name.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    let context =
                        Arc::new(Context::for_job(client.clone(), Arc::clone(&directory)));
                    on_register(&name);
                    registry.jobs.insert(
                        name.clone(),
                        Arc::new(ScheduledJob::new(name, schedule, handler, context)),
                    );
                }
                Definition::Adapter { name, bind } => {
                    let context =
                        Arc::new(Context::for_job(client.clone(), Arc::clone(&directory)));
                    on_register(&name);
                    registry.adapter_tasks.push(bind(context));
                }
            }
        }

        Ok(registry)
    }

    /// Returns the handler chain registered under `command`, if any.
    pub fn chain(&self, command: &str) -> Option<&[CommandHandler]> {
        self.commands.get(command).map(Vec::as_slice)
    }

    /// Returns all registered command names, unordered.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Returns all registered scheduled jobs.
    pub fn jobs(&self) -> impl Iterator<Item = &Arc<ScheduledJob>> {
        self.jobs.values()
    }

    /// Returns the number of registered commands.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Returns the number of registered jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("commands", &self.commands.len())
            .field("jobs", &self.jobs.len())
            .field("adapter_tasks", &self.adapter_tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::client::tests::RecordingClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn deps() -> (BoxedClient, Arc<ChannelDirectory>) {
        (RecordingClient::arc(), Arc::new(ChannelDirectory::new()))
    }

    fn noop() -> CommandHandler {
        handler(|_ctx| async { Ok(()) })
    }

    #[tokio::test]
    async fn empty_load_is_noop() {
        let (client, directory) = deps();
        let registry = HandlerRegistry::load(Vec::new(), client, directory, |_| {}).unwrap();
        assert_eq!(registry.command_count(), 0);
        assert_eq!(registry.job_count(), 0);
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let (client, directory) = deps();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&first);
        let s = Arc::clone(&second);
        let definitions = vec![
            Definition::command(
                "!ping",
                vec![handler(move |_ctx| {
                    let f = Arc::clone(&f);
                    async move {
                        f.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })],
            ),
            Definition::command(
                "!ping",
                vec![handler(move |_ctx| {
                    let s = Arc::clone(&s);
                    async move {
                        s.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })],
            ),
        ];

        let registry =
            HandlerRegistry::load(definitions, client.clone(), directory.clone(), |_| {}).unwrap();
        assert_eq!(registry.command_count(), 1);

        let chain = registry.chain("!ping").unwrap();
        let ctx = Arc::new(Context::for_job(client, directory));
        chain[0](ctx).await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn on_register_sees_every_name_in_order() {
        let (client, directory) = deps();
        let definitions = vec![
            Definition::command("!a", vec![noop()]),
            Definition::job("daily", "0 0 9 * * *", noop()),
            Definition::command("!b", vec![noop()]),
        ];

        let mut seen = Vec::new();
        HandlerRegistry::load(definitions, client, directory, |name| {
            seen.push(name.to_string());
        })
        .unwrap();
        assert_eq!(seen, vec!["!a", "daily", "!b"]);
    }

    #[tokio::test]
    async fn invalid_schedule_fails_load() {
        let (client, directory) = deps();
        let definitions = vec![Definition::job("broken", "not a schedule", noop())];
        let err = HandlerRegistry::load(definitions, client, directory, |_| {}).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchedule { ref name, .. } if name == "broken"));
    }

    #[tokio::test]
    async fn adapter_definition_receives_emissions() {
        let (client, directory) = deps();
        let adapter: EventAdapter<u32> = EventAdapter::default();
        let seen = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&seen);
        let definitions = vec![Definition::adapter("counter", &adapter, move |ctx| {
            let s = Arc::clone(&s);
            async move {
                s.fetch_add(ctx.payload().unwrap_or(0) as usize, Ordering::SeqCst);
                Ok(())
            }
        })];

        let _registry = HandlerRegistry::load(definitions, client, directory, |_| {}).unwrap();
        adapter.emit(5);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }
}
