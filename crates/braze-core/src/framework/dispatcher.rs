//! Event dispatcher for the Braze framework.
//!
//! The [`Dispatcher`] consumes every inbound [`GatewayEvent`], extracts the
//! command token from message events, resolves the registered handler chain,
//! and drives the chain to completion with the yield-to-next protocol. It
//! also keeps the [`ChannelDirectory`] coherent by rebuilding it on channel
//! lifecycle events and on transport-ready.
//!
//! # Chain execution
//!
//! A command may have N >= 1 handlers registered in order. Every handler
//! receives the same [`Context`], and each step races two futures:
//!
//! 1. the handler's own completion (spawned as a task so it can outlive the
//!    step), and
//! 2. the context's continue signal, raised by the handler via
//!    [`Context::next`].
//!
//! Whichever resolves first ends the step. A handler that calls `next()`
//! before finishing lets the rest of the chain begin while it keeps running
//! in the background; a handler failure aborts the remaining chain and is
//! reported back to the user with a best-effort reply. A handler that
//! neither completes nor calls `next()` stalls its chain indefinitely - a
//! documented hazard, no timeout is enforced.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{self, Either};
use parking_lot::RwLock;
use tracing::{debug, error, info, trace, warn};

use crate::foundation::context::Context;
use crate::foundation::directory::ChannelDirectory;
use crate::foundation::error::{HandlerError, HandlerResult};
use crate::foundation::event::{GatewayEvent, MessageEvent};
use crate::framework::registry::{CommandHandler, HandlerRegistry};
use crate::integration::client::BoxedClient;

/// Command-token extraction policy.
///
/// The contract is the same under both policies: the command token is the
/// first whitespace-delimited word of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPolicy {
    /// Scan up to the first space, no length limit. The default.
    #[default]
    Sentinel,
    /// Only look at the first `max + 1` characters before splitting, to
    /// avoid scanning pathologically long single-token messages.
    Bounded(usize),
}

impl TokenPolicy {
    /// Extracts the command token from message content.
    pub fn extract<'a>(&self, content: &'a str) -> &'a str {
        match *self {
            TokenPolicy::Sentinel => content.split(' ').next().unwrap_or(""),
            TokenPolicy::Bounded(max) => {
                let end = content
                    .char_indices()
                    .nth(max + 1)
                    .map(|(i, _)| i)
                    .unwrap_or(content.len());
                content[..end].split(' ').next().unwrap_or("").trim_end()
            }
        }
    }
}

/// The central event router.
///
/// Constructed once per process; owns no ambient state. All registry lookups
/// happen against the immutable [`HandlerRegistry`] built during the load
/// phase, and the only shared-mutable collaborator is the channel directory.
pub struct Dispatcher {
    client: BoxedClient,
    directory: Arc<ChannelDirectory>,
    registry: Arc<HandlerRegistry>,
    policy: TokenPolicy,
    list_command: Option<String>,
    started_at: RwLock<Option<DateTime<Utc>>>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default token policy and no reserved
    /// introspection command.
    pub fn new(
        client: BoxedClient,
        directory: Arc<ChannelDirectory>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            client,
            directory,
            registry,
            policy: TokenPolicy::default(),
            list_command: None,
            started_at: RwLock::new(None),
        }
    }

    /// Sets the token extraction policy.
    pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reserves a token that, when a message consists of exactly that token
    /// and matches no registered command, replies with the sorted list of
    /// registered command names.
    pub fn with_list_command(mut self, token: impl Into<String>) -> Self {
        self.list_command = Some(token.into());
        self
    }

    /// Returns when the transport first reported ready, if it has.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.started_at.read()
    }

    /// Routes one gateway event.
    pub async fn handle(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready => {
                self.refresh_directory().await;
                *self.started_at.write() = Some(Utc::now());
                info!(channels = self.directory.len(), "gateway ready");
            }
            GatewayEvent::Channel(change) => {
                debug!(?change, "channel lifecycle event");
                self.refresh_directory().await;
            }
            GatewayEvent::Message(msg) => self.on_message(msg).await,
        }
    }

    /// Rebuilds the directory from the client's live channel enumeration.
    ///
    /// A failed fetch keeps the previous mapping rather than clearing it.
    async fn refresh_directory(&self) {
        match self.client.list_channels().await {
            Ok(channels) => self.directory.rebuild(&channels),
            Err(e) => warn!(error = %e, "channel fetch failed, keeping stale directory"),
        }
    }

    async fn on_message(&self, msg: MessageEvent) {
        if msg.author.bot {
            trace!(author = %msg.author.id, "skipping bot-authored message");
            return;
        }
        if msg.content.is_empty() {
            return;
        }

        // Lazily cache the source channel.
        self.directory
            .remember_if_absent(&msg.channel_name, &msg.channel_id);

        let token = self.policy.extract(&msg.content).to_string();
        let Some(chain) = self.registry.chain(&token) else {
            if self
                .list_command
                .as_deref()
                .is_some_and(|reserved| msg.content.trim() == reserved)
            {
                self.reply_command_list(&msg).await;
            }
            return;
        };

        let content = msg
            .content
            .strip_prefix(&token)
            .unwrap_or("")
            .trim()
            .to_string();
        let ctx = Arc::new(Context::for_message(
            Arc::clone(&self.client),
            Arc::clone(&self.directory),
            msg.clone(),
            token.clone(),
            content,
        ));

        debug!(command = %token, handlers = chain.len(), "dispatching");
        if let Err(e) = self.run_chain(&ctx, chain).await {
            error!(command = %token, error = %e, "handler chain failed");
            if let Err(reply_err) = self.client.reply(&msg, e.user_message()).await {
                // A reply failure must never crash the router.
                warn!(error = %reply_err, "failed to deliver error reply");
            }
        }
    }

    /// Drives a handler chain to completion under the yield-to-next protocol.
    async fn run_chain(&self, ctx: &Arc<Context>, chain: &[CommandHandler]) -> HandlerResult {
        for (step, h) in chain.iter().enumerate() {
            let task = tokio::spawn(h(Arc::clone(ctx)));
            let advance = ctx.advance();
            tokio::pin!(advance);

            match future::select(advance, task).await {
                Either::Left((_, task)) => {
                    // The handler yielded early; let it finish in the
                    // background and only log its eventual failure.
                    let command = ctx.command().unwrap_or_default().to_string();
                    tokio::spawn(async move {
                        match task.await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                warn!(command = %command, step, error = %e, "handler failed after yielding")
                            }
                            Err(e) => {
                                warn!(command = %command, step, error = %e, "handler panicked after yielding")
                            }
                        }
                    });
                }
                Either::Right((result, _advance)) => match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => return Err(e),
                    Err(e) => return Err(HandlerError::msg(format!("handler panicked: {e}"))),
                },
            }
        }
        Ok(())
    }

    async fn reply_command_list(&self, msg: &MessageEvent) {
        let mut names: Vec<&str> = self.registry.command_names().collect();
        names.sort_unstable();
        let text = if names.is_empty() {
            "No commands registered".to_string()
        } else {
            names.join(", ")
        };
        if let Err(e) = self.client.reply(msg, &text).await {
            warn!(error = %e, "failed to reply with command list");
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .field("commands", &self.registry.command_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::event::{Author, ChannelChange, ChannelInfo};
    use crate::framework::registry::{Definition, handler};
    use crate::integration::client::tests::RecordingClient;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn message(content: &str) -> GatewayEvent {
        GatewayEvent::Message(MessageEvent {
            id: "m1".into(),
            author: Author {
                id: "u1".into(),
                name: "user".into(),
                bot: false,
            },
            content: content.into(),
            channel_id: "c1".into(),
            channel_name: "general".into(),
        })
    }

    fn bot_message(content: &str) -> GatewayEvent {
        GatewayEvent::Message(MessageEvent {
            id: "m2".into(),
            author: Author {
                id: "braze-bot".into(),
                name: "braze".into(),
                bot: true,
            },
            content: content.into(),
            channel_id: "c1".into(),
            channel_name: "general".into(),
        })
    }

    fn dispatcher_with(
        client: Arc<RecordingClient>,
        definitions: Vec<Definition>,
    ) -> (Dispatcher, Arc<ChannelDirectory>) {
        let directory = Arc::new(ChannelDirectory::new());
        let registry = Arc::new(
            HandlerRegistry::load(
                definitions,
                client.clone(),
                Arc::clone(&directory),
                |_| {},
            )
            .unwrap(),
        );
        (
            Dispatcher::new(client, Arc::clone(&directory), registry),
            directory,
        )
    }

    #[test]
    fn sentinel_policy_takes_the_first_word() {
        let policy = TokenPolicy::Sentinel;
        assert_eq!(policy.extract("!ping"), "!ping");
        assert_eq!(policy.extract("!ping rest of line"), "!ping");
        assert_eq!(policy.extract(" leading"), "");
    }

    #[test]
    fn bounded_policy_only_scans_the_window() {
        let policy = TokenPolicy::Bounded(5);
        assert_eq!(policy.extract("!ping rest"), "!ping");
        // Tokens longer than the window are cut short and cannot match.
        assert_eq!(policy.extract("!pinpoint something"), "!pinpo");
    }

    #[tokio::test]
    async fn ping_yields_exactly_one_pong() {
        let client = RecordingClient::arc();
        let (dispatcher, _) = dispatcher_with(
            client.clone(),
            vec![Definition::command(
                "!ping",
                vec![handler(|ctx| async move {
                    ctx.reply("pong").await?;
                    Ok(())
                })],
            )],
        );

        dispatcher.handle(message("!ping")).await;
        assert_eq!(client.replies(), vec!["pong".to_string()]);
    }

    #[tokio::test]
    async fn bot_authored_messages_never_dispatch() {
        let client = RecordingClient::arc();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let (dispatcher, _) = dispatcher_with(
            client.clone(),
            vec![Definition::command(
                "!ping",
                vec![handler(move |_ctx| {
                    let h = Arc::clone(&h);
                    async move {
                        h.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })],
            )],
        );

        dispatcher.handle(bot_message("!ping")).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(client.replies().is_empty());
    }

    #[tokio::test]
    async fn empty_content_is_ignored() {
        let client = RecordingClient::arc();
        let (dispatcher, directory) = dispatcher_with(client, vec![]);
        dispatcher.handle(message("")).await;
        // Not even the lazy channel caching runs.
        assert!(directory.is_empty());
    }

    #[tokio::test]
    async fn message_dispatch_caches_the_source_channel() {
        let client = RecordingClient::arc();
        let (dispatcher, directory) = dispatcher_with(client, vec![]);
        dispatcher.handle(message("hello there")).await;
        assert_eq!(directory.lookup("general").as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn next_lets_downstream_start_before_upstream_finishes() {
        let client = RecordingClient::arc();
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let gate = Arc::new(Notify::new());

        let l1 = Arc::clone(&log);
        let g1 = Arc::clone(&gate);
        let l2 = Arc::clone(&log);
        let g2 = Arc::clone(&gate);

        let (dispatcher, _) = dispatcher_with(
            client,
            vec![Definition::command(
                "!work",
                vec![
                    handler(move |ctx| {
                        let log = Arc::clone(&l1);
                        let gate = Arc::clone(&g1);
                        async move {
                            log.lock().push("h1-start");
                            ctx.next();
                            gate.notified().await;
                            log.lock().push("h1-end");
                            Ok(())
                        }
                    }),
                    handler(move |_ctx| {
                        let log = Arc::clone(&l2);
                        let gate = Arc::clone(&g2);
                        async move {
                            log.lock().push("h2-start");
                            gate.notify_one();
                            Ok(())
                        }
                    }),
                ],
            )],
        );

        dispatcher.handle(message("!work")).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let log = log.lock();
        let pos = |entry| log.iter().position(|e| *e == entry);
        assert!(pos("h2-start").unwrap() < pos("h1-end").unwrap());
    }

    #[tokio::test]
    async fn failure_without_next_aborts_the_chain() {
        let client = RecordingClient::arc();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);

        let (dispatcher, _) = dispatcher_with(
            client.clone(),
            vec![Definition::command(
                "!boom",
                vec![
                    handler(|_ctx| async { Err(HandlerError::msg("h1 exploded")) }),
                    handler(move |_ctx| {
                        let h = Arc::clone(&h);
                        async move {
                            h.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    }),
                ],
            )],
        );

        dispatcher.handle(message("!boom")).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(client.replies(), vec!["h1 exploded".to_string()]);
    }

    #[tokio::test]
    async fn failing_error_reply_is_swallowed() {
        let client = RecordingClient::arc();
        client.fail_reply.store(true, Ordering::SeqCst);
        let (dispatcher, _) = dispatcher_with(
            client.clone(),
            vec![Definition::command(
                "!boom",
                vec![handler(|_ctx| async {
                    Err(HandlerError::msg("h1 exploded"))
                })],
            )],
        );

        // Must not panic or propagate.
        dispatcher.handle(message("!boom")).await;
        assert!(client.replies().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_is_silent() {
        let client = RecordingClient::arc();
        let (dispatcher, _) = dispatcher_with(client.clone(), vec![]);
        dispatcher.handle(message("!missing")).await;
        assert!(client.replies().is_empty());
    }

    #[tokio::test]
    async fn reserved_token_lists_registered_commands() {
        let client = RecordingClient::arc();
        let (dispatcher, _) = dispatcher_with(
            client.clone(),
            vec![
                Definition::command("!b", vec![handler(|_ctx| async { Ok(()) })]),
                Definition::command("!a", vec![handler(|_ctx| async { Ok(()) })]),
            ],
        );
        let dispatcher = dispatcher.with_list_command("!commands");

        dispatcher.handle(message("!commands")).await;
        assert_eq!(client.replies(), vec!["!a, !b".to_string()]);
    }

    #[tokio::test]
    async fn ready_rebuilds_directory_and_records_start() {
        let client = RecordingClient::with_channels(vec![ChannelInfo::text("123", "general")]);
        let (dispatcher, directory) = dispatcher_with(client, vec![]);

        assert_eq!(directory.lookup("general"), None);
        assert!(dispatcher.started_at().is_none());

        dispatcher.handle(GatewayEvent::Ready).await;
        assert_eq!(directory.lookup("general").as_deref(), Some("123"));
        assert!(dispatcher.started_at().is_some());
    }

    #[tokio::test]
    async fn channel_events_rebuild_the_directory() {
        let client = RecordingClient::with_channels(vec![ChannelInfo::text("123", "general")]);
        let (dispatcher, directory) = dispatcher_with(client.clone(), vec![]);

        dispatcher
            .handle(GatewayEvent::Channel(ChannelChange::Created))
            .await;
        assert_eq!(directory.lookup("general").as_deref(), Some("123"));

        // A rename: the old entry must not linger.
        *client.channels.lock() = vec![ChannelInfo::text("123", "lounge")];
        dispatcher
            .handle(GatewayEvent::Channel(ChannelChange::Updated))
            .await;
        assert_eq!(directory.lookup("general"), None);
        assert_eq!(directory.lookup("lounge").as_deref(), Some("123"));
    }

    #[tokio::test]
    async fn failed_channel_fetch_keeps_previous_mapping() {
        let client = RecordingClient::with_channels(vec![ChannelInfo::text("123", "general")]);
        let (dispatcher, directory) = dispatcher_with(client.clone(), vec![]);

        dispatcher.handle(GatewayEvent::Ready).await;
        client.fail_fetch.store(true, Ordering::SeqCst);
        dispatcher
            .handle(GatewayEvent::Channel(ChannelChange::Deleted))
            .await;
        assert_eq!(directory.lookup("general").as_deref(), Some("123"));
    }

    #[tokio::test]
    async fn handler_sees_command_and_trimmed_content() {
        let client = RecordingClient::arc();
        let (dispatcher, _) = dispatcher_with(
            client.clone(),
            vec![Definition::command(
                "!echo",
                vec![handler(|ctx| async move {
                    let text = ctx.content().unwrap_or("").to_string();
                    ctx.reply(&text).await?;
                    Ok(())
                })],
            )],
        );

        dispatcher.handle(message("!echo   hello world  ")).await;
        assert_eq!(client.replies(), vec!["hello world".to_string()]);
    }
}
