//! Discord gateway surface.
//!
//! The handler registers the slash command set per guild, dispatches
//! incoming interactions to the command handlers, and drops a guild's
//! tracked streams when the bot is removed from it.

pub mod commands;

use std::sync::Arc;

use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::application::{CommandInteraction, Interaction};
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, UnavailableGuild};
use serenity::model::id::GuildId;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::database::repositories::StreamRepository;

/// Gateway event handler.
pub struct Handler<R> {
    repository: Arc<R>,
    /// Wakes the watcher for an immediate reconcile pass.
    refresh: Arc<Notify>,
}

impl<R> Handler<R>
where
    R: StreamRepository + 'static,
{
    pub fn new(repository: Arc<R>, refresh: Arc<Notify>) -> Self {
        Self {
            repository,
            refresh,
        }
    }

    async fn dispatch(&self, ctx: &Context, command: &CommandInteraction) -> Result<()> {
        let Some(guild_id) = command.guild_id else {
            return commands::respond_ephemeral(
                ctx,
                command,
                "This command only works inside a server.",
            )
            .await;
        };

        match command.data.name.as_str() {
            "setup-stream" => {
                commands::handle_setup_stream(ctx, command, guild_id, self.repository.as_ref())
                    .await
            }
            "setup-stream-message" => {
                commands::handle_setup_stream_message(
                    ctx,
                    command,
                    guild_id,
                    self.repository.as_ref(),
                )
                .await
            }
            "update-stream" => {
                commands::handle_update_stream(ctx, command, guild_id, self.repository.as_ref())
                    .await
            }
            "remove-stream" => {
                commands::handle_remove_stream(ctx, command, guild_id, self.repository.as_ref())
                    .await
            }
            "view-streams" => {
                commands::handle_view_streams(ctx, command, guild_id, self.repository.as_ref())
                    .await
            }
            "check-streams" => commands::handle_check_streams(ctx, command, &self.refresh).await,
            other => {
                warn!("Unknown command /{} from guild {}", other, guild_id);
                commands::respond_ephemeral(ctx, command, "Unknown command.").await
            }
        }
    }
}

#[async_trait]
impl<R> EventHandler for Handler<R>
where
    R: StreamRepository + 'static,
{
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Connected to Discord as {}", ready.user.name);
        for guild in &ready.guilds {
            register_guild_commands(&ctx, guild.id).await;
        }
        info!("Command registration done for {} guilds", ready.guilds.len());
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        // Fires for every known guild after ready; only newly joined guilds
        // need registration here.
        if is_new == Some(true) {
            info!("Joined guild {} ({})", guild.name, guild.id);
            register_guild_commands(&ctx, guild.id).await;
        }
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        // An unavailable guild is a Discord outage, not a removal.
        if incomplete.unavailable {
            return;
        }

        match self.repository.delete_guild_streams(&incomplete.id.to_string()).await {
            Ok(removed) => info!(
                "Removed from guild {}, dropped {} tracked streams",
                incomplete.id, removed
            ),
            Err(e) => error!(
                "Failed to drop tracked streams for guild {}: {}",
                incomplete.id, e
            ),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        debug!(
            "Command /{} from guild {:?}",
            command.data.name, command.guild_id
        );
        if let Err(e) = self.dispatch(&ctx, &command).await {
            error!("Command /{} failed: {}", command.data.name, e);
            commands::respond_failure(&ctx, &command).await;
        }
    }
}

async fn register_guild_commands(ctx: &Context, guild_id: GuildId) {
    match guild_id
        .set_commands(&ctx.http, commands::create_commands())
        .await
    {
        Ok(registered) => debug!(
            "Registered {} commands for guild {}",
            registered.len(),
            guild_id
        ),
        Err(e) => error!("Failed to register commands for guild {}: {}", guild_id, e),
    }
}
