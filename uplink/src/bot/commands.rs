//! Slash command set and per-command handlers.
//!
//! Every command is guild-scoped. Configuration commands gate on Manage
//! Server through their registered default permissions; handlers validate
//! operator input and answer with ephemeral replies.

use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
};
use serenity::client::Context;
use serenity::model::application::{CommandInteraction, CommandOptionType};
use serenity::model::channel::ChannelType;
use serenity::model::colour::Colour;
use serenity::model::id::{ChannelId, GuildId};
use serenity::model::permissions::Permissions;
use tokio::sync::Notify;
use tracing::info;
use uplink_platforms::{Platform, Prober};

use crate::database::models::TrackedStream;
use crate::database::repositories::StreamRepository;
use crate::database::time::ms_to_datetime;
use crate::{Error, Result};

/// Discord caps an embed at 25 fields.
const MAX_EMBED_FIELDS: usize = 25;

/// The command set registered for every guild.
pub fn create_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("setup-stream")
            .description("Track a stream and set where its announcements go")
            .default_member_permissions(Permissions::MANAGE_GUILD)
            .add_option(platform_option())
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "channel",
                    "Channel name, handle, or URL on the platform",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "announcement_channel",
                    "Text channel that receives live announcements",
                )
                .channel_types(vec![ChannelType::Text])
                .required(true),
            ),
        CreateCommand::new("setup-stream-message")
            .description("Track a stream with a custom announcement message")
            .default_member_permissions(Permissions::MANAGE_GUILD)
            .add_option(platform_option())
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "channel",
                    "Channel name, handle, or URL on the platform",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "message",
                    "Message posted above the announcement embed",
                )
                .required(true),
            ),
        CreateCommand::new("update-stream")
            .description("Change a tracked stream's announcement channel or message")
            .default_member_permissions(Permissions::MANAGE_GUILD)
            .add_option(platform_option())
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "channel_name",
                    "Tracked channel to update",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "announcement_channel",
                    "New destination for announcements",
                )
                .channel_types(vec![ChannelType::Text])
                .required(false),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "message",
                    "New message posted above the announcement embed",
                )
                .required(false),
            ),
        CreateCommand::new("remove-stream")
            .description("Stop tracking a stream")
            .default_member_permissions(Permissions::MANAGE_GUILD)
            .add_option(platform_option())
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "channel_name",
                    "Tracked channel to remove",
                )
                .required(true),
            ),
        CreateCommand::new("view-streams")
            .description("List the streams tracked in this server"),
        CreateCommand::new("check-streams")
            .description("Check all tracked streams for live announcements now"),
    ]
}

fn platform_option() -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "platform", "Streaming platform")
        .required(true)
        .add_string_choice("Twitch", "twitch")
        .add_string_choice("YouTube", "youtube")
}

pub async fn handle_setup_stream<R: StreamRepository>(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    repository: &R,
) -> Result<()> {
    let platform = require_platform(command)?;
    let channel_input = require_str(command, "channel")?;
    let destination = require_channel(command, "announcement_channel")?;

    let channel_name = match Prober::normalize_channel(platform, channel_input) {
        Ok(name) => name,
        Err(e) => return respond_ephemeral(ctx, command, e.to_string()).await,
    };

    let stream = TrackedStream::new(guild_id.to_string(), platform, &channel_name)
        .with_announce_channel(destination.to_string());
    repository.upsert_stream(&stream).await?;

    info!(
        "Guild {} now tracks {} on {}, announcing to channel {}",
        guild_id, channel_name, platform, destination
    );
    respond_ephemeral(
        ctx,
        command,
        format!(
            "Tracking **{}** on {}. Announcements go to <#{}>.",
            channel_name,
            platform.display_name(),
            destination
        ),
    )
    .await
}

pub async fn handle_setup_stream_message<R: StreamRepository>(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    repository: &R,
) -> Result<()> {
    let platform = require_platform(command)?;
    let channel_input = require_str(command, "channel")?;
    let message = require_str(command, "message")?;

    let channel_name = match Prober::normalize_channel(platform, channel_input) {
        Ok(name) => name,
        Err(e) => return respond_ephemeral(ctx, command, e.to_string()).await,
    };

    let guild = guild_id.to_string();
    let existing = repository.get_stream(&guild, platform, &channel_name).await?;
    let stream = TrackedStream::new(guild, platform, &channel_name).with_custom_message(message);
    repository.upsert_stream(&stream).await?;

    info!(
        "Guild {} set a custom message for {} on {}",
        guild_id, channel_name, platform
    );
    let reply = match existing.and_then(|s| s.announce_channel_id) {
        Some(destination) => format!(
            "Updated the message for **{}** on {}. Announcements keep going to <#{}>.",
            channel_name,
            platform.display_name(),
            destination
        ),
        None => format!(
            "Tracking **{}** on {} with a custom message. \
             Set an announcement channel with /update-stream to start announcing.",
            channel_name,
            platform.display_name()
        ),
    };
    respond_ephemeral(ctx, command, reply).await
}

pub async fn handle_update_stream<R: StreamRepository>(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    repository: &R,
) -> Result<()> {
    let platform = require_platform(command)?;
    let channel_input = require_str(command, "channel_name")?;
    let destination = option_channel(command, "announcement_channel");
    let message = option_str(command, "message");

    if destination.is_none() && message.is_none() {
        return respond_ephemeral(
            ctx,
            command,
            "Nothing to update. Provide an announcement channel, a message, or both.",
        )
        .await;
    }

    let channel_name = match Prober::normalize_channel(platform, channel_input) {
        Ok(name) => name,
        Err(e) => return respond_ephemeral(ctx, command, e.to_string()).await,
    };

    let destination_id = destination.map(|id| id.to_string());
    let updated = repository
        .update_stream_details(
            &guild_id.to_string(),
            platform,
            &channel_name,
            destination_id.as_deref(),
            message,
        )
        .await?;

    if !updated {
        return respond_ephemeral(
            ctx,
            command,
            format!(
                "**{}** on {} is not tracked here. Use /setup-stream first.",
                channel_name,
                platform.display_name()
            ),
        )
        .await;
    }

    info!(
        "Guild {} updated {} on {}",
        guild_id, channel_name, platform
    );
    respond_ephemeral(
        ctx,
        command,
        format!(
            "Updated **{}** on {}.",
            channel_name,
            platform.display_name()
        ),
    )
    .await
}

pub async fn handle_remove_stream<R: StreamRepository>(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    repository: &R,
) -> Result<()> {
    let platform = require_platform(command)?;
    let channel_input = require_str(command, "channel_name")?;

    let channel_name = match Prober::normalize_channel(platform, channel_input) {
        Ok(name) => name,
        Err(e) => return respond_ephemeral(ctx, command, e.to_string()).await,
    };

    let removed = repository
        .delete_stream(&guild_id.to_string(), platform, &channel_name)
        .await?;

    let reply = if removed {
        info!(
            "Guild {} stopped tracking {} on {}",
            guild_id, channel_name, platform
        );
        format!(
            "No longer tracking **{}** on {}.",
            channel_name,
            platform.display_name()
        )
    } else {
        format!(
            "**{}** on {} was not tracked here.",
            channel_name,
            platform.display_name()
        )
    };
    respond_ephemeral(ctx, command, reply).await
}

pub async fn handle_view_streams<R: StreamRepository>(
    ctx: &Context,
    command: &CommandInteraction,
    guild_id: GuildId,
    repository: &R,
) -> Result<()> {
    let streams = repository.list_guild_streams(&guild_id.to_string()).await?;

    let mut embed = CreateEmbed::new()
        .title("Tracked streams")
        .colour(Colour::from_rgb(88, 101, 242));

    if streams.is_empty() {
        embed = embed.description("No tracked streams yet. Use /setup-stream to add one.");
    } else {
        for stream in streams.iter().take(MAX_EMBED_FIELDS) {
            let (name, value) = stream_field(stream);
            embed = embed.field(name, value, false);
        }
        if streams.len() > MAX_EMBED_FIELDS {
            embed = embed.footer(CreateEmbedFooter::new(format!(
                "and {} more",
                streams.len() - MAX_EMBED_FIELDS
            )));
        }
    }

    respond_embed(ctx, command, embed).await
}

pub async fn handle_check_streams(
    ctx: &Context,
    command: &CommandInteraction,
    refresh: &Notify,
) -> Result<()> {
    refresh.notify_one();
    info!("Manual stream check requested via /check-streams");
    respond_ephemeral(
        ctx,
        command,
        "Checking all tracked streams now. Any announcements will follow shortly.",
    )
    .await
}

/// One embed field describing a tracked stream.
fn stream_field(stream: &TrackedStream) -> (String, String) {
    let platform_label = Platform::parse(&stream.platform)
        .map(|platform| platform.display_name().to_string())
        .unwrap_or_else(|_| stream.platform.clone());

    let destination = stream
        .announce_channel_id
        .as_deref()
        .map(|id| format!("<#{id}>"))
        .unwrap_or_else(|| "not configured".to_string());

    let mut lines = vec![format!("Announcements: {destination}")];
    if let Some(message) = &stream.custom_message {
        lines.push(format!("Message: {message}"));
    }
    match stream.last_announced_at {
        Some(ms) => lines.push(format!(
            "Live, announced <t:{}:R>",
            ms_to_datetime(ms).timestamp()
        )),
        None => lines.push("Offline".to_string()),
    }

    (
        format!("{platform_label}: {}", stream.channel_name),
        lines.join("\n"),
    )
}

fn option_str<'a>(command: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_str())
}

fn option_channel(command: &CommandInteraction, name: &str) -> Option<ChannelId> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_channel_id())
}

// Discord enforces required options, so a miss here is a registration bug,
// not operator error.
fn require_str<'a>(command: &'a CommandInteraction, name: &str) -> Result<&'a str> {
    option_str(command, name)
        .ok_or_else(|| Error::validation(format!("Missing required option {name}")))
}

fn require_channel(command: &CommandInteraction, name: &str) -> Result<ChannelId> {
    option_channel(command, name)
        .ok_or_else(|| Error::validation(format!("Missing required option {name}")))
}

fn require_platform(command: &CommandInteraction) -> Result<Platform> {
    Ok(Platform::parse(require_str(command, "platform")?)?)
}

pub async fn respond_ephemeral(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    let message = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(true);
    command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await?;
    Ok(())
}

async fn respond_embed(ctx: &Context, command: &CommandInteraction, embed: CreateEmbed) -> Result<()> {
    let message = CreateInteractionResponseMessage::new()
        .embed(embed)
        .ephemeral(true);
    command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await?;
    Ok(())
}

/// Best-effort failure reply; falls back to a follow-up when the
/// interaction was already acknowledged.
pub async fn respond_failure(ctx: &Context, command: &CommandInteraction) {
    const MESSAGE: &str = "Something went wrong handling that command.";
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(MESSAGE)
            .ephemeral(true),
    );
    if command.create_response(&ctx.http, response).await.is_err() {
        let followup = CreateInteractionResponseFollowup::new()
            .content(MESSAGE)
            .ephemeral(true);
        command.create_followup(&ctx.http, followup).await.ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_set_names() {
        let commands = create_commands();
        let names: Vec<String> = commands
            .iter()
            .map(|command| {
                serde_json::to_value(command).unwrap()["name"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();

        assert_eq!(
            names,
            vec![
                "setup-stream",
                "setup-stream-message",
                "update-stream",
                "remove-stream",
                "view-streams",
                "check-streams",
            ]
        );
    }

    #[test]
    fn test_setup_stream_options() {
        let payload = serde_json::to_value(&create_commands()[0]).unwrap();
        let options = payload["options"].as_array().unwrap();

        assert_eq!(options.len(), 3);
        assert_eq!(options[0]["name"], "platform");
        assert_eq!(options[1]["name"], "channel");
        assert_eq!(options[2]["name"], "announcement_channel");
        assert!(options.iter().all(|option| option["required"] == true));

        // Locked to Manage Server members by default.
        assert!(payload.get("default_member_permissions").is_some());
    }

    #[test]
    fn test_platform_option_offers_both_platforms() {
        let payload = serde_json::to_value(platform_option()).unwrap();
        let choices = payload["choices"].as_array().unwrap();

        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0]["value"], "twitch");
        assert_eq!(choices[1]["value"], "youtube");
    }

    #[test]
    fn test_update_stream_optional_options() {
        let payload = serde_json::to_value(&create_commands()[2]).unwrap();
        let options = payload["options"].as_array().unwrap();

        assert_eq!(options[0]["name"], "platform");
        assert_eq!(options[1]["name"], "channel_name");
        assert_eq!(options[2]["name"], "announcement_channel");
        assert_eq!(options[3]["name"], "message");
        assert_eq!(options[2]["required"], false);
        assert_eq!(options[3]["required"], false);
    }

    #[test]
    fn test_stream_field_with_full_configuration() {
        let mut stream = TrackedStream::new("guild-1", Platform::Twitch, "grimm")
            .with_announce_channel("123")
            .with_custom_message("go watch");
        stream.last_announced_at = Some(1_700_000_000_747);

        let (name, value) = stream_field(&stream);
        assert_eq!(name, "Twitch: grimm");
        assert!(value.contains("<#123>"));
        assert!(value.contains("Message: go watch"));
        // Stored milliseconds render as whole epoch seconds.
        assert!(value.contains("<t:1700000000:R>"));
    }

    #[test]
    fn test_stream_field_without_destination() {
        let stream = TrackedStream::new("guild-1", Platform::Youtube, "UCabc");

        let (name, value) = stream_field(&stream);
        assert_eq!(name, "YouTube: UCabc");
        assert!(value.contains("not configured"));
        assert!(value.contains("Offline"));
    }
}
