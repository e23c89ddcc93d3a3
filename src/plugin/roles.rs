//! Role management commands, single member and guild-wide.
//!
//! The guild-wide variants iterate a freshly fetched member list rather
//! than the cache, which may be incomplete for large guilds, and report a
//! changed/skipped/failed tally when done.

use crate::roles::{
    run_batch, MemberView, MutateError, Pacer, RoleAction, RoleMutator, MUTATION_PAUSE,
    TRANSIENT_BACKOFF,
};
use crate::{event::*, plugin::*};
use anyhow::{anyhow, Result};
use serenity::all::{EditMessage, GuildId, Http, Member, Message, PartialGuild, Role, RoleId, UserId};

pub struct Roles;

#[serenity::async_trait]
impl Plugin for Roles {
    fn name(&self) -> &'static str {
        "role"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}role add <@user> <role> - give a member a role\n\
             {}role remove <@user> <role> - take a role from a member\n\
             {}role add-all <role> - give every member a role\n\
             {}role remove-all <role> - take a role from every member",
            prefix, prefix, prefix, prefix
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let Some(guild_id) = msg.guild_id else {
            msg.reply(ctx.cache_http, "This command only works in a server.")
                .await?;
            return Ok(EventHandled::Yes);
        };

        let guild = guild_id.to_partial_guild(ctx.http).await?;

        // The invoker needs role-management rights themselves.
        let invoker = guild_id.member(ctx.cache_http, msg.author.id).await?;
        if !has_manage_roles(&guild, &invoker) {
            msg.reply(ctx.cache_http, "You need the Manage Roles permission for that.")
                .await?;
            return Ok(EventHandled::Yes);
        }

        match args.split_first() {
            Some((&"add", rest)) => {
                single(ctx, msg, &guild, RoleAction::Grant, rest).await?;
            }
            Some((&"remove", rest)) => {
                single(ctx, msg, &guild, RoleAction::Revoke, rest).await?;
            }
            Some((&"add-all", rest)) => {
                bulk(ctx, msg, &guild, RoleAction::Grant, rest).await?;
            }
            Some((&"remove-all", rest)) => {
                bulk(ctx, msg, &guild, RoleAction::Revoke, rest).await?;
            }
            _ => {
                msg.reply(ctx.cache_http, "Unknown subcommand, see `;help`.")
                    .await?;
            }
        }

        Ok(EventHandled::Yes)
    }
}

async fn single(
    ctx: &Context<'_>,
    msg: &Message,
    guild: &PartialGuild,
    action: RoleAction,
    args: &[&str],
) -> Result<()> {
    let Some((user_arg, role_args)) = args.split_first() else {
        msg.reply(ctx.cache_http, "Usage: `;role <add/remove> <@user> <role>`")
            .await?;
        return Ok(());
    };

    let Some(user_id) = parse_user_mention(user_arg) else {
        msg.reply(ctx.cache_http, "Could not read that user mention.")
            .await?;
        return Ok(());
    };

    let Some(role) = find_role(guild, &role_args.join(" ")) else {
        msg.reply(ctx.cache_http, "I don't know that role.").await?;
        return Ok(());
    };

    if action == RoleAction::Grant && !agent_can_manage(ctx, guild, role).await? {
        msg.reply(ctx.cache_http, "I can't assign that role.").await?;
        return Ok(());
    }

    let member = guild.id.member(ctx.cache_http, user_id).await?;
    let has_role = member.roles.contains(&role.id);

    let reply = match action {
        RoleAction::Grant if has_role => {
            format!("<@{}> already has **{}**.", user_id, role.name)
        }
        RoleAction::Revoke if !has_role => {
            format!("<@{}> does not have **{}**.", user_id, role.name)
        }
        _ => {
            let reason = format!("role command by {}", msg.author.name);
            let result = match action {
                RoleAction::Grant => {
                    ctx.http
                        .add_member_role(guild.id, user_id, role.id, Some(&reason))
                        .await
                }
                RoleAction::Revoke => {
                    ctx.http
                        .remove_member_role(guild.id, user_id, role.id, Some(&reason))
                        .await
                }
            };

            match result {
                Ok(()) => format!("Role **{}** {} for <@{}>.", role.name, action.verb(), user_id),
                Err(_) => format!("Failed to change **{}** for <@{}>.", role.name, user_id),
            }
        }
    };

    msg.reply(ctx.cache_http, reply).await?;
    Ok(())
}

async fn bulk(
    ctx: &Context<'_>,
    msg: &Message,
    guild: &PartialGuild,
    action: RoleAction,
    args: &[&str],
) -> Result<()> {
    let Some(role) = find_role(guild, &args.join(" ")) else {
        msg.reply(ctx.cache_http, "I don't know that role.").await?;
        return Ok(());
    };

    // Hierarchy precondition, checked once before anyone is touched.
    if action == RoleAction::Grant && !agent_can_manage(ctx, guild, role).await? {
        msg.reply(ctx.cache_http, "I can't assign that role.").await?;
        return Ok(());
    }

    let mut status = msg
        .channel_id
        .say(
            ctx.cache_http,
            format!("Applying **{}** to everyone...", role.name),
        )
        .await?;

    let bot_id = ctx.cache.current_user().id;
    let bot_member = guild.id.member(ctx.cache_http, bot_id).await?;
    let agent_top = top_role_position(guild, &bot_member.roles);

    let members = fetch_all_members(ctx, guild.id).await?;
    let views: Vec<MemberView> = members
        .iter()
        .map(|m| MemberView {
            user_id: m.user.id,
            is_bot: m.user.bot,
            has_role: m.roles.contains(&role.id),
            top_role_position: top_role_position(guild, &m.roles),
        })
        .collect();

    let reason = format!("bulk role command by {}", msg.author.name);
    let mutator = DiscordRoleMutator {
        http: ctx.http.as_ref(),
        guild_id: guild.id,
        role_id: role.id,
        action,
        reason,
    };

    let pacer = Pacer::new(MUTATION_PAUSE, TRANSIENT_BACKOFF);
    let tally = run_batch(&views, action, agent_top, &pacer, &mutator).await;

    status
        .edit(
            ctx.cache_http,
            EditMessage::new().content(format!(
                "Role **{}** {} for {} member(s) ({} skipped, {} failed).",
                role.name,
                action.verb(),
                tally.changed,
                tally.skipped,
                tally.failed
            )),
        )
        .await?;

    Ok(())
}

/// The batch driver needs the full membership, not the cache, which is only
/// eventually complete for large guilds.
async fn fetch_all_members(ctx: &Context<'_>, guild_id: GuildId) -> Result<Vec<Member>> {
    const PAGE_SIZE: u64 = 1000;

    let mut members = Vec::new();
    let mut after: Option<UserId> = None;

    loop {
        let page = guild_id.members(ctx.http, Some(PAGE_SIZE), after).await?;
        let page_len = page.len();
        after = page.last().map(|m| m.user.id);
        members.extend(page);

        if (page_len as u64) < PAGE_SIZE {
            break;
        }
    }

    Ok(members)
}

struct DiscordRoleMutator<'a> {
    http: &'a Http,
    guild_id: GuildId,
    role_id: RoleId,
    action: RoleAction,
    reason: String,
}

#[serenity::async_trait]
impl RoleMutator for DiscordRoleMutator<'_> {
    async fn apply(&self, user_id: UserId) -> Result<(), MutateError> {
        let result = match self.action {
            RoleAction::Grant => {
                self.http
                    .add_member_role(self.guild_id, user_id, self.role_id, Some(&self.reason))
                    .await
            }
            RoleAction::Revoke => {
                self.http
                    .remove_member_role(self.guild_id, user_id, self.role_id, Some(&self.reason))
                    .await
            }
        };

        result.map_err(classify)
    }
}

fn classify(e: serenity::Error) -> MutateError {
    if let serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(response)) = &e {
        if response.status_code.as_u16() == 403 {
            return MutateError::PermissionDenied;
        }
    }
    MutateError::Transient
}

/// Can the bot itself manage `role`: it must hold Manage Roles and the role
/// must sit below the bot's own top role.
async fn agent_can_manage(ctx: &Context<'_>, guild: &PartialGuild, role: &Role) -> Result<bool> {
    let bot_id = ctx.cache.current_user().id;
    let bot_member = guild
        .id
        .member(ctx.cache_http, bot_id)
        .await
        .map_err(|e| anyhow!("Could not fetch my own membership: {}", e))?;

    Ok(has_manage_roles(guild, &bot_member)
        && role.position < top_role_position(guild, &bot_member.roles))
}

fn has_manage_roles(guild: &PartialGuild, member: &Member) -> bool {
    if guild.owner_id == member.user.id {
        return true;
    }

    member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .any(|role| role.permissions.manage_roles() || role.permissions.administrator())
}

fn top_role_position(guild: &PartialGuild, roles: &[RoleId]) -> u16 {
    roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .map(|role| role.position)
        .max()
        .unwrap_or(0)
}

fn find_role<'g>(guild: &'g PartialGuild, arg: &str) -> Option<&'g Role> {
    let arg = arg.trim();
    if arg.is_empty() {
        return None;
    }

    // Role mention, e.g. `<@&1234>`
    if let Some(id) = arg
        .strip_prefix("<@&")
        .and_then(|s| s.strip_suffix('>'))
        .and_then(|s| s.parse::<u64>().ok())
    {
        return guild.roles.get(&RoleId::new(id));
    }

    guild
        .roles
        .values()
        .find(|role| role.name.eq_ignore_ascii_case(arg))
}

fn parse_user_mention(arg: &str) -> Option<UserId> {
    let id = arg
        .strip_prefix("<@")?
        .strip_suffix('>')?
        .trim_start_matches('!');

    id.parse::<u64>().ok().map(UserId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_mentions_with_and_without_nickname_marker() {
        assert_eq!(parse_user_mention("<@123>"), Some(UserId::new(123)));
        assert_eq!(parse_user_mention("<@!123>"), Some(UserId::new(123)));
        assert_eq!(parse_user_mention("123"), None);
        assert_eq!(parse_user_mention("<@abc>"), None);
    }
}
