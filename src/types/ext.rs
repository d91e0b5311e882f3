//! Extension traits on interaction and option types.
//!
//! Small conveniences handlers reach for repeatedly: who invoked the
//! interaction, how to mention them, which option is being autocompleted.

use crate::types::{CommandOption, Interaction};

/// `<@id>` mention markup for a user id.
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Convenience methods on [`Interaction`].
pub trait InteractionExt {
    /// Id of the member who triggered the interaction, if there is one.
    fn author_id(&self) -> Option<&str>;

    /// Mention markup for the invoking member.
    fn author_mention(&self) -> Option<String> {
        self.author_id().map(mention)
    }
}

impl InteractionExt for Interaction {
    fn author_id(&self) -> Option<&str> {
        self.member().map(|m| m.user.id.as_str())
    }
}

/// Convenience methods on option lists.
pub trait OptionsExt {
    /// First option with the given name.
    fn find(&self, name: &str) -> Option<&CommandOption>;

    /// The option the user is currently typing into, searching containers.
    fn focused(&self) -> Option<&CommandOption>;
}

impl OptionsExt for [CommandOption] {
    fn find(&self, name: &str) -> Option<&CommandOption> {
        self.iter().find(|o| o.name() == name)
    }

    fn focused(&self) -> Option<&CommandOption> {
        self.iter().find_map(|o| {
            if o.is_container() {
                o.children().focused()
            } else if o.is_focused() {
                Some(o)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommandData, CommandInteraction, Member, MemberUser};

    fn command() -> Interaction {
        Interaction::ApplicationCommand(CommandInteraction {
            member: Member {
                user: MemberUser {
                    id: "42".to_string(),
                    username: "gm".to_string(),
                },
            },
            guild_id: "7".to_string(),
            data: CommandData::new("tokens"),
        })
    }

    #[test]
    fn author_of_command_is_member() {
        let interaction = command();
        assert_eq!(interaction.author_id(), Some("42"));
        assert_eq!(interaction.author_mention().as_deref(), Some("<@42>"));
    }

    #[test]
    fn ping_has_no_author() {
        assert!(Interaction::Ping.author_id().is_none());
    }

    #[test]
    fn focused_searches_nested_containers() {
        let options = vec![CommandOption::group(
            "assign",
            vec![CommandOption::subcommand(
                "tokens",
                vec![
                    CommandOption::string("character", "as").with_focus(),
                    CommandOption::integer("tokens", 2),
                ],
            )],
        )];
        assert_eq!(options.focused().map(|o| o.name()), Some("character"));
    }

    #[test]
    fn find_by_name() {
        let options = vec![CommandOption::user("user", "1"), CommandOption::boolean("b", true)];
        assert_eq!(options.find("b").and_then(CommandOption::as_bool), Some(true));
        assert!(options.find("missing").is_none());
    }
}
