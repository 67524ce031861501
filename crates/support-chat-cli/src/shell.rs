//! Line commands and event rendering for the terminal shell

use support_chat::types::{
    BroadcastTarget, RenderedView, StatusKind, TicketStatus, ToggleControl,
};
use support_chat::{MessageId, TicketId, WidgetEvent};

/// One line of input in widget mode
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    Open,
    Close,
    Translate(MessageId),
    Show,
    Help,
    Quit,
    Send(String),
}

/// One line of input in admin mode
#[derive(Debug, Clone, PartialEq)]
pub enum AdminCommand {
    Ticket(TicketId),
    Reload,
    Reply(String),
    Close,
    Delete,
    Status(TicketStatus),
    Broadcast(BroadcastTarget, String),
    Translate(MessageId),
    Show,
    Help,
    Quit,
}

pub const WIDGET_HELP: &str = "\
/open              open the support panel
/close             close the support panel
/translate <id>    toggle translation of a message
/show              print the current message list
/quit              leave
<text>             send a message";

pub const ADMIN_HELP: &str = "\
/ticket <id>                     open a ticket
/reload                          reload the open ticket
/close                           close the open ticket
/delete                          delete the open ticket
/status <open|pending|closed>    change the ticket status
/broadcast <all|open|team:<id>> <message>
/translate <id>                  toggle translation of a message
/show                            print the current message list
/quit                            leave
<text>                           reply to the open ticket";

fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    }
}

fn parse_message_id(arg: &str) -> Result<MessageId, String> {
    arg.parse::<i64>()
        .map(MessageId)
        .map_err(|_| format!("not a message id: {:?}", arg))
}

/// Parse a widget-mode line, `Ok(None)` for blank input
pub fn parse_widget(line: &str) -> Result<Option<WidgetCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(WidgetCommand::Send(line.to_string())));
    }

    let (command, arg) = split_command(line);
    let parsed = match command {
        "/open" => WidgetCommand::Open,
        "/close" => WidgetCommand::Close,
        "/translate" => WidgetCommand::Translate(parse_message_id(arg)?),
        "/show" => WidgetCommand::Show,
        "/help" => WidgetCommand::Help,
        "/quit" | "/exit" => WidgetCommand::Quit,
        other => return Err(format!("unknown command {}", other)),
    };
    Ok(Some(parsed))
}

fn parse_target(arg: &str) -> Result<BroadcastTarget, String> {
    match arg {
        "all" => Ok(BroadcastTarget::AllUsers),
        "open" => Ok(BroadcastTarget::OpenTickets),
        other => other
            .strip_prefix("team:")
            .and_then(|id| id.parse::<i64>().ok())
            .map(BroadcastTarget::Team)
            .ok_or_else(|| format!("unknown broadcast target {:?}", other)),
    }
}

/// Parse an admin-mode line, `Ok(None)` for blank input
pub fn parse_admin(line: &str) -> Result<Option<AdminCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(AdminCommand::Reply(line.to_string())));
    }

    let (command, arg) = split_command(line);
    let parsed = match command {
        "/ticket" => {
            let id = arg
                .trim_start_matches('#')
                .parse::<i64>()
                .map_err(|_| format!("not a ticket id: {:?}", arg))?;
            AdminCommand::Ticket(TicketId(id))
        }
        "/reload" => AdminCommand::Reload,
        "/reply" => AdminCommand::Reply(arg.to_string()),
        "/close" => AdminCommand::Close,
        "/delete" => AdminCommand::Delete,
        "/status" => AdminCommand::Status(arg.parse()?),
        "/broadcast" => {
            let (target, message) = split_command(arg);
            AdminCommand::Broadcast(parse_target(target)?, message.to_string())
        }
        "/translate" => AdminCommand::Translate(parse_message_id(arg)?),
        "/show" => AdminCommand::Show,
        "/help" => AdminCommand::Help,
        "/quit" | "/exit" => AdminCommand::Quit,
        other => return Err(format!("unknown command {}", other)),
    };
    Ok(Some(parsed))
}

/// Print-ready lines of a rendered message list
pub fn format_view(view: &RenderedView) -> Vec<String> {
    view.messages
        .iter()
        .map(|message| {
            let mut line = format!("[{}] {}", message.id, message.author);
            if !message.timestamp.is_empty() {
                line.push_str(&format!(" {}", message.timestamp));
            }
            line.push_str(&format!(": {}", message.text));
            if message.is_new {
                line.push_str("  (new)");
            }
            if let Some(control) = message.translate.filter(|c| *c != ToggleControl::Hidden) {
                line.push_str(&format!("  <{}>", control.label()));
            }
            line
        })
        .collect()
}

/// Print-ready lines for one event
pub fn format_event(event: &WidgetEvent) -> Vec<String> {
    match event {
        WidgetEvent::PanelToggled { open } => {
            vec![if *open { "-- panel open --" } else { "-- panel closed --" }.to_string()]
        }
        WidgetEvent::ViewRendered { view, .. } => format_view(view),
        WidgetEvent::EmptyState { text } => vec![text.clone()],
        WidgetEvent::BadgeChanged { label, .. } => match label {
            Some(label) => vec![format!("(unread: {})", label)],
            None => vec!["(no unread messages)".to_string()],
        },
        WidgetEvent::Notification(notification) => {
            vec![format!("\x07[{}] {}", notification.title, notification.body)]
        }
        WidgetEvent::Status(status) => {
            let prefix = match status.kind {
                StatusKind::Error => "!",
                StatusKind::Success => "+",
                StatusKind::Info => "*",
            };
            vec![format!("{} {}", prefix, status.text)]
        }
        WidgetEvent::TranslationChanged {
            message_id,
            text,
            control,
        } => {
            let mut line = format!("[{}] {}", message_id, text);
            if *control != ToggleControl::Hidden {
                line.push_str(&format!("  <{}>", control.label()));
            }
            vec![line]
        }
        WidgetEvent::TicketLoaded {
            ticket_id,
            owner,
            status,
        } => vec![format!("Ticket #{} from {} ({})", ticket_id, owner, status)],
        WidgetEvent::TicketDeleted { ticket_id } => vec![format!("Ticket #{} deleted", ticket_id)],
        WidgetEvent::AuthRequired { text } => vec![format!("! {}", text)],
    }
}
