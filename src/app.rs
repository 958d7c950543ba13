use std::collections::VecDeque;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{error, info, warn};

use crate::error::InputError;
use crate::notifier::Notifier;
use crate::registry::UserRegistry;
use crate::scanner::{self, Resolution, ScanBuffer};
use crate::settings::Settings;
use crate::worker::WorkerEvent;

const MAX_ACTIVITY: usize = 200;

pub const HOW_TO_TEXT: &str = "\
1. Create a chat bot and copy its token.\n\
2. Add the bot to your server/group and note the channel ID.\n\
3. Use 'Settings > Chat API' to enter the bot token and channel ID.\n\
4. Use 'Settings > Leading Characters' and 'Settings > Trailing Characters' \
to trim extra characters your reader adds.\n\
5. Add users with their RFID, name, and custom message.\n\
6. Keep 'RFID Input' focused. When a card is scanned, the bot posts a message \
to the configured channel.";

pub const INFO_TEXT: &str = concat!(
    "Manages RFID badge check-ins and announces them in a chat channel.\n",
    "rfidbot v",
    env!("CARGO_PKG_VERSION")
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Scan,
    BadgeId,
    Name,
    Message,
    Users,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Scan,
        Focus::BadgeId,
        Focus::Name,
        Focus::Message,
        Focus::Users,
    ];

    fn step(self, forward: bool) -> Focus {
        let i = Self::ORDER.iter().position(|&f| f == self).unwrap_or(0);
        let n = Self::ORDER.len();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        Self::ORDER[next]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPurpose {
    Token,
    ChannelId { token: String },
    LeadingTrim,
    TrailingTrim,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Message {
        level: Level,
        title: String,
        body: String,
    },
    Prompt {
        title: String,
        label: String,
        input: String,
        purpose: PromptPurpose,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Quit,
    ChatApi,
    LeadingTrim,
    TrailingTrim,
    HowTo,
    Info,
}

/// (section, label, action) in display order
pub const MENU_ITEMS: [(&str, &str, MenuAction); 6] = [
    ("File", "Quit", MenuAction::Quit),
    ("Settings", "Chat API", MenuAction::ChatApi),
    ("Settings", "Leading Characters", MenuAction::LeadingTrim),
    ("Settings", "Trailing Characters", MenuAction::TrailingTrim),
    ("About", "How To", MenuAction::HowTo),
    ("About", "Info", MenuAction::Info),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Ready(String),
    Failed,
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub level: Level,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Default)]
pub struct UserForm {
    pub badge_id: String,
    pub name: String,
    pub message: String,
}

impl UserForm {
    fn field_mut(&mut self, focus: Focus) -> Option<&mut String> {
        match focus {
            Focus::BadgeId => Some(&mut self.badge_id),
            Focus::Name => Some(&mut self.name),
            Focus::Message => Some(&mut self.message),
            Focus::Scan | Focus::Users => None,
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// All UI-thread state and the operator actions that mutate it
pub struct App {
    pub registry: UserRegistry,
    pub settings: Settings,
    pub platform_name: String,
    pub scan: ScanBuffer,
    pub form: UserForm,
    pub focus: Focus,
    pub selected: Option<usize>,
    /// Front is the dialog currently shown
    pub dialogs: VecDeque<Dialog>,
    /// Highlighted menu row while the menu is open
    pub menu: Option<usize>,
    pub activity: VecDeque<ActivityEntry>,
    pub connection: ConnectionStatus,
    notifier: Notifier,
}

impl App {
    pub fn new(settings: Settings, platform_name: impl Into<String>, notifier: Notifier) -> Self {
        Self {
            registry: UserRegistry::new(),
            settings,
            platform_name: platform_name.into(),
            scan: ScanBuffer::default(),
            form: UserForm::default(),
            focus: Focus::Scan,
            selected: None,
            dialogs: VecDeque::new(),
            menu: None,
            activity: VecDeque::new(),
            connection: ConnectionStatus::Connecting,
            notifier,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            return Control::Quit;
        }

        if !self.dialogs.is_empty() {
            self.handle_dialog_key(key);
            return Control::Continue;
        }
        if self.menu.is_some() {
            return self.handle_menu_key(key);
        }

        match key.code {
            KeyCode::F(10) | KeyCode::Esc => {
                self.menu = Some(0);
                return Control::Continue;
            }
            KeyCode::F(1) => {
                self.show_message(Level::Info, "How To", HOW_TO_TEXT);
                return Control::Continue;
            }
            KeyCode::Tab => {
                self.focus = self.focus.step(true);
                return Control::Continue;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.step(false);
                return Control::Continue;
            }
            _ => {}
        }

        match self.focus {
            Focus::Scan => match key.code {
                KeyCode::Enter => self.submit_scan(),
                KeyCode::Backspace => self.scan.backspace(),
                KeyCode::Char(c) if !ctrl => self.scan.push(c),
                _ => {}
            },
            Focus::BadgeId | Focus::Name | Focus::Message => match key.code {
                KeyCode::Enter => self.add_user(),
                KeyCode::Backspace => {
                    if let Some(field) = self.form.field_mut(self.focus) {
                        field.pop();
                    }
                }
                KeyCode::Char(c) if !ctrl => {
                    if let Some(field) = self.form.field_mut(self.focus) {
                        field.push(c);
                    }
                }
                _ => {}
            },
            Focus::Users => match key.code {
                KeyCode::Up => self.select_previous(),
                KeyCode::Down => self.select_next(),
                KeyCode::Delete | KeyCode::Char('d') => self.delete_selected(),
                _ => {}
            },
        }
        Control::Continue
    }

    /// Add the user described by the form, clearing it on success
    pub fn add_user(&mut self) {
        let result = self
            .registry
            .add(&self.form.badge_id, &self.form.name, &self.form.message)
            .map(|record| format!("Added {} ({})", record.display_name, record.badge_id));
        match result {
            Ok(text) => {
                self.form.clear();
                self.push_activity(Level::Info, text);
            }
            Err(e) => self.show_input_error(e),
        }
    }

    pub fn delete_selected(&mut self) {
        match self.registry.remove(self.selected) {
            Ok(record) => {
                self.selected = None;
                self.push_activity(
                    Level::Info,
                    format!("Removed {} ({})", record.display_name, record.badge_id),
                );
            }
            Err(e) => self.show_input_error(e),
        }
    }

    /// Terminator key seen in the scan field
    pub fn submit_scan(&mut self) {
        let raw = self.scan.take();
        let badge_id = self.settings.trim.apply(&raw).to_string();

        let resolved = match scanner::resolve(&self.registry, &badge_id) {
            Resolution::Empty => return,
            Resolution::Known(record) => Ok(record.clone()),
            Resolution::Unknown(id) => Err(id),
        };
        let record = match resolved {
            Ok(record) => record,
            Err(id) => {
                self.show_input_error(InputError::UnknownBadge(id));
                return;
            }
        };

        info!("Badge {} resolved to {}", record.badge_id, record.display_name);
        match self.notifier.send(&record, self.settings.channel_id) {
            Ok(()) => self.push_activity(
                Level::Info,
                format!("{} checked in", record.display_name),
            ),
            Err(e) => {
                error!("Failed to queue notification: {:#}", e);
                self.push_activity(Level::Error, format!("Could not notify: {}", e));
            }
        }
    }

    pub fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Ready { identity } => {
                self.push_activity(Level::Info, format!("Bot logged in as {}", identity));
                self.connection = ConnectionStatus::Ready(identity);
            }
            WorkerEvent::ConnectFailed { error } => {
                self.connection = ConnectionStatus::Failed;
                self.push_activity(Level::Error, format!("Bot connection failed: {}", error));
                self.dialogs.push_back(Dialog::Message {
                    level: Level::Error,
                    title: "Bot Error".to_string(),
                    body: error,
                });
            }
            WorkerEvent::Delivered {
                badge_id,
                channel_id,
            } => self.push_activity(
                Level::Info,
                format!("Posted check-in for {} to channel {}", badge_id, channel_id),
            ),
            WorkerEvent::DeliveryFailed { badge_id, error } => self.push_activity(
                Level::Warning,
                format!("Delivery failed for {}: {}", badge_id, error),
            ),
        }
    }

    pub fn run_menu_action(&mut self, action: MenuAction) -> Control {
        match action {
            MenuAction::Quit => return Control::Quit,
            MenuAction::ChatApi => self.open_prompt(
                "Chat API",
                "Enter your bot token:",
                PromptPurpose::Token,
            ),
            MenuAction::LeadingTrim => self.open_prompt(
                "Leading Characters",
                "Enter leading characters to trim (if any):",
                PromptPurpose::LeadingTrim,
            ),
            MenuAction::TrailingTrim => self.open_prompt(
                "Trailing Characters",
                "Enter trailing characters to trim (if any):",
                PromptPurpose::TrailingTrim,
            ),
            MenuAction::HowTo => self.show_message(Level::Info, "How To", HOW_TO_TEXT),
            MenuAction::Info => self.show_message(Level::Info, "Info", INFO_TEXT),
        }
        Control::Continue
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Control {
        let Some(index) = self.menu else {
            return Control::Continue;
        };
        let n = MENU_ITEMS.len();
        match key.code {
            KeyCode::Up => self.menu = Some((index + n - 1) % n),
            KeyCode::Down => self.menu = Some((index + 1) % n),
            KeyCode::Esc | KeyCode::F(10) => self.menu = None,
            KeyCode::Enter => {
                self.menu = None;
                return self.run_menu_action(MENU_ITEMS[index].2);
            }
            _ => {}
        }
        Control::Continue
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let is_prompt = matches!(self.dialogs.front(), Some(Dialog::Prompt { .. }));
        match key.code {
            KeyCode::Esc => {
                self.dialogs.pop_front();
            }
            KeyCode::Enter => {
                if let Some(Dialog::Prompt { input, purpose, .. }) = self.dialogs.pop_front() {
                    self.submit_prompt(purpose, input);
                }
            }
            KeyCode::Char(c) if is_prompt => {
                if let Some(Dialog::Prompt { input, .. }) = self.dialogs.front_mut() {
                    input.push(c);
                }
            }
            KeyCode::Backspace if is_prompt => {
                if let Some(Dialog::Prompt { input, .. }) = self.dialogs.front_mut() {
                    input.pop();
                }
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, purpose: PromptPurpose, input: String) {
        match purpose {
            PromptPurpose::Token => {
                if input.is_empty() {
                    return;
                }
                self.open_prompt(
                    "Chat API",
                    "Enter your channel ID:",
                    PromptPurpose::ChannelId { token: input },
                );
            }
            PromptPurpose::ChannelId { token } => {
                if input.is_empty() {
                    return;
                }
                match self.settings.set_credentials(&token, &input) {
                    Ok(()) => {
                        self.connection = ConnectionStatus::Connecting;
                        if let Err(e) = self.notifier.reconnect(&token) {
                            error!("Failed to request reconnect: {:#}", e);
                        }
                        self.push_activity(
                            Level::Info,
                            format!("Channel set to {}", self.settings.channel_id),
                        );
                        self.show_message(
                            Level::Info,
                            "Success",
                            "Chat API information updated successfully.",
                        );
                    }
                    Err(e) => self.show_input_error(e),
                }
            }
            PromptPurpose::LeadingTrim => {
                self.settings.set_leading_trim(&input);
                self.show_message(
                    Level::Info,
                    "Success",
                    &format!("Leading characters set to: '{}'", input),
                );
            }
            PromptPurpose::TrailingTrim => {
                self.settings.set_trailing_trim(&input);
                self.show_message(
                    Level::Info,
                    "Success",
                    &format!("Trailing characters set to: '{}'", input),
                );
            }
        }
    }

    fn open_prompt(&mut self, title: &str, label: &str, purpose: PromptPurpose) {
        self.dialogs.push_front(Dialog::Prompt {
            title: title.to_string(),
            label: label.to_string(),
            input: String::new(),
            purpose,
        });
    }

    fn show_message(&mut self, level: Level, title: &str, body: &str) {
        self.dialogs.push_front(Dialog::Message {
            level,
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn show_input_error(&mut self, e: InputError) {
        warn!("{} ({}): {:?}", e.title(), e, e.subject());
        let level = match e {
            InputError::InvalidChannelId(_) => Level::Error,
            _ => Level::Warning,
        };
        self.show_message(level, e.title(), &e.to_string());
    }

    fn select_next(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        let last = self.registry.len() - 1;
        self.selected = Some(match self.selected {
            Some(i) => (i + 1).min(last),
            None => 0,
        });
    }

    fn select_previous(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
    }

    fn push_activity(&mut self, level: Level, text: String) {
        if self.activity.len() == MAX_ACTIVITY {
            self.activity.pop_front();
        }
        self.activity.push_back(ActivityEntry {
            at: Local::now(),
            level,
            text,
        });
    }
}
