//! Chat command dispatch — maps user-facing commands onto engine calls and
//! renders replies as chat text (Telegram-flavoured Markdown).
//!
//! Commands:
//! - `/start`, `/free`, `/subscribe`, `/howtouse`, `/support`, `/about` — informational
//! - `/signal` — request a signal
//! - `/status` — caller's current entitlement
//! - `/mark_paid <user_id> [days]` — admin only, grants a subscription

use rand::Rng;
use tracing::{info, warn};

use signalbot_core::{
    parse_days, parse_user_id, Clock, Denial, Engine, Entitlement, Grant, IssuedSignal,
    RecordStore, UserId, UserStatus, ValidationError,
};

/// Who sent a message.
#[derive(Debug, Clone, Copy)]
pub struct Sender<'a> {
    pub id: UserId,
    pub username: Option<&'a str>,
}

/// A recognized chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Signal,
    Free,
    Subscribe,
    HowToUse,
    Support,
    About,
    Status,
    MarkPaid(Vec<&'a str>),
}

impl<'a> Command<'a> {
    /// Parse `/name[@bot] args...`. Plain text and unknown commands yield `None`.
    pub fn parse(text: &'a str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;
        let name = head.split_once('@').map_or(head, |(name, _)| name);
        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "signal" => Command::Signal,
            "free" => Command::Free,
            "subscribe" => Command::Subscribe,
            "howtouse" => Command::HowToUse,
            "support" => Command::Support,
            "about" => Command::About,
            "status" => Command::Status,
            "mark_paid" => Command::MarkPaid(tokens.collect()),
            _ => return None,
        };
        Some(command)
    }
}

pub const MARK_PAID_USAGE: &str = "Usage: /mark_paid <user_id> [days] (Default 30 days)";
pub const ACCESS_DENIED: &str = "⛔ Access denied. Only the administrator can use this command.";
pub const INVALID_ARGS: &str = "Invalid user_id or days value.";

/// Render an issued signal with its status footer.
pub fn render_signal(issued: &IssuedSignal) -> String {
    let signal = &issued.signal;
    let emoji = match signal.direction {
        signalbot_core::Direction::Buy => "🟢",
        signalbot_core::Direction::Sell => "🔴",
    };
    format!(
        "{emoji} **{}** - **{}** | 2min Candle | Time: {}\n{}",
        signal.instrument,
        signal.direction,
        signal.slot_label(),
        issued.footer
    )
}

pub fn render_denial(denial: &Denial) -> String {
    format!("💰 {}\n{}", denial.headline(), denial.contact_line())
}

pub fn render_grant(grant: &Grant) -> String {
    format!(
        "✅ User `{}` marked PAID for **{} days** until {}",
        grant.user,
        grant.days,
        grant.paid_until.format("%Y-%m-%d %H:%M")
    )
}

pub fn render_status(status: &UserStatus) -> String {
    match status.entitlement {
        Entitlement::Subscribed { until } => format!(
            "💳 Subscribed: unlimited signals until {}",
            until.format("%Y-%m-%d %H:%M")
        ),
        Entitlement::FreeTier { remaining } => {
            format!("🎁 Free tier: {remaining} free signals remaining")
        }
        Entitlement::Exhausted => {
            "💰 Free signals used up. Send /subscribe to continue.".to_string()
        }
    }
}

/// Routes chat messages to the engine.
pub struct Dispatcher<'e, S, C, R> {
    engine: &'e Engine<S, C, R>,
}

impl<'e, S, C, R> Dispatcher<'e, S, C, R>
where
    S: RecordStore,
    C: Clock,
    R: Rng,
{
    pub fn new(engine: &'e Engine<S, C, R>) -> Self {
        Self { engine }
    }

    fn admin(&self) -> &str {
        self.engine.config().admin_handle()
    }

    fn free_limit(&self) -> u32 {
        self.engine.config().free_signal_limit
    }

    fn is_admin(&self, sender: &Sender<'_>) -> bool {
        let admin = self.admin();
        !admin.is_empty()
            && sender
                .username
                .is_some_and(|name| name.trim_start_matches('@').eq_ignore_ascii_case(admin))
    }

    /// Reply to `text` from `sender`, or `None` if it is not a known command.
    pub fn handle(&self, sender: &Sender<'_>, text: &str) -> Option<String> {
        let command = Command::parse(text)?;
        let reply = match command {
            Command::Start => self.start_text(),
            Command::Signal => match self.engine.request_signal(sender.id) {
                Ok(issued) => render_signal(&issued),
                Err(denial) => render_denial(&denial),
            },
            Command::Free => format!(
                "🎁 You can claim up to {} free signals. Each `/signal` counts.",
                self.free_limit()
            ),
            Command::Subscribe => format!(
                "💳 Subscription unlocks unlimited signals for one month.\nContact admin: @{} to subscribe.",
                self.admin()
            ),
            Command::HowToUse => HOW_TO_USE.to_string(),
            Command::Support => format!("📩 Contact admin for support: @{}", self.admin()),
            Command::About => ABOUT.to_string(),
            Command::Status => match self.engine.status(sender.id) {
                Some(status) => render_status(&status),
                None => format!(
                    "🎁 Free tier: {} free signals remaining",
                    self.free_limit()
                ),
            },
            Command::MarkPaid(args) => self.mark_paid(sender, &args),
        };
        Some(reply)
    }

    fn start_text(&self) -> String {
        format!(
            "⚡ Welcome! Get fast IQOption signals instantly.\n\
             Free signals available: {}\n\
             Admin: @{}\n\
             Commands:\n\
             /signal - Generate a trading signal\n\
             /free - Claim free signals\n\
             /subscribe - View subscription info\n\
             /status - Show your remaining signals or subscription\n\
             /howtouse - Learn to use signals and martingale\n\
             /support - Contact support\n\
             /about - About the bot",
            self.free_limit(),
            self.admin()
        )
    }

    fn mark_paid(&self, sender: &Sender<'_>, args: &[&str]) -> String {
        if !self.is_admin(sender) {
            warn!(user = %sender.id, username = ?sender.username, "unauthorized /mark_paid");
            return ACCESS_DENIED.to_string();
        }
        let Some(raw_user) = args.first() else {
            return MARK_PAID_USAGE.to_string();
        };
        let parsed = parse_user_id(raw_user).and_then(|user| {
            let days = args.get(1).map(|raw| parse_days(raw)).transpose()?;
            Ok((user, days))
        });
        let (user, days) = match parsed {
            Ok(parsed) => parsed,
            Err(_) => return INVALID_ARGS.to_string(),
        };
        match self.engine.grant_subscription(user, days) {
            Ok(grant) => {
                info!(admin = %sender.id, %user, days = grant.days, "admin granted subscription");
                render_grant(&grant)
            }
            Err(ValidationError::NonPositiveDays(_) | ValidationError::DaysOutOfRange(_)) => {
                "Days must be a positive whole number of days.".to_string()
            }
            Err(_) => INVALID_ARGS.to_string(),
        }
    }
}

const HOW_TO_USE: &str = "📘 How to Use Signals & Martingale:\n\n\
• Divide capital by martingale levels:\n  \
- 4-level → /15\n  \
- 6-level → /63\n  \
- 8-level → /256\n\
• Each new signal = next martingale.\n\
• If signal wins → next signal normal.\n\
• If signal loses → generate new signal, multiply stake by 2.\n\
• Repeat until intended martingale completed.\n\
• Reset on win.\n\n⚠ Learn to trade content coming soon.";

const ABOUT: &str = "🤖 IQOption Binary Master Bot\n\
Provides fast trading signals on a fixed two-minute candle schedule.\n\
Signals are randomized and are not financial advice.";
