//! Screen rendering
//!
//! A pure mapping from a [`View`] (what the state machine wants to show) and a
//! language to a [`Screen`] (HTML text plus button rows). Anything that came
//! from the user or the panel is HTML-escaped.

mod stats;

pub use stats::{format_gb, Expiry, StatsSummary};

use crate::i18n::{Language, Translator};
use crate::panel::ServiceEntry;
use crate::state_machine::action::{Action, AuthAction, MenuAction, SettingsAction};

const PLACEHOLDER: &str = "—";
const DIVIDER: &str = "──────────────────";

/// A rendered screen, always replacing the previous one in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub rows: Vec<Vec<Button>>,
}

impl Screen {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
        }
    }

    /// All callback actions on this screen, in row order
    #[allow(dead_code)] // Used in tests
    pub fn actions(&self) -> Vec<Action> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|b| match &b.target {
                ButtonTarget::Action(action) => Some(*action),
                ButtonTarget::Url(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub target: ButtonTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonTarget {
    Action(Action),
    Url(String),
}

impl Button {
    fn action(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Action(action),
        }
    }

    fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Url(url.into()),
        }
    }
}

/// What to show, with the data it needs
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    LanguageChoice,
    /// `selected` is set right after a language pick
    AuthGate { selected: Option<Language> },
    LoginChecking,
    LoginNotFound,
    ServicePrompt,
    ServiceSent,
    MainMenu { is_admin: bool },
    NotAuthorized,
    StatsLoading,
    Stats(StatsSummary),
    NoData,
    Account(AccountSummary),
    Wallet,
    ServicesLoading,
    Services(Vec<ServiceEntry>),
    Tutorial,
    Settings,
    Support,
    Profile(ProfileSummary),
    AdminPanel { panel_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub panel_identity: String,
    pub username: Option<String>,
    pub external_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub external_id: i64,
    pub language: Language,
    pub is_registered: bool,
}

/// Notice posted to the admin review channel for a new-service request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequestNotice {
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub external_id: i64,
    pub text: String,
}

impl ServiceRequestNotice {
    /// `@handle` when the user has one, otherwise a deep link to the id
    pub fn contact(&self) -> String {
        match self.handle.as_deref().filter(|h| !h.is_empty()) {
            Some(handle) => format!("@{handle}"),
            None => format!("tg://user?id={}", self.external_id),
        }
    }
}

pub fn render(view: &View, language: Language, tr: &Translator) -> Screen {
    let t = |key: &str| tr.t(language, key);
    let back_to_auth = || vec![vec![Button::action(t("btn_back"), Action::Auth(AuthAction::Back))]];
    let back_to_menu = || vec![vec![Button::action(t("btn_back"), Action::Menu(MenuAction::Back))]];

    match view {
        View::LanguageChoice => Screen {
            text: tr.t(Language::default(), "lang_select_title"),
            rows: vec![Language::ALL
                .into_iter()
                .map(|lang| Button::action(tr.t(lang, "language_name"), Action::Lang(lang)))
                .collect()],
        },

        View::AuthGate { selected } => {
            let header = if selected.is_some() {
                t("lang_selected")
            } else {
                t("lang_current")
            };
            Screen {
                text: format!("{header}\n\n{}", t("auth_title")),
                rows: vec![
                    vec![Button::action(t("btn_login"), Action::Auth(AuthAction::Login))],
                    vec![Button::action(
                        t("btn_new_service"),
                        Action::Auth(AuthAction::NewService),
                    )],
                ],
            }
        }

        View::LoginChecking => Screen::text_only(t("login_checking")),

        View::LoginNotFound => Screen {
            text: t("login_not_found"),
            rows: back_to_auth(),
        },

        View::ServicePrompt => Screen {
            text: t("new_service_prompt"),
            rows: back_to_auth(),
        },

        View::ServiceSent => Screen {
            text: t("new_service_sent"),
            rows: back_to_auth(),
        },

        View::MainMenu { is_admin } => {
            let pair = |a: (&str, MenuAction), b: (&str, MenuAction)| {
                vec![
                    Button::action(t(a.0), Action::Menu(a.1)),
                    Button::action(t(b.0), Action::Menu(b.1)),
                ]
            };
            let mut rows = vec![
                pair(("btn_main_stats", MenuAction::Stats), ("btn_main_account", MenuAction::Account)),
                pair(("btn_main_wallet", MenuAction::Wallet), ("btn_main_services", MenuAction::Services)),
                pair(("btn_main_tutorial", MenuAction::Tutorial), ("btn_main_settings", MenuAction::Settings)),
                pair(("btn_main_support", MenuAction::Support), ("btn_main_profile", MenuAction::Profile)),
            ];
            if *is_admin {
                rows.push(vec![Button::action(t("btn_main_panel"), Action::Menu(MenuAction::Panel))]);
            }
            Screen {
                text: t("menu_welcome"),
                rows,
            }
        }

        View::NotAuthorized => Screen {
            text: t("not_authorized"),
            rows: back_to_menu(),
        },

        View::StatsLoading => Screen {
            text: t("stats_loading"),
            rows: back_to_menu(),
        },

        View::Stats(summary) => Screen {
            text: render_stats(summary, language, tr),
            rows: back_to_menu(),
        },

        View::NoData => Screen {
            text: t("no_data"),
            rows: back_to_menu(),
        },

        View::Account(account) => Screen {
            text: format!(
                "👤 <b>{}</b>\n\n• UUID: <code>{}</code>\n• {}: {}\n• Telegram ID: <code>{}</code>",
                t("account_title"),
                escape_html(&account.panel_identity),
                t("label_username"),
                or_placeholder(account.username.as_deref()),
                account.external_id,
            ),
            rows: back_to_menu(),
        },

        View::Wallet => Screen {
            text: format!("💰 <b>{}</b>\n\n🔧 {}", t("wallet_title"), t("wallet_soon")),
            rows: back_to_menu(),
        },

        View::ServicesLoading => Screen {
            text: t("services_loading"),
            rows: back_to_menu(),
        },

        View::Services(items) => {
            let text = if items.is_empty() {
                format!("📡 {}", t("services_none"))
            } else {
                let mut lines = vec![format!("📡 <b>{}</b>\n", t("services_title"))];
                lines.extend(items.iter().enumerate().map(|(i, item)| {
                    format!(
                        "{}. {} — {}",
                        i + 1,
                        or_placeholder(item.name.as_deref()),
                        or_placeholder(item.protocol.as_deref()),
                    )
                }));
                lines.join("\n")
            };
            Screen {
                text,
                rows: back_to_menu(),
            }
        }

        View::Tutorial => Screen {
            text: t("tutorial_text"),
            rows: back_to_menu(),
        },

        View::Settings => Screen {
            text: t("settings_title"),
            rows: vec![
                vec![Button::action(
                    t("btn_change_lang"),
                    Action::Settings(SettingsAction::ChangeLanguage),
                )],
                vec![Button::action(t("btn_back"), Action::Menu(MenuAction::Back))],
            ],
        },

        View::Support => Screen {
            text: t("support_prompt"),
            rows: back_to_menu(),
        },

        View::Profile(profile) => Screen {
            text: format!(
                "🧑‍💼 <b>{}</b>\n\n• {}: {}\n• {}: @{}\n• Telegram ID: <code>{}</code>\n• {}: {}\n• {}: {}",
                t("profile_title"),
                t("label_name"),
                or_placeholder(profile.display_name.as_deref()),
                t("label_username"),
                or_placeholder(profile.handle.as_deref()),
                profile.external_id,
                t("label_language"),
                tr.t(profile.language, "language_name"),
                t("label_registered"),
                if profile.is_registered { "✅" } else { "❌" },
            ),
            rows: back_to_menu(),
        },

        View::AdminPanel { panel_url } => Screen {
            text: format!("🖥️ {}", t("admin_panel_title")),
            rows: vec![
                vec![Button::url(t("btn_open_panel"), panel_url.clone())],
                vec![Button::action(t("btn_back"), Action::Menu(MenuAction::Back))],
            ],
        },
    }
}

fn render_stats(s: &StatsSummary, language: Language, tr: &Translator) -> String {
    let t = |key: &str| tr.t(language, key);

    let status = match s.status.as_deref() {
        Some("ACTIVE") => t("status_active"),
        Some("DISABLED") => t("status_disabled"),
        Some("EXPIRED") => t("status_expired"),
        Some(other) => escape_html(other),
        None => PLACEHOLDER.to_string(),
    };
    let total = s.total_gb.map_or_else(|| "∞".to_string(), format_gb);
    let expiry = match &s.expiry {
        Expiry::Unknown => PLACEHOLDER.to_string(),
        Expiry::Date { date, days_left } => {
            let days = days_left.to_string();
            format!(
                "{} ({})",
                date.format("%Y-%m-%d"),
                tr.resolve(language.code(), "stats_days_left", &[("days", &days)])
            )
        }
        Expiry::Raw(raw) => escape_html(raw),
    };

    [
        format!(
            "👤 <b>{}</b>: {} ({status})",
            t("stats_name"),
            or_placeholder(s.username.as_deref())
        ),
        DIVIDER.to_string(),
        format!("🗂️ <b>{}</b>: {total} GB", t("stats_total")),
        format!("🔥 <b>{}</b>: {} GB", t("stats_used"), format_gb(s.used_gb)),
        format!("📥 <b>{}</b>: {} GB", t("stats_remaining"), format_gb(s.remaining_gb)),
        // Per-day accounting is not tracked by the panel
        format!("⚡️ <b>{}</b>: 0 MB", t("stats_today")),
        format!(
            "⏰ <b>{}</b>: {}",
            t("stats_last_connection"),
            or_placeholder(s.last_connection.as_deref())
        ),
        format!("📅 <b>{}</b>: {expiry}", t("stats_expiry")),
        format!(
            "🔑 <b>{}</b>: <code>{}</code>",
            t("stats_user_id"),
            escape_html(&s.panel_identity)
        ),
    ]
    .join("\n")
}

/// Admin notice text; always in the default language
pub fn render_service_notice(notice: &ServiceRequestNotice, tr: &Translator) -> String {
    format!(
        "📋 <b>{}</b>\n👤 {} ({})\n🆔 <code>{}</code>\n\n💬 {}",
        tr.t(Language::default(), "admin_notice_title"),
        or_placeholder(notice.display_name.as_deref()),
        escape_html(&notice.contact()),
        notice.external_id,
        escape_html(&notice.text),
    )
}

fn or_placeholder(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .map_or_else(|| PLACEHOLDER.to_string(), escape_html)
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
