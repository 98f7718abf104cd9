//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::db::UserRecord;
use crate::i18n::Language;
use crate::menu::Screen;
use crate::panel::{PanelStats, PanelUser, ServiceEntry};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// In-Memory User Store
// ============================================================================

/// User store backed by a map, with an injectable failure switch
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<i64, UserRecord>>,
    pub fail: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, record: UserRecord) -> Self {
        self.users.lock().unwrap().insert(record.external_id, record);
        self
    }

    pub fn user(&self, external_id: i64) -> Option<UserRecord> {
        self.users.lock().unwrap().get(&external_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            Err("store unavailable".to_string())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, external_id: i64) -> Result<Option<UserRecord>, String> {
        self.check()?;
        Ok(self.user(external_id))
    }

    async fn upsert_user(
        &self,
        external_id: i64,
        display_name: Option<&str>,
        handle: Option<&str>,
    ) -> Result<UserRecord, String> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let record = users
            .entry(external_id)
            .and_modify(|r| {
                r.display_name = display_name.map(String::from);
                r.handle = handle.map(String::from);
                r.updated_at = Utc::now();
            })
            .or_insert_with(|| UserRecord::new(external_id, display_name, handle));
        Ok(record.clone())
    }

    async fn set_language(&self, external_id: i64, language: Language) -> Result<bool, String> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        Ok(users
            .get_mut(&external_id)
            .map(|r| r.language = language)
            .is_some())
    }

    async fn link_panel_identity(
        &self,
        external_id: i64,
        panel_identity: &str,
    ) -> Result<bool, String> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        Ok(users
            .get_mut(&external_id)
            .map(|r| {
                r.is_registered = true;
                r.panel_identity = Some(panel_identity.to_string());
            })
            .is_some())
    }
}

// ============================================================================
// Mock Panel
// ============================================================================

/// Panel with canned answers that counts every call
#[derive(Default)]
pub struct MockPanel {
    pub user: Mutex<Option<PanelUser>>,
    pub stats: Mutex<Option<PanelStats>>,
    pub services: Mutex<Vec<ServiceEntry>>,
    calls: AtomicUsize,
}

impl MockPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, uuid: &str) -> Self {
        *self.user.lock().unwrap() = Some(PanelUser {
            uuid: Some(uuid.to_string()),
            telegram_id: None,
            username: None,
        });
        self
    }

    pub fn with_stats(self, stats: PanelStats) -> Self {
        *self.stats.lock().unwrap() = Some(stats);
        self
    }

    pub fn with_services(self, services: Vec<ServiceEntry>) -> Self {
        *self.services.lock().unwrap() = services;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PanelApi for MockPanel {
    async fn find_by_identity(&self, _external_id: i64) -> Option<PanelUser> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.user.lock().unwrap().clone()
    }

    async fn get_stats(&self, _panel_identity: &str) -> Option<PanelStats> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.stats.lock().unwrap().clone()
    }

    async fn list_services(&self, _panel_identity: &str) -> Vec<ServiceEntry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.services.lock().unwrap().clone()
    }
}

// ============================================================================
// Recording Transport
// ============================================================================

/// Everything the runtime asked the transport to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Ack(String),
    Send { chat_id: i64, message_id: i32, screen: Screen },
    Edit { chat_id: i64, message_id: i32, screen: Screen },
    Delete { chat_id: i64, message_id: i32 },
    Post { chat_id: i64, thread_id: Option<i32>, text: String },
}

/// Transport that records calls; individual operations can be made to fail
pub struct RecordingTransport {
    pub log: Mutex<Vec<Outbound>>,
    next_message_id: AtomicI32,
    pub fail_edit: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_post: AtomicBool,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            next_message_id: AtomicI32::new(100),
            fail_edit: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_post: AtomicBool::new(false),
        }
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outbound(&self) -> Vec<Outbound> {
        self.log.lock().unwrap().clone()
    }

    /// Screens sent or edited, in order
    pub fn screens(&self) -> Vec<Screen> {
        self.outbound()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Send { screen, .. } | Outbound::Edit { screen, .. } => Some(screen),
                _ => None,
            })
            .collect()
    }

    pub fn last_screen(&self) -> Option<Screen> {
        self.screens().pop()
    }

    pub fn posts(&self) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Post { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    fn record(&self, outbound: Outbound) {
        self.log.lock().unwrap().push(outbound);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn acknowledge(&self, callback_id: &str) -> Result<(), String> {
        self.record(Outbound::Ack(callback_id.to_string()));
        Ok(())
    }

    async fn send_screen(&self, chat_id: i64, screen: &Screen) -> Result<i32, String> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.record(Outbound::Send {
            chat_id,
            message_id,
            screen: screen.clone(),
        });
        Ok(message_id)
    }

    async fn edit_screen(
        &self,
        chat_id: i64,
        message_id: i32,
        screen: &Screen,
    ) -> Result<(), String> {
        if self.fail_edit.load(Ordering::SeqCst) {
            return Err("message to edit not found".to_string());
        }
        self.record(Outbound::Edit {
            chat_id,
            message_id,
            screen: screen.clone(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), String> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err("message can't be deleted".to_string());
        }
        self.record(Outbound::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn post_to_channel(
        &self,
        chat_id: i64,
        thread_id: Option<i32>,
        text: &str,
    ) -> Result<(), String> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err("chat not found".to_string());
        }
        self.record(Outbound::Post {
            chat_id,
            thread_id,
            text: text.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Translator;
    use crate::menu::{ButtonTarget, View};
    use crate::runtime::{AdminChannel, ConversationRuntime, Principal, RuntimeSettings};
    use crate::state_machine::action::{AuthAction, MenuAction};
    use crate::state_machine::{Action, Event};
    use std::sync::Arc;

    type TestRuntime =
        ConversationRuntime<Arc<InMemoryUserStore>, Arc<MockPanel>, Arc<RecordingTransport>>;

    struct Harness {
        runtime: TestRuntime,
        store: Arc<InMemoryUserStore>,
        panel: Arc<MockPanel>,
        transport: Arc<RecordingTransport>,
        translator: Arc<Translator>,
        principal: Principal,
    }

    impl Harness {
        fn new(store: InMemoryUserStore, panel: MockPanel) -> Self {
            let store = Arc::new(store);
            let panel = Arc::new(panel);
            let transport = Arc::new(RecordingTransport::new());
            let translator = Arc::new(Translator::default());
            let settings = RuntimeSettings {
                admin_ids: [1].into_iter().collect(),
                admin_channel: Some(AdminChannel {
                    chat_id: -100,
                    thread_id: Some(1),
                }),
                panel_url: "https://panel.example".into(),
            };
            let runtime = ConversationRuntime::new(
                store.clone(),
                panel.clone(),
                transport.clone(),
                translator.clone(),
                settings,
            );
            Self {
                runtime,
                store,
                panel,
                transport,
                translator,
                principal: Principal {
                    external_id: 42,
                    chat_id: 42,
                    display_name: Some("Ann".into()),
                    handle: Some("ann".into()),
                },
            }
        }

        async fn start(&self) {
            self.runtime
                .handle(&self.principal, Event::Start { message_id: 1 })
                .await;
        }

        async fn press(&self, action: Action, message_id: i32) {
            self.runtime
                .handle(
                    &self.principal,
                    Event::Action {
                        action,
                        callback_id: format!("cb-{action}"),
                        message_id: Some(message_id),
                    },
                )
                .await;
        }

        async fn say(&self, text: &str, message_id: i32) {
            self.runtime
                .handle(
                    &self.principal,
                    Event::Text {
                        text: text.to_string(),
                        message_id,
                    },
                )
                .await;
        }

        fn rendered(&self, view: &View, language: Language) -> Screen {
            crate::menu::render(view, language, &self.translator)
        }
    }

    fn linked_record() -> UserRecord {
        let mut record = UserRecord::new(42, Some("Ann"), Some("ann"));
        record.is_registered = true;
        record.panel_identity = Some("uuid-42".into());
        record
    }

    #[tokio::test]
    async fn test_mock_store_upsert_keeps_one_record() {
        let store = InMemoryUserStore::new();
        store.upsert_user(1, Some("A"), None).await.unwrap();
        store.set_language(1, Language::Fa).await.unwrap();
        let record = store.upsert_user(1, Some("B"), Some("b")).await.unwrap();

        assert_eq!(store.count(), 1);
        assert_eq!(record.display_name.as_deref(), Some("B"));
        assert_eq!(record.language, Language::Fa);
    }

    #[tokio::test]
    async fn test_start_creates_record_and_sends_language_choice() {
        let h = Harness::new(InMemoryUserStore::new(), MockPanel::new());

        h.start().await;

        let user = h.store.user(42).unwrap();
        assert!(!user.is_registered);
        assert_eq!(user.panel_identity, None);
        assert_eq!(h.store.count(), 1);
        assert_eq!(
            h.transport.outbound(),
            vec![
                Outbound::Delete {
                    chat_id: 42,
                    message_id: 1
                },
                Outbound::Send {
                    chat_id: 42,
                    message_id: 100,
                    screen: h.rendered(&View::LanguageChoice, Language::En),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_restart_does_not_duplicate_or_reset() {
        let h = Harness::new(
            InMemoryUserStore::new().with_user(linked_record()),
            MockPanel::new(),
        );

        h.start().await;
        h.start().await;

        assert_eq!(h.store.count(), 1);
        assert!(h.store.user(42).unwrap().is_registered);
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_stop_start() {
        let h = Harness::new(InMemoryUserStore::new(), MockPanel::new());
        h.transport.fail_delete.store(true, Ordering::SeqCst);

        h.start().await;

        assert_eq!(
            h.transport.last_screen(),
            Some(h.rendered(&View::LanguageChoice, Language::En))
        );
    }

    #[tokio::test]
    async fn test_language_selection_edits_in_place() {
        let h = Harness::new(InMemoryUserStore::new(), MockPanel::new());
        h.start().await;
        h.transport.clear();

        h.press(Action::Lang(Language::Fa), 100).await;
        h.press(Action::Lang(Language::Fa), 100).await;

        assert_eq!(h.store.user(42).unwrap().language, Language::Fa);
        let outbound = h.transport.outbound();
        assert!(!outbound.iter().any(|o| matches!(o, Outbound::Send { .. })));
        assert_eq!(
            outbound[1],
            Outbound::Edit {
                chat_id: 42,
                message_id: 100,
                screen: h.rendered(
                    &View::AuthGate {
                        selected: Some(Language::Fa)
                    },
                    Language::Fa
                ),
            }
        );
    }

    #[tokio::test]
    async fn test_pending_language_used_without_record() {
        let h = Harness::new(InMemoryUserStore::new(), MockPanel::new());

        h.press(Action::Lang(Language::Fa), 5).await;
        assert_eq!(h.store.count(), 0);
        assert_eq!(
            h.runtime.scratch().get(42).pending_language,
            Some(Language::Fa)
        );

        h.press(Action::Auth(AuthAction::Login), 5).await;
        assert_eq!(
            h.transport.last_screen(),
            Some(h.rendered(&View::LoginNotFound, Language::Fa))
        );
    }

    #[tokio::test]
    async fn test_login_success_links_and_shows_menu() {
        let h = Harness::new(InMemoryUserStore::new(), MockPanel::new().with_user("uuid-1"));
        h.start().await;
        h.transport.clear();

        h.press(Action::Auth(AuthAction::Login), 100).await;

        let user = h.store.user(42).unwrap();
        assert!(user.is_registered);
        assert_eq!(user.panel_identity.as_deref(), Some("uuid-1"));
        assert_eq!(
            h.transport.screens(),
            vec![
                h.rendered(&View::LoginChecking, Language::En),
                h.rendered(&View::MainMenu { is_admin: false }, Language::En),
            ]
        );
        assert_eq!(h.panel.calls(), 1);
    }

    #[tokio::test]
    async fn test_login_not_found_leaves_record_untouched() {
        let h = Harness::new(InMemoryUserStore::new(), MockPanel::new());
        h.start().await;

        h.press(Action::Auth(AuthAction::Login), 100).await;

        let user = h.store.user(42).unwrap();
        assert!(!user.is_registered);
        assert_eq!(user.panel_identity, None);
        let screen = h.transport.last_screen().unwrap();
        assert_eq!(screen, h.rendered(&View::LoginNotFound, Language::En));
        assert_eq!(screen.actions(), vec![Action::Auth(AuthAction::Back)]);
    }

    #[tokio::test]
    async fn test_gated_screens_make_no_panel_calls() {
        let h = Harness::new(
            InMemoryUserStore::new().with_user(UserRecord::new(42, None, None)),
            MockPanel::new().with_user("uuid-1"),
        );

        for menu in [MenuAction::Stats, MenuAction::Account, MenuAction::Services] {
            h.press(Action::Menu(menu), 100).await;
            assert_eq!(
                h.transport.last_screen(),
                Some(h.rendered(&View::NotAuthorized, Language::En))
            );
        }
        assert_eq!(h.panel.calls(), 0);
    }

    #[tokio::test]
    async fn test_stats_loading_then_figures() {
        let stats = PanelStats {
            traffic_limit_bytes: Some(10_000_000_000),
            user_traffic: Some(crate::panel::UserTraffic {
                used_traffic_bytes: Some(2_500_000_000),
                online_at: None,
            }),
            ..PanelStats::default()
        };
        let h = Harness::new(
            InMemoryUserStore::new().with_user(linked_record()),
            MockPanel::new().with_stats(stats),
        );

        h.press(Action::Menu(MenuAction::Stats), 100).await;

        let screens = h.transport.screens();
        assert_eq!(screens.len(), 2);
        assert_eq!(screens[0], h.rendered(&View::StatsLoading, Language::En));
        assert!(screens[1].text.contains("10.0 GB"));
        assert!(screens[1].text.contains("2.5 GB"));
        assert!(screens[1].text.contains("7.5 GB"));
    }

    #[tokio::test]
    async fn test_absent_stats_render_no_data() {
        let h = Harness::new(
            InMemoryUserStore::new().with_user(linked_record()),
            MockPanel::new(),
        );

        h.press(Action::Menu(MenuAction::Stats), 100).await;

        assert_eq!(
            h.transport.last_screen(),
            Some(h.rendered(&View::NoData, Language::En))
        );
    }

    #[tokio::test]
    async fn test_empty_services_render_none_found() {
        let h = Harness::new(
            InMemoryUserStore::new().with_user(linked_record()),
            MockPanel::new().with_services(vec![]),
        );

        h.press(Action::Menu(MenuAction::Services), 100).await;

        assert_eq!(
            h.transport.last_screen(),
            Some(h.rendered(&View::Services(vec![]), Language::En))
        );
    }

    #[tokio::test]
    async fn test_new_service_request_is_forwarded() {
        let h = Harness::new(
            InMemoryUserStore::new().with_user(UserRecord::new(42, Some("Ann"), Some("ann"))),
            MockPanel::new(),
        );

        h.press(Action::Auth(AuthAction::NewService), 100).await;
        assert!(h.runtime.scratch().get(42).awaiting_description);
        assert_eq!(h.runtime.scratch().get(42).anchor_message_id, Some(100));

        h.say("Two devices, three months", 101).await;

        let posts = h.transport.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].contains("@ann"));
        assert!(posts[0].contains("Two devices, three months"));
        assert!(h.transport.outbound().contains(&Outbound::Delete {
            chat_id: 42,
            message_id: 101
        }));
        assert_eq!(
            h.transport.outbound().last(),
            Some(&Outbound::Edit {
                chat_id: 42,
                message_id: 100,
                screen: h.rendered(&View::ServiceSent, Language::En),
            })
        );
        assert!(!h.runtime.scratch().get(42).awaiting_description);
    }

    #[tokio::test]
    async fn test_forward_failure_still_clears_awaiting() {
        let h = Harness::new(
            InMemoryUserStore::new().with_user(UserRecord::new(42, None, None)),
            MockPanel::new(),
        );
        h.transport.fail_post.store(true, Ordering::SeqCst);
        h.transport.fail_edit.store(true, Ordering::SeqCst);

        h.press(Action::Auth(AuthAction::NewService), 100).await;
        h.say("please", 101).await;

        assert!(!h.runtime.scratch().get(42).awaiting_description);
        assert!(h.transport.posts().is_empty());

        // A later message is ordinary text again
        h.transport.clear();
        h.say("hello?", 102).await;
        assert!(h.transport.outbound().is_empty());
    }

    #[tokio::test]
    async fn test_other_action_cancels_awaiting() {
        let h = Harness::new(
            InMemoryUserStore::new().with_user(UserRecord::new(42, None, None)),
            MockPanel::new(),
        );

        h.press(Action::Auth(AuthAction::NewService), 100).await;
        h.press(Action::Auth(AuthAction::Back), 100).await;
        h.transport.clear();
        h.say("late description", 103).await;

        assert!(h.transport.posts().is_empty());
        assert!(h.transport.outbound().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_missing_record() {
        let h = Harness::new(
            InMemoryUserStore::new().with_user(linked_record()),
            MockPanel::new(),
        );
        h.store.fail.store(true, Ordering::SeqCst);

        h.press(Action::Menu(MenuAction::Stats), 100).await;

        assert_eq!(
            h.transport.last_screen(),
            Some(h.rendered(&View::NotAuthorized, Language::En))
        );
        assert_eq!(h.panel.calls(), 0);
    }

    #[tokio::test]
    async fn test_admin_panel_button_opens_panel_url() {
        let mut h = Harness::new(InMemoryUserStore::new(), MockPanel::new());
        h.principal.external_id = 1;

        h.press(Action::Menu(MenuAction::Panel), 100).await;

        let screen = h.transport.last_screen().unwrap();
        assert_eq!(
            screen.rows[0][0].target,
            ButtonTarget::Url("https://panel.example".into())
        );
    }

    #[tokio::test]
    async fn test_inaccessible_message_falls_back_to_send() {
        let h = Harness::new(InMemoryUserStore::new(), MockPanel::new());

        h.runtime
            .handle(
                &h.principal,
                Event::Action {
                    action: Action::Menu(MenuAction::Tutorial),
                    callback_id: "cb".into(),
                    message_id: None,
                },
            )
            .await;

        assert!(matches!(
            h.transport.outbound().last(),
            Some(Outbound::Send { .. })
        ));
    }
}
