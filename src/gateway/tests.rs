use super::pipeline::{AI_ERROR, AI_QUOTA, THINKING};
use super::*;
use crate::commands;
use async_trait::async_trait;
use std::sync::Mutex;
use zapbot_core::{context::Context, error::ZapError};
use zapbot_stats::SnapshotStore;

const GROUP: &str = "120363@g.us";
const ANA: &str = "5511999887766@c.us";

/// Provider answering with a fixed reply and recording every request.
struct MockProvider {
    reply: Result<String, fn(String) -> ZapError>,
    seen: Arc<Mutex<Vec<Context>>>,
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn complete(&self, context: &Context) -> Result<OutgoingMessage, ZapError> {
        self.seen.lock().unwrap().push(context.clone());
        match &self.reply {
            Ok(text) => Ok(OutgoingMessage {
                text: text.clone(),
                ..Default::default()
            }),
            Err(make) => Err(make("boom".into())),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Channel recording sent messages.
struct MockChannel {
    sent: Arc<Mutex<Vec<OutgoingMessage>>>,
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, ZapError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), ZapError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ZapError> {
        Ok(())
    }
}

struct Harness {
    gw: Gateway,
    sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    seen: Arc<Mutex<Vec<Context>>>,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }

    fn last(&self) -> OutgoingMessage {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }
}

fn harness_with(reply: Result<String, fn(String) -> ZapError>, config: Config) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
    channels.insert(
        "mock".into(),
        Arc::new(MockChannel {
            sent: Arc::clone(&sent),
        }),
    );
    let provider = Arc::new(MockProvider {
        reply,
        seen: Arc::clone(&seen),
    });
    let stats = StatsEngine::new(SnapshotStore::new(dir.path()), 0);

    Harness {
        gw: Gateway::new(provider, channels, stats, &config, ApiState::default()),
        sent,
        seen,
        _dir: dir,
    }
}

fn harness() -> Harness {
    harness_with(Ok("Salvador.".into()), Config::default())
}

fn group_msg(text: &str) -> IncomingMessage {
    let mut msg = IncomingMessage::new("mock", GROUP, ANA, text);
    msg.sender_name = Some("Ana".into());
    msg.group_name = Some("Família".into());
    msg
}

fn direct_msg(text: &str) -> IncomingMessage {
    IncomingMessage::new("mock", ANA, ANA, text)
}

#[tokio::test]
async fn test_ping_replies_pong() {
    let h = harness();
    h.gw.handle_message(direct_msg("!ping")).await;
    assert_eq!(h.texts(), vec!["pong"]);
    assert_eq!(h.last().reply_target.as_deref(), Some(ANA));
}

#[tokio::test]
async fn test_plain_text_is_ignored() {
    let h = harness();
    h.gw.handle_message(direct_msg("bom dia")).await;
    assert!(h.texts().is_empty());
    assert_eq!(h.gw.stats.group_count(), 0);
}

#[tokio::test]
async fn test_group_messages_feed_stats_commands_do_not() {
    let h = harness();
    h.gw.handle_message(group_msg("oi pessoal")).await;
    h.gw.handle_message(group_msg("   ")).await;
    h.gw.handle_message(group_msg("!ping")).await;

    let g = h.gw.stats.snapshot(GROUP).unwrap();
    assert_eq!(g.total_messages, 1);
    assert_eq!(g.group_name, "Família");
    assert_eq!(g.users[ANA].name, "Ana");
}

#[tokio::test]
async fn test_indented_commands_are_answered_but_not_counted() {
    let h = harness();
    h.gw.handle_message(group_msg("oi pessoal")).await;
    h.gw.handle_message(group_msg("  /bot qual a capital?")).await;
    h.gw.handle_message(group_msg(" /stats ranking")).await;

    let texts = h.texts();
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[0], THINKING);
    assert!(texts[1].ends_with("Salvador."));
    assert!(texts[2].contains("1 msgs (100.0%)"));

    let g = h.gw.stats.snapshot(GROUP).unwrap();
    assert_eq!(g.total_messages, 1);
    assert_eq!(g.total_words, 2);
    assert_eq!(g.word_frequency.len(), 1);
    assert_eq!(g.word_frequency.get("pessoal"), Some(&1));
}

#[tokio::test]
async fn test_stats_name_falls_back_to_number() {
    let h = harness();
    let mut msg = group_msg("oi");
    msg.sender_name = None;
    msg.group_name = None;
    h.gw.handle_message(msg).await;

    let g = h.gw.stats.snapshot(GROUP).unwrap();
    assert_eq!(g.users[ANA].name, "5511999887766");
    assert_eq!(g.group_name, GROUP);
}

#[tokio::test]
async fn test_stats_command_in_direct_chat() {
    let h = harness();
    h.gw.handle_message(direct_msg("/stats")).await;
    assert_eq!(h.texts(), vec![commands::STATS_GROUP_ONLY]);
}

#[tokio::test]
async fn test_stats_ranking_in_group() {
    let h = harness();
    h.gw.handle_message(group_msg("oi gente")).await;
    h.gw.handle_message(group_msg("/stats ranking")).await;
    let reply = h.last().text;
    assert!(reply.contains("🥇 *Ana*"));
    assert!(reply.contains("(100.0%)"));
}

#[tokio::test]
async fn test_bot_without_query() {
    let h = harness();
    h.gw.handle_message(direct_msg("/bot")).await;
    assert_eq!(h.texts(), vec![commands::BOT_USAGE]);
    assert!(h.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bot_in_group_mentions_author() {
    let h = harness();
    h.gw.handle_message(group_msg("/bot qual a capital da Bahia?")).await;

    assert_eq!(
        h.texts(),
        vec![THINKING.to_string(), "@5511999887766 Salvador.".to_string()]
    );
    assert_eq!(h.last().mentions, vec![ANA.to_string()]);
    assert_eq!(h.last().reply_target.as_deref(), Some(GROUP));
    assert_eq!(h.seen.lock().unwrap()[0].current_message, "qual a capital da Bahia?");
}

#[tokio::test]
async fn test_bot_direct_reply_has_no_mention() {
    let h = harness();
    h.gw.handle_message(direct_msg("/bot oi")).await;
    assert_eq!(h.last().text, "Salvador.");
    assert!(h.last().mentions.is_empty());
}

#[tokio::test]
async fn test_bot_builds_on_chat_context() {
    let h = harness();
    h.gw.handle_message(group_msg("/bot primeira")).await;
    h.gw.handle_message(group_msg("/bot segunda")).await;

    let seen = h.seen.lock().unwrap();
    assert!(seen[0].history.is_empty());
    assert_eq!(
        seen[1].history,
        vec!["Usuário: primeira".to_string(), "Bot: Salvador.".to_string()]
    );
    drop(seen);

    h.gw.handle_message(group_msg("/limpar")).await;
    assert!(h.gw.context.get_context(GROUP).is_empty());
}

#[tokio::test]
async fn test_bot_blocked_user() {
    let mut config = Config::default();
    config.limits.blocked_users = vec![ANA.into()];
    let h = harness_with(Ok("x".into()), config);

    h.gw.handle_message(group_msg("/bot oi")).await;
    assert_eq!(h.texts(), vec!["❌ Usuário bloqueado."]);
    assert!(h.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bot_chat_not_allowed() {
    let mut config = Config::default();
    config.limits.allowed_chats = vec!["outro@g.us".into()];
    let h = harness_with(Ok("x".into()), config);

    h.gw.handle_message(group_msg("/bot oi")).await;
    assert_eq!(h.texts(), vec!["❌ Chat não autorizado."]);
}

#[tokio::test]
async fn test_bot_rate_limited_on_sixth_call() {
    let h = harness();
    for _ in 0..5 {
        h.gw.handle_message(direct_msg("/bot oi")).await;
    }
    assert_eq!(h.seen.lock().unwrap().len(), 5);

    h.gw.handle_message(direct_msg("/bot oi")).await;
    assert_eq!(h.seen.lock().unwrap().len(), 5);
    let reply = h.last().text;
    assert!(reply.starts_with("⏳ Muitos comandos! Aguarde "));
}

#[tokio::test]
async fn test_provider_errors_map_to_user_text() {
    let h = harness_with(Err(ZapError::Provider), Config::default());
    h.gw.handle_message(direct_msg("/bot oi")).await;
    assert_eq!(h.last().text, AI_ERROR);
    assert!(h.gw.context.get_context(ANA).is_empty());

    let h = harness_with(Err(ZapError::RateLimited), Config::default());
    h.gw.handle_message(direct_msg("/bot oi")).await;
    assert_eq!(h.last().text, AI_QUOTA);
}
