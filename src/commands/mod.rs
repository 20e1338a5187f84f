//! Built-in chat commands: instant responses, no provider call.


use zapbot_core::context::ContextTracker;
use zapbot_stats::StatsEngine;

pub const PONG: &str = "pong";
pub const CONTEXT_CLEARED: &str = "🧹 Contexto da conversa limpo!";
pub const STATS_GROUP_ONLY: &str = "📊 Este comando só funciona em grupos!";
pub const BOT_USAGE: &str = "❌ Por favor, forneça um comando válido após /bot.";

pub const HELP: &str = "🤖 *COMANDOS DISPONÍVEIS*

!ping - Verifica se o bot está online
/bot *pergunta* - Pergunta algo para a IA
/limpar - Limpa o contexto da conversa
/stats - Estatísticas do grupo
/help ou /ajuda - Mostra esta mensagem

Exemplo: `/bot qual a capital da Bahia?`";

pub const STATS_HELP: &str = "📊 *COMANDOS DE ESTATÍSTICAS*

/stats *geral* - Estatísticas gerais
/stats *ranking* - Top 10 mais ativos
/stats *atividade* - Atividade por horário
/stats *palavras* - Palavras mais usadas
/stats *meu* - Suas estatísticas

Exemplo: `/stats ranking`";

/// What a chat command needs to run.
pub struct CommandContext<'a> {
    pub stats: &'a StatsEngine,
    pub context: &'a ContextTracker,
    pub chat_id: &'a str,
    pub sender_id: &'a str,
    pub is_group: bool,
}

/// Report requested by `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsQuery {
    General,
    Ranking,
    Activity,
    Words,
    Mine,
    /// Unknown sub-command: answer with the listing.
    Help,
}

impl StatsQuery {
    /// Parse a sub-command keyword. A missing keyword means `geral`.
    pub fn parse(keyword: Option<&str>) -> Self {
        match keyword.map(str::to_lowercase).as_deref() {
            None | Some("geral") => Self::General,
            Some("ranking") => Self::Ranking,
            Some("atividade") => Self::Activity,
            Some("palavras") => Self::Words,
            Some("meu") => Self::Mine,
            Some(_) => Self::Help,
        }
    }
}

/// Known instant commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Help,
    Clear,
    Stats(StatsQuery),
}

impl Command {
    /// Parse a command from trimmed message text. `/bot` is not an instant
    /// command; see [`parse_bot_query`].
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "!ping" => return Some(Self::Ping),
            "/limpar" => return Some(Self::Clear),
            "/help" | "/ajuda" => return Some(Self::Help),
            _ => {}
        }

        let mut words = text.split_whitespace();
        match words.next()? {
            "/stats" => Some(Self::Stats(StatsQuery::parse(words.next()))),
            _ => None,
        }
    }
}

/// The query of a `/bot` command, trimmed. `Some("")` for a bare `/bot`.
pub fn parse_bot_query(text: &str) -> Option<&str> {
    if text == "/bot" {
        return Some("");
    }
    text.strip_prefix("/bot")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim)
}

/// Handle an instant command and return the reply text.
pub fn handle(cmd: Command, ctx: &CommandContext<'_>) -> String {
    match cmd {
        Command::Ping => PONG.to_string(),
        Command::Help => HELP.to_string(),
        Command::Clear => {
            ctx.context.clear_context(ctx.chat_id);
            CONTEXT_CLEARED.to_string()
        }
        Command::Stats(query) => handle_stats(query, ctx),
    }
}

fn handle_stats(query: StatsQuery, ctx: &CommandContext<'_>) -> String {
    if !ctx.is_group {
        return STATS_GROUP_ONLY.to_string();
    }
    let group = ctx.chat_id;
    match query {
        StatsQuery::General => ctx.stats.general_report(group),
        StatsQuery::Ranking => ctx.stats.ranking_report(group),
        StatsQuery::Activity => ctx.stats.activity_report(group),
        StatsQuery::Words => ctx.stats.word_report(group),
        StatsQuery::Mine => ctx.stats.user_report(group, ctx.sender_id),
        StatsQuery::Help => STATS_HELP.to_string(),
    }
}
