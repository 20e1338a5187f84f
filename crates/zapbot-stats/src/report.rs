//! Chat-ready report text built from a [`GroupStats`].
//!
//! Reports use WhatsApp markdown and Brazilian Portuguese formatting
//! (`dd/mm/yyyy` dates, `.` as thousands separator). Rankings sort by
//! count descending; equal counts fall back to key order.

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::collections::HashMap;

use crate::model::{GroupStats, UserStats};

pub const NO_GROUP_DATA: &str = "❌ Nenhuma estatística disponível para este grupo.";
pub const NO_USER_DATA: &str = "❌ Usuário não encontrado nas estatísticas.";
pub const NO_DATA: &str = "❌ Nenhuma estatística disponível.";

const GENERAL_TOP_USERS: usize = 5;
const GENERAL_TOP_WORDS: usize = 10;
const RANKING_SIZE: usize = 10;
const ACTIVITY_TOP_HOURS: usize = 5;
const ACTIVITY_RECENT_DAYS: usize = 7;
const ACTIVITY_TOP_EMOJIS: usize = 8;
const WORDS_TOP: usize = 20;

/// `1234567` → `1.234.567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Local calendar date as `dd/mm/yyyy`.
pub fn local_date(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

/// `YYYY-MM-DD` day key as `dd/mm/yyyy`; unknown shapes pass through.
fn day_label(day: &str) -> String {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| day.to_string())
}

/// Users sorted by message count, most active first.
pub fn users_by_activity(stats: &GroupStats) -> Vec<(&str, &UserStats)> {
    let mut users: Vec<(&str, &UserStats)> = stats
        .users
        .iter()
        .map(|(id, user)| (id.as_str(), user))
        .collect();
    users.sort_by(|a, b| {
        b.1.message_count
            .cmp(&a.1.message_count)
            .then_with(|| a.0.cmp(b.0))
    });
    users
}

/// The `limit` largest counters of a map.
pub fn top_counts(counts: &HashMap<String, u64>, limit: usize) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(limit);
    entries
}

/// Hour with the most messages; the earliest hour wins ties.
pub fn peak_hour(stats: &GroupStats) -> usize {
    let max = stats.messages_by_hour.iter().copied().max().unwrap_or(0);
    stats
        .messages_by_hour
        .iter()
        .position(|&count| count == max)
        .unwrap_or(0)
}

/// Hours ordered by message count, busiest first.
fn busiest_hours(stats: &GroupStats, limit: usize) -> Vec<(usize, u64)> {
    let mut hours: Vec<(usize, u64)> = stats.messages_by_hour.iter().copied().enumerate().collect();
    hours.sort_by(|a, b| b.1.cmp(&a.1));
    hours.truncate(limit);
    hours
}

/// The most recent days present in the histogram, newest first.
fn recent_days(stats: &GroupStats, limit: usize) -> Vec<(&str, u64)> {
    let mut days: Vec<(&str, u64)> = stats
        .messages_by_day
        .iter()
        .map(|(day, count)| (day.as_str(), *count))
        .collect();
    days.sort_by(|a, b| b.0.cmp(a.0));
    days.truncate(limit);
    days
}

pub(crate) fn general(stats: &GroupStats) -> String {
    let top_users = users_by_activity(stats)
        .into_iter()
        .take(GENERAL_TOP_USERS)
        .enumerate()
        .map(|(i, (_, user))| format!("{}. {}: {} msgs", i + 1, user.name, user.message_count))
        .collect::<Vec<_>>()
        .join("\n");

    let top_words = top_counts(&stats.word_frequency, GENERAL_TOP_WORDS)
        .into_iter()
        .enumerate()
        .map(|(i, (word, count))| format!("{}. \"{word}\": {count}x", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📊 *ESTATÍSTICAS GERAIS - {name}*\n\n\
         👥 *Participantes:* {participants}\n\
         💬 *Total de mensagens:* {messages}\n\
         📝 *Total de palavras:* {words}\n\
         📅 *Criado em:* {created}\n\n\
         🏆 *TOP 5 MAIS ATIVOS:*\n{top_users}\n\n\
         🔥 *PALAVRAS MAIS USADAS:*\n{top_words}\n\n\
         ⏰ *Horário mais ativo:* {hour}:00h\n\
         📈 *Última atividade:* {last}",
        name = stats.group_name,
        participants = stats.total_participants,
        messages = thousands(stats.total_messages),
        words = thousands(stats.total_words),
        created = local_date(&stats.created_at),
        hour = peak_hour(stats),
        last = local_date(&stats.last_activity),
    )
}

pub(crate) fn user(stats: &GroupStats, user_id: &str) -> String {
    let Some(user) = stats.users.get(user_id) else {
        return NO_USER_DATA.to_string();
    };

    let rank = users_by_activity(stats)
        .iter()
        .position(|(id, _)| *id == user_id)
        .map(|i| i + 1)
        .unwrap_or(0);

    let per_day = if user.active_days() > 0 {
        format!("{:.1}", user.messages_per_day())
    } else {
        "0".to_string()
    };

    format!(
        "👤 *ESTATÍSTICAS - {name}*\n\n\
         🏆 *Ranking:* {rank}º lugar\n\
         💬 *Mensagens enviadas:* {messages}\n\
         📝 *Palavras escritas:* {words}\n\
         📏 *Tamanho médio:* {avg:.1} caracteres\n\
         📊 *Média diária:* {per_day} mensagens\n\
         📅 *Última atividade:* {last}\n\
         📈 *Ativo há:* {days} dias",
        name = user.name,
        messages = thousands(user.message_count),
        words = thousands(user.word_count),
        avg = user.average_message_length(),
        last = local_date(&user.last_activity),
        days = user.active_days(),
    )
}

fn medal(position: usize) -> String {
    match position {
        0 => "🥇".to_string(),
        1 => "🥈".to_string(),
        2 => "🥉".to_string(),
        n => format!("{}º", n + 1),
    }
}

/// Share of `part` in `total` as a percentage with one decimal.
pub fn share(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", part as f64 / total as f64 * 100.0)
}

pub(crate) fn ranking(stats: &GroupStats) -> String {
    let mut out = String::from("🏆 *RANKING DOS MAIS ATIVOS*\n\n");
    for (i, (_, user)) in users_by_activity(stats)
        .into_iter()
        .take(RANKING_SIZE)
        .enumerate()
    {
        out.push_str(&format!(
            "{} *{}*\n   📊 {} msgs ({}%)\n   📝 {} palavras\n\n",
            medal(i),
            user.name,
            user.message_count,
            share(user.message_count, stats.total_messages),
            user.word_count,
        ));
    }
    out
}

pub(crate) fn activity(stats: &GroupStats) -> String {
    let hours = busiest_hours(stats, ACTIVITY_TOP_HOURS)
        .into_iter()
        .map(|(hour, count)| format!("{hour}:00h - {count} msgs"))
        .collect::<Vec<_>>()
        .join("\n");

    let days = recent_days(stats, ACTIVITY_RECENT_DAYS)
        .into_iter()
        .map(|(day, count)| format!("{} - {count} msgs", day_label(day)))
        .collect::<Vec<_>>()
        .join("\n");

    let emojis = top_counts(&stats.top_emojis, ACTIVITY_TOP_EMOJIS)
        .into_iter()
        .map(|(emoji, count)| format!("{emoji} {count}x"))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "📈 *ATIVIDADE DO GRUPO*\n\n\
         ⏰ *HORÁRIOS MAIS ATIVOS:*\n{hours}\n\n\
         📅 *ÚLTIMOS 7 DIAS:*\n{days}\n\n\
         😊 *EMOJIS FAVORITOS:*\n{emojis}"
    )
}

pub(crate) fn words(stats: &GroupStats) -> String {
    let top = top_counts(&stats.word_frequency, WORDS_TOP)
        .into_iter()
        .enumerate()
        .map(|(i, (word, count))| format!("{}. *{word}* - {count} vezes", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📝 *PALAVRAS MAIS USADAS*\n\n{top}\n\n📊 Total de palavras únicas: {}",
        stats.word_frequency.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1.000");
        assert_eq!(thousands(1234567), "1.234.567");
    }

    #[test]
    fn test_share_one_decimal() {
        assert_eq!(share(8, 10), "80.0");
        assert_eq!(share(1, 3), "33.3");
        assert_eq!(share(2, 3), "66.7");
        assert_eq!(share(5, 0), "0.0");
    }

    #[test]
    fn test_day_label() {
        assert_eq!(day_label("2024-06-03"), "03/06/2024");
        assert_eq!(day_label("garbage"), "garbage");
    }

    #[test]
    fn test_peak_hour_first_max() {
        let mut g = GroupStats::new("g", ts(1, 0));
        assert_eq!(peak_hour(&g), 0);
        g.messages_by_hour[7] = 4;
        g.messages_by_hour[19] = 4;
        g.messages_by_hour[12] = 2;
        assert_eq!(peak_hour(&g), 7);
    }

    #[test]
    fn test_top_counts_ties_by_key() {
        let counts: HashMap<String, u64> = [("zeta", 2), ("alfa", 2), ("beta", 5), ("gama", 1)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(
            top_counts(&counts, 3),
            vec![("beta", 5), ("alfa", 2), ("zeta", 2)]
        );
    }

    #[test]
    fn test_recent_days_newest_first_limited() {
        let mut g = GroupStats::new("g", ts(1, 0));
        for d in 1..=9 {
            g.messages_by_day.insert(format!("2024-06-{d:02}"), d as u64);
        }
        let days = recent_days(&g, 7);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], ("2024-06-09", 9));
        assert_eq!(days[6], ("2024-06-03", 3));
    }

    #[test]
    fn test_busiest_hours_ties_keep_hour_order() {
        let mut g = GroupStats::new("g", ts(1, 0));
        g.messages_by_hour[20] = 3;
        g.messages_by_hour[9] = 3;
        g.messages_by_hour[14] = 5;
        let hours = busiest_hours(&g, 3);
        assert_eq!(hours, vec![(14, 5), (9, 3), (20, 3)]);
    }

    #[test]
    fn test_words_report_lists_and_counts() {
        let mut g = GroupStats::new("g", ts(1, 0));
        g.word_frequency.insert("futebol".into(), 4);
        g.word_frequency.insert("churrasco".into(), 2);
        let text = words(&g);
        assert!(text.contains("1. *futebol* - 4 vezes"));
        assert!(text.contains("2. *churrasco* - 2 vezes"));
        assert!(text.ends_with("Total de palavras únicas: 2"));
    }

    #[test]
    fn test_activity_report_sections() {
        let mut g = GroupStats::new("g", ts(1, 0));
        g.messages_by_hour[21] = 6;
        g.messages_by_day.insert("2024-06-02".into(), 6);
        g.top_emojis.insert("😂".into(), 3);
        g.top_emojis.insert("🔥".into(), 1);
        let text = activity(&g);
        assert!(text.contains("21:00h - 6 msgs"));
        assert!(text.contains("02/06/2024 - 6 msgs"));
        assert!(text.contains("😂 3x 🔥 1x"));
    }
}
