//! Prompt construction from an `AnalysisReport`.


use serde::{Deserialize, Serialize};
use siglab_core::CrossDirection;

use crate::analysis::AnalysisReport;

const SYSTEM_PROMPT: &str = "你是一个资深A股技术分析师";

/// One chat message in OpenAI wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// System + user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

impl ChatPrompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "N/A".to_string())
}

/// Build the commentary prompt: latest indicators, held signals with their
/// explanations, the backtest summary when present, and recent closes.
pub fn build_prompt(report: &AnalysisReport) -> ChatPrompt {
    let snap = &report.snapshot;
    let mut user = String::with_capacity(1024);

    user.push_str(&format!(
        "请分析股票「{}」截至 {} 的技术面情况。\n",
        report.symbol, report.date
    ));
    user.push_str(&format!("当前价格：{:.2}\n", report.close));
    for (window, value) in &snap.ma {
        user.push_str(&format!("MA{window}：{}\n", opt(*value)));
    }
    user.push_str(&format!(
        "MACD：DIF {}，DEA {}，柱 {}\n",
        opt(snap.dif),
        opt(snap.dea),
        opt(snap.macd_hist)
    ));
    user.push_str(&format!("RSI：{}\n", opt(snap.rsi)));

    let held: Vec<_> = report.held_signals().collect();
    if held.is_empty() {
        user.push_str("当日触发信号：无\n");
    } else {
        user.push_str("当日触发信号：\n");
        for s in held {
            user.push_str(&format!("- {}（{}）：{}\n", s.kind.label(), s.name, s.explanation));
        }
    }

    if let Some(bt) = &report.backtest {
        user.push_str(&format!(
            "历史回测（{}，最近 {} 根K线，持有 {} 天）：\n",
            bt.signal.label(),
            bt.usable_bars,
            bt.holding_days
        ));
        for dir in CrossDirection::ALL {
            let s = bt.summary_for(dir);
            user.push_str(&format!(
                "- {}：{} 次，胜率 {}，平均收益 {:.2}%\n",
                dir.label(),
                s.occurrence_count,
                s.win_rate_pct(),
                s.mean_return * 100.0
            ));
        }
    }

    if !report.recent_closes.is_empty() {
        user.push_str(&format!("近{}日收盘价：\n", report.recent_closes.len()));
        let closes: Vec<String> = report
            .recent_closes
            .iter()
            .map(|c| format!("{} {:.2}", c.date, c.close))
            .collect();
        user.push_str(&closes.join("，"));
        user.push('\n');
    }

    user.push_str("\n请判断当前是否适合买入、卖出或观望，并用简洁语言给出理由（包括技术指标支撑）。");

    ChatPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}
