//! Terminal formatting for metrics and positions.

use tradebook_core::CompletedPosition;
use tradebook_runner::{BacktestMetrics, TradeMetricsExtended};

/// `$1,234.56`, `-$1,234.56`. Infinite values render as `∞`.
pub fn format_currency(value: f64, decimals: usize) -> String {
    if let Some(s) = non_finite(value) {
        return s;
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(value.abs(), decimals))
}

/// `12.34%`. Infinite values render as `∞`.
pub fn format_percentage(value: f64, decimals: usize) -> String {
    if let Some(s) = non_finite(value) {
        return s;
    }
    format!("{value:.decimals$}%")
}

fn non_finite(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("n/a".to_string())
    } else if value.is_infinite() {
        Some(if value > 0.0 { "∞" } else { "-∞" }.to_string())
    } else {
        None
    }
}

/// en-US digit grouping of a non-negative value.
fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}

fn ratio(value: f64) -> String {
    if value.is_infinite() {
        "∞".to_string()
    } else {
        format!("{value:.2}")
    }
}

pub fn print_metrics(m: &TradeMetricsExtended) {
    let b = &m.base;
    println!("Trades");
    println!("  Total:            {}", b.total_trades);
    println!("  Winning / losing: {} / {}", b.winning_trades, b.losing_trades);
    println!("  Win rate:         {}", format_percentage(b.win_rate, 2));
    println!("  Open positions:   {}", m.open_positions_count);
    println!();
    println!("PnL");
    println!(
        "  Total:            {} ({})",
        format_currency(b.total_pnl, 2),
        format_percentage(b.total_pnl_percentage, 2)
    );
    println!("  Average:          {}", format_currency(b.average_pnl, 2));
    println!("  Average win:      {}", format_currency(b.average_win, 2));
    println!("  Average loss:     {}", format_currency(b.average_loss, 2));
    println!(
        "  Best / worst:     {} / {}",
        format_currency(b.best_trade, 2),
        format_currency(b.worst_trade, 2)
    );
    println!("  Profit factor:    {}", ratio(b.profit_factor));
    println!("  Expectancy:       {}", format_currency(b.expectancy, 2));
    println!();
    println!("Risk");
    println!("  Sharpe:           {}", ratio(b.sharpe_ratio));
    println!("  Sortino:          {}", ratio(b.sortino_ratio));
    println!(
        "  Max drawdown:     {} ({})",
        format_currency(b.max_drawdown, 2),
        format_percentage(b.max_drawdown_percentage, 2)
    );
    println!("  Avg drawdown:     {}", format_currency(b.average_drawdown, 2));
    println!("  Avg risk/reward:  {}", ratio(m.average_risk_reward));
    println!();
    println!("Exits");
    println!(
        "  TP hit:           {} (win {})",
        format_percentage(m.tp_hit_rate, 1),
        format_percentage(m.win_rate_tp_hit, 1)
    );
    println!(
        "  SL hit:           {} (win {})",
        format_percentage(m.sl_hit_rate, 1),
        format_percentage(m.win_rate_sl_hit, 1)
    );
    println!(
        "  Manual:           {} (win {})",
        format_percentage(m.manual_close_rate, 1),
        format_percentage(m.win_rate_manual, 1)
    );
    println!();
    println!("Direction");
    println!(
        "  Long:             {} (win {})",
        m.long_positions,
        format_percentage(m.long_win_rate, 1)
    );
    println!(
        "  Short:            {} (win {})",
        m.short_positions,
        format_percentage(m.short_win_rate, 1)
    );
    println!();
    println!("Duration (hours)");
    println!(
        "  All / win / loss: {:.1} / {:.1} / {:.1}",
        m.average_trade_duration_hours,
        m.average_win_duration_hours,
        m.average_loss_duration_hours
    );
}

pub fn print_backtest_table(results: &[BacktestMetrics]) {
    println!(
        "{:<16} {:>8} {:>7} {:>9} {:>14} {:>8} {:>12}",
        "Backtest", "Actions", "Trades", "Win %", "PnL", "PF", "Max DD %"
    );
    println!("{}", "-".repeat(80));
    for r in results {
        let name = r
            .backtest_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "(none)".to_string());
        let b = &r.metrics.base;
        println!(
            "{:<16} {:>8} {:>7} {:>9} {:>14} {:>8} {:>12}",
            name,
            r.action_count,
            b.total_trades,
            format_percentage(b.win_rate, 1),
            format_currency(b.total_pnl, 2),
            ratio(b.profit_factor),
            format_percentage(b.max_drawdown_percentage, 2),
        );
    }
}

pub fn print_positions(positions: &[CompletedPosition], unmatched: usize) {
    println!(
        "{:<10} {:<6} {:<20} {:>12} {:>12} {:>12} {:>9} {:<8} {:<10}",
        "Entry", "Side", "Opened", "Entry px", "Exit px", "PnL", "PnL %", "Reason", "Confidence"
    );
    println!("{}", "-".repeat(108));
    for p in positions {
        let exit = p
            .exit_price()
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<6} {:<20} {:>12.4} {:>12} {:>12} {:>9} {:<8} {:<10}",
            p.entry_action.id.to_string(),
            p.direction.to_string(),
            p.entry_date.format("%Y-%m-%d %H:%M").to_string(),
            p.entry_action.price,
            exit,
            format_currency(p.pnl, 2),
            format_percentage(p.pnl_percentage, 2),
            p.close_reason.kind.as_str(),
            p.close_reason.confidence.as_str(),
        );
    }
    if unmatched > 0 {
        println!();
        println!("{unmatched} close action(s) could not be matched to an entry");
    }
}
