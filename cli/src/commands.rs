use chrono::offset;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::context::CliContext;
use crate::reader;

pub async fn parse_file(path: &str, ctx: &CliContext) {
    let parser = ctx.parser();
    match reader::replay_file(Path::new(path), &parser).await {
        Ok(summary) => println!(
            "parsed {} lines ({} signals) in {}ms",
            summary.lines, summary.signals, summary.elapsed_ms
        ),
        Err(err) => println!("parse failed: {err}"),
    }
}

pub async fn tail(path: &str, ctx: &CliContext) {
    ctx.stop_tail().await;

    println!("Tailing {path}");
    let parser = ctx.parser();
    let path_buf = PathBuf::from(path);
    let handle = tokio::spawn(async move {
        if let Err(err) = reader::tail_file(path_buf, parser).await {
            tracing::error!(%err, "tail stopped");
        }
    });
    *ctx.tail_task.lock().await = Some(handle);
}

pub async fn set_file(path: &str, ctx: &CliContext) {
    let file_path = PathBuf::from(path);
    if !file_path.is_file() {
        println!("Update failed. Invalid file name given.");
        return;
    }
    {
        let mut settings = ctx.settings.write().await;
        settings.log_path = Some(file_path);
        settings.save();
    }
    tail(path, ctx).await;
}

/// Pins a participant to a scoreboard position. Position 1 also marks
/// the participant as opening the fight.
pub async fn set_order(name: &str, position: u32, ctx: &CliContext) {
    let parser = ctx.parser();
    let mut parser = parser.lock().await;
    match parser.roster_mut().get_mut(name) {
        Some(record) => {
            record.manual_order = Some(position);
            record.is_first = position == 1;
            println!("{} pinned to position {}", record.name, position);
        }
        None => println!("No participant named {name}"),
    }
}

pub async fn show_settings(ctx: &CliContext) {
    let settings = ctx.settings.read().await;
    let log_path = settings
        .log_path
        .as_deref()
        .map_or("(unset)".to_string(), |p| p.display().to_string());
    let sink = settings
        .diagnostic_sink
        .as_deref()
        .map_or("(unset)".to_string(), |p| p.display().to_string());
    println!("log file:        {log_path}");
    println!("diagnostic sink: {sink}");
}

pub async fn show_stats(ctx: &CliContext) {
    let parser = ctx.parser();
    let parser = parser.lock().await;

    println!(
        "combat: {:?} (as of {})",
        parser.state(),
        offset::Local::now().format("%H:%M:%S")
    );
    if parser.roster().is_empty() {
        println!("No participants");
        return;
    }

    println!(
        "{:<20} {:<12} {:>9} {:>9} {:>9} {:>9} {:>9} {:>6}",
        "Name", "Class", "Dealt", "Summons", "Taken", "Healed", "Shield", "Turns"
    );
    println!("{}", "-".repeat(90));

    let mut records: Vec<_> = parser.roster().iter().collect();
    records.sort_by(|a, b| {
        let a_order = a.manual_order.unwrap_or(u32::MAX);
        let b_order = b.manual_order.unwrap_or(u32::MAX);
        a_order
            .cmp(&b_order)
            .then(b.damage_dealt.cmp(&a.damage_dealt))
            .then(a.name.cmp(&b.name))
    });
    for record in records {
        println!(
            "{:<20} {:<12} {:>9} {:>9} {:>9} {:>9} {:>9} {:>6}",
            record.name,
            record.class_name.as_deref().unwrap_or("?"),
            record.damage_dealt,
            record.damage_by_summon,
            record.damage_taken,
            record.healing_done,
            record.shield_given,
            record.number_of_turns,
        );
    }

    let unaccounted = parser.context().unaccounted_lines.len();
    if unaccounted > 0 {
        println!("\n{unaccounted} unattributed lines");
    }
}

pub async fn reset(ctx: &CliContext) {
    ctx.parser().lock().await.reset();
    println!("counters reset");
}

pub fn exit() {
    write!(std::io::stdout(), "quitting...").ok();
    std::io::stdout().flush().ok();
}
