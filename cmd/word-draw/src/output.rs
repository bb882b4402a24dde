//! Plain-text and JSON rendering of command results.

use domains::models::{Draw, DrawOutcome, DrawRecord, Word, Work};
use serde::Serialize;
use services::ImportSummary;

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn record_line(record: &DrawRecord) -> String {
    let mut line = format!(
        "{}  {} ({})  {}  drawn {}",
        record.draw.id,
        record.word,
        record.word.language,
        record.draw.acceptance,
        record.draw.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    if let Some(work) = &record.work {
        line.push_str(&format!(
            "  uploaded {} [{}]",
            work.upload_time.format("%Y-%m-%d %H:%M:%S UTC"),
            work.language
        ));
    }
    line
}

pub fn word(word: &Word, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(word);
    }
    println!("{}  {} ({})", word.id, word, word.language);
    Ok(())
}

pub fn words(words: &[Word], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(words);
    }
    for w in words {
        println!("{}  {} ({})  added by {}", w.id, w, w.language, w.added_by);
    }
    Ok(())
}

pub fn import_summary(summary: &ImportSummary, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "added": summary.added,
            "skipped": summary.skipped,
        }));
    }
    println!("added {}, skipped {} existing", summary.added, summary.skipped);
    Ok(())
}

pub fn drawn(word: Option<&Word>, record: Option<&DrawRecord>, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&serde_json::json!({ "word": word, "draw": record }));
    }
    match (word, record) {
        (None, _) => println!("no words left to draw"),
        (Some(_), Some(record)) => println!("{}", record_line(record)),
        (Some(word), None) => println!("{} ({}), come back once the draw window has passed", word, word.language),
    }
    Ok(())
}

pub fn optional_record(record: Option<&DrawRecord>, empty: &str, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&record);
    }
    match record {
        Some(record) => println!("{}", record_line(record)),
        None => println!("{empty}"),
    }
    Ok(())
}

pub fn draw(draw: &Draw, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(draw);
    }
    println!("{}  {}", draw.id, draw.acceptance);
    Ok(())
}

pub fn work(work: &Work, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(work);
    }
    println!(
        "{}  uploaded {} [{}]",
        work.draw_id,
        work.upload_time.format("%Y-%m-%d %H:%M:%S UTC"),
        work.language
    );
    Ok(())
}

#[derive(Serialize)]
struct HistoryEntry<'a> {
    #[serde(flatten)]
    record: &'a DrawRecord,
    outcome: DrawOutcome,
}

pub fn history(history: &[(DrawRecord, DrawOutcome)], json: bool) -> anyhow::Result<()> {
    if json {
        let entries: Vec<HistoryEntry<'_>> = history
            .iter()
            .map(|(record, outcome)| HistoryEntry {
                record,
                outcome: *outcome,
            })
            .collect();
        return print_json(&entries);
    }
    for (record, outcome) in history {
        println!("{}  => {}", record_line(record), outcome);
    }
    Ok(())
}

pub fn results(successful: &[Word], failed: &[Word], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "successful": successful,
            "failed": failed,
        }));
    }
    let list = |words: &[Word]| {
        words
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("successful ({}): {}", successful.len(), list(successful));
    println!("failed ({}): {}", failed.len(), list(failed));
    Ok(())
}
