//! Review command - interactive record-by-record validation loop.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use colored::Colorize;
use indexmap::IndexMap;
use sitevet::{
    HttpRemote, ImageRef, Predicates, RecordId, RecordTable, RemoteOutcome, ReviewSession,
    SessionConfig, SyncEngine, SyncReport,
};

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    country: Vec<String>,
    start: usize,
    end: usize,
    radius: f64,
    remote: Option<String>,
    branch: String,
    token: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = RecordTable::load(&file)?;

    let sync = match remote {
        Some(url) => {
            let mut store = HttpRemote::new(url)?.with_branch(branch);
            if let Some(token) = token {
                store = store.with_token(token);
            }
            SyncEngine::new(&file, Box::new(store))
        }
        None => SyncEngine::local_only(&file),
    };

    let config = SessionConfig { radius_km: radius };
    let mut session = ReviewSession::with_config(table, sync, config);

    let predicates = if country.is_empty() {
        Predicates::new()
    } else {
        Predicates::new().allow("Country", country)
    };
    session.apply_filters(&predicates, start, end);

    if session.selection().is_empty() {
        if session.selection().notice().is_some() {
            println!(
                "{} start row must be below end row; nothing to review.",
                "Note:".yellow()
            );
        } else {
            println!("Nothing to review with these filters.");
        }
        return Ok(());
    }

    println!(
        "{} {} of {} filtered records",
        "Reviewing".cyan().bold(),
        session.selection().len(),
        session.selection().filtered_len()
    );
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let ids = session.selection().ids().to_vec();

    for id in ids {
        print_record(&session, id)?;

        loop {
            print!(
                "{} ",
                "[a]ccept / [r]eject / [e]dit field / [s]kip / [q]uit:".bold()
            );
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                return Ok(());
            };
            match line?.trim() {
                "a" => {
                    let report = session.accept(id)?;
                    print_sync(&report);
                    break;
                }
                "r" => {
                    let report = session.reject(id)?;
                    print_sync(&report);
                    break;
                }
                "e" => {
                    session.begin_edit(id)?;
                    if let Some(report) = edit_field(&mut session, id, &mut lines)? {
                        print_sync(&report);
                    }
                    print_record(&session, id)?;
                }
                "s" => break,
                "q" => return Ok(()),
                other => {
                    println!("Unrecognized command '{}'", other);
                }
            }
        }
        println!();
    }

    println!("{}", "Review pass complete.".green().bold());
    Ok(())
}

/// Render one record with its neighbors and image link.
fn print_record(
    session: &ReviewSession,
    id: RecordId,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = session.record_view(id)?;

    println!("{}", format!("── Record {} ──", id).cyan().bold());
    println!("Status: {}", view.status.label().white().bold());

    for (name, value) in view.record.fields() {
        let shown = if value.is_empty() { "(no value)" } else { value };
        println!("  {:24} {}", name, shown);
    }

    match &view.image {
        Some(ImageRef::Direct(url)) => println!("Image: {}", url.blue()),
        Some(ImageRef::Tiff(url)) => println!("Image (TIFF): {}", url.blue()),
        None => println!("{}", "No valid image URL.".dimmed()),
    }

    if view.neighbors.is_empty() {
        println!("{}", "No neighbors within radius.".dimmed());
    } else {
        println!("{}", "Neighbors:".yellow().bold());
        for (neighbor, distance) in &view.neighbors {
            let name = neighbor.field("Country").unwrap_or("?");
            println!(
                "  record {:>5}  {:>6.2} km  {}",
                neighbor.id().to_string(),
                distance,
                name
            );
        }
    }
    Ok(())
}

/// Prompt for a field name and new value, then commit the edit.
fn edit_field(
    session: &mut ReviewSession,
    id: RecordId,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<Option<SyncReport>, Box<dyn std::error::Error>> {
    print!("Field name: ");
    io::stdout().flush()?;
    let Some(field) = lines.next() else {
        return Ok(None);
    };
    let field = field?.trim().to_string();

    if session.record_view(id)?.record.field(&field).is_none() {
        println!("No such field '{}'", field);
        session.cancel_edit(id);
        return Ok(None);
    }

    print!("New value: ");
    io::stdout().flush()?;
    let Some(value) = lines.next() else {
        session.cancel_edit(id);
        return Ok(None);
    };

    let mut updates = IndexMap::new();
    updates.insert(field, value?.trim().to_string());
    let report = session.submit_edit(id, &updates)?;
    Ok(Some(report))
}

/// Tell the reviewer where their decision landed.
fn print_sync(report: &SyncReport) {
    match &report.remote {
        RemoteOutcome::Synced { .. } | RemoteOutcome::Created { .. } => {
            println!("{}", "Saved locally and synced.".green());
        }
        RemoteOutcome::ConflictOverwritten { .. } => {
            println!(
                "{}",
                "Saved; remote had changed and was overwritten (last writer wins)."
                    .yellow()
            );
        }
        RemoteOutcome::Pending { reason } => {
            println!(
                "{} {}",
                "Saved locally, not yet synced:".yellow(),
                reason
            );
        }
        RemoteOutcome::Disabled => {
            println!("{}", "Saved locally.".green());
        }
    }
}
