use std::path::PathBuf;

use anyhow::{bail, Context};
use colored::Colorize;
use edo_diff::{diff_indexes, diff_self, diff_workdir, patch_for_change, ChangeKind, ChangeSet};
use edo_index::Index;
use edo_merge::MergeStatus;
use edo_refs::{CheckoutTarget, Namespace};
use edo_store::ObjectKind;
use edo_sync::{RepoConfig, Repository, SyncError};
use edo_types::{ElementKey, ObjectKey, StageId};
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::Checkout(args) => cmd_checkout(args).await,
        Command::Status(_) => cmd_status(),
        Command::Diff(args) => cmd_diff(args),
        Command::Merge(args) => cmd_merge(args).await,
        Command::Commit(args) => cmd_commit(args).await,
        Command::Log(args) => cmd_log(args),
        Command::CatFile(args) => cmd_cat_file(args),
        Command::Show(args) => cmd_show(args),
        Command::Reset(args) => cmd_reset(args).await,
        Command::Restore(args) => cmd_restore(args).await,
    }
}

fn open() -> anyhow::Result<Repository> {
    let cwd = std::env::current_dir()?;
    let repo =
        Repository::discover(&cwd).context("not inside an edo repository (run `edo init`)")?;
    debug!(root = %repo.handle().root().display(), "opened repository");
    Ok(repo)
}

fn parse_elements(names: &[String]) -> anyhow::Result<Vec<ElementKey>> {
    names
        .iter()
        .map(|name| ElementKey::parse(name).with_context(|| format!("invalid element '{name}'")))
        .collect()
}

/// Stage the checkout pointer names, even if it has no local ref yet.
fn checked_out_stage(repo: &Repository) -> anyhow::Result<StageId> {
    match repo.refs().resolve_checkout()? {
        Some(CheckoutTarget::Index {
            stage: Some(stage), ..
        })
        | Some(CheckoutTarget::Unborn(stage)) => Ok(stage),
        Some(CheckoutTarget::Index { stage: None, key }) => Err(SyncError::Detached(key).into()),
        None => Err(SyncError::NothingCheckedOut.into()),
    }
}

fn checked_out_index(repo: &Repository) -> anyhow::Result<Index> {
    match repo.checked_out()? {
        Some((_, Some(index))) => Ok(index),
        Some((CheckoutTarget::Unborn(stage), None)) => {
            bail!("stage {stage} has no local index yet; run `edo merge` after a pull")
        }
        _ => Err(SyncError::NothingCheckedOut.into()),
    }
}

fn short(key: Option<ObjectKey>) -> String {
    key.map_or_else(|| "-".repeat(7), |k| k.short_hex())
}

fn kind_label(kind: ChangeKind) -> colored::ColoredString {
    match kind {
        ChangeKind::Added => "added:   ".green(),
        ChangeKind::Deleted => "deleted: ".red(),
        ChangeKind::Modified => "modified:".yellow(),
    }
}

fn print_changes(title: &str, changes: &ChangeSet) {
    if changes.is_empty() {
        return;
    }
    println!("{title}");
    for (key, change) in changes {
        println!("  {} {}", kind_label(change.kind()), key);
    }
    println!();
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let path = PathBuf::from(args.path.unwrap_or_else(|| ".".into()));
    std::fs::create_dir_all(&path)?;
    let mut config = RepoConfig::new(args.url);
    config.instance = args.instance;
    if let Some(width) = args.concurrency {
        config.concurrency = width;
    }
    let repo = Repository::init(&path, config)?;
    println!(
        "{} Initialized empty edo repository in {}",
        "✓".green().bold(),
        repo.handle().edo_dir().display().to_string().bold()
    );
    Ok(())
}

async fn cmd_checkout(args: CheckoutArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let outcome = repo.checkout(&args.target).await?;
    println!(
        "Switched to {} ({} file(s) written, {} removed)",
        outcome.checkout.render().yellow().bold(),
        outcome.written,
        outcome.removed
    );
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let repo = open()?;
    let status = repo.status()?;
    match &status.checkout {
        None => {
            println!("Nothing checked out. Use `edo checkout <stage>`.");
            return Ok(());
        }
        Some(CheckoutTarget::Index {
            stage: Some(stage),
            key,
        }) => println!("On stage {} at {}", stage.to_string().yellow().bold(), key.short_hex()),
        Some(CheckoutTarget::Index { stage: None, key }) => {
            println!("{} {}", "Detached at".red(), key.short_hex())
        }
        Some(CheckoutTarget::Unborn(stage)) => {
            println!("On stage {} (no local index yet)", stage.to_string().yellow().bold())
        }
    }

    if let Some(head) = status.merge_head {
        println!("Merge of {} in progress; commit to conclude it.", head.short_hex().cyan());
    }
    if !status.conflicts.is_empty() {
        println!("Unresolved conflicts:");
        for key in &status.conflicts {
            println!("  {} {}", "conflict:".red().bold(), key);
        }
        println!();
    }
    if !status.remote_moved.is_empty() {
        println!("Changed on the remote since the last merge:");
        for key in &status.remote_moved {
            println!("  {} {}", "moved:   ".magenta(), key);
        }
        println!();
    }
    print_changes("Changes not committed:", &status.working);
    print_changes("Committed, not pushed:", &status.unpushed);
    if status.is_clean() && status.conflicts.is_empty() {
        println!("Nothing to commit, working directory clean.");
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let index = checked_out_index(&repo)?;
    let only = parse_elements(&args.elements)?;

    let changes = if args.cached {
        match repo.indexes().load_stage(Namespace::Remote, &index.stage)? {
            Some((_, remote)) => diff_indexes(&index, &remote, args.base),
            None => diff_self(&index),
        }
    } else {
        let types = repo.indexes().read_type_list(&index)?;
        diff_workdir(repo.handle(), &types, &index, args.base)?
    };

    let trim = repo.config().trim_trailing_whitespace;
    for (key, change) in &changes {
        if !only.is_empty() && !only.contains(key) {
            continue;
        }
        let lines = patch_for_change(repo.store(), repo.handle(), key, change, trim)?;
        for line in lines {
            if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", line.bold());
            } else if line.starts_with("@@") {
                println!("{}", line.cyan());
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else {
                println!("{line}");
            }
        }
    }
    Ok(())
}

async fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let local = match args.into {
        Some(name) => name,
        None => checked_out_stage(&repo)?.to_string(),
    };
    let report = repo.merge(&local, args.remote.as_deref()).await?;
    if report.cloned {
        println!(
            "Created local stage {} from remote {}",
            report.stage.to_string().yellow().bold(),
            report.remote.short_hex()
        );
    }
    for (key, status) in &report.elements.succeeded {
        let label = match status {
            MergeStatus::Merged => "merged".green(),
            MergeStatus::Conflict => "conflict".red().bold(),
            MergeStatus::UpToDate => continue,
            MergeStatus::Deleted => "deleted".magenta(),
        };
        println!("  {label} {key}");
    }
    for (key, error) in &report.elements.failed {
        println!("  {} {key}: {error}", "failed".red());
    }
    if report.conflicts.is_empty() {
        println!("Merge done; commit to record it.");
    } else {
        println!(
            "{} conflict(s); fix the marked files and commit.",
            report.conflicts.len().to_string().red().bold()
        );
    }
    Ok(())
}

async fn cmd_commit(args: CommitArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let stage = checked_out_stage(&repo)?;
    let paths = parse_elements(&args.elements)?;
    let outcome = repo.commit(&stage, &paths, &args.message, args.all).await?;
    let Some(key) = outcome.index else {
        println!("Nothing to commit.");
        return Ok(());
    };
    println!(
        "[{} {}] {}",
        stage.to_string().yellow(),
        key.short_hex().bold(),
        args.message
    );
    println!(
        " {} element(s) committed, {} removed",
        outcome.committed.len(),
        outcome.removed.len()
    );
    if !outcome.conflicts.is_empty() {
        println!(
            "{} conflict(s) remain; see `edo status`.",
            outcome.conflicts.len().to_string().red()
        );
    } else if outcome.merge_cleared {
        println!("Merge concluded.");
    }
    Ok(())
}

fn cmd_log(args: LogArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let name = match args.name {
        Some(name) => name,
        None => checked_out_stage(&repo)?.to_string(),
    };
    for (key, index) in repo.log(&name, args.limit)? {
        println!("{} {}", "index".yellow(), key.to_hex().yellow());
        println!("Stage:    {}", index.stage);
        println!("Status:   {}", index.status);
        println!("Elements: {}", index.len());
        if !index.message.is_empty() {
            println!("\n    {}", index.message);
        }
        println!();
    }
    Ok(())
}

fn cmd_cat_file(args: CatFileArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let key = ObjectKey::from_hex(&args.key)?;
    let Some(object) = repo.store().read(&key)? else {
        bail!("object {} not found", args.key);
    };
    if args.kind {
        println!("{}", object.kind);
    } else {
        print!("{}", String::from_utf8_lossy(&object.data));
    }
    Ok(())
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let (key, index) = repo.indexes().load(&args.name)?;

    let Some(element) = args.element else {
        println!("{} {}", "index".yellow(), key.to_hex().yellow());
        println!("Previous: {}", index.prev);
        println!("Stage:    {}", index.stage);
        println!("Status:   {}", index.status);
        println!("Message:  {}", index.message);
        println!();
        for (element, record) in &index.elements {
            let fingerprint = record.fingerprint.as_ref().map_or("-", |fp| fp.as_str());
            println!(
                "{} {} {:<16} {}",
                short(record.local),
                short(record.base),
                fingerprint,
                element
            );
        }
        return Ok(());
    };

    let element = ElementKey::parse(&element)?;
    let Some(record) = index.get(&element) else {
        bail!("{element} is not part of {}", args.name);
    };
    match args.logs {
        Some(level) => {
            let Some(history) = record.history else {
                bail!("no history recorded for {element}; pull it with history first");
            };
            let history = repo.indexes().read_history(&history)?;
            if let Some(change) = history.level(&level) {
                let detail = change.fields();
                eprintln!(
                    "{} {} {} {} {}",
                    level.yellow(),
                    detail.user,
                    detail.date,
                    detail.ccid.cyan(),
                    detail.comment
                );
            }
            println!("{}", history.reconstruct(&level));
        }
        None => {
            let Some(object) = record.current() else {
                bail!("{element} has not been pulled yet");
            };
            let content = repo.store().get(&object, Some(ObjectKind::Blob))?;
            print!("{}", String::from_utf8_lossy(&content));
        }
    }
    Ok(())
}

async fn cmd_reset(args: ResetArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let stage = checked_out_stage(&repo)?;
    let key = repo.reset(&stage, args.steps, args.hard).await?;
    println!("{} is now at {}", stage.to_string().yellow(), key.short_hex().bold());
    Ok(())
}

async fn cmd_restore(args: RestoreArgs) -> anyhow::Result<()> {
    let repo = open()?;
    let keys = parse_elements(&args.elements)?;
    let report = repo.restore(&keys).await?;
    for (key, ()) in &report.succeeded {
        println!("  {} {key}", "restored".green());
    }
    for (key, error) in &report.failed {
        println!("  {} {key}: {error}", "failed".red());
    }
    if !report.is_clean() {
        bail!("{report}");
    }
    Ok(())
}
