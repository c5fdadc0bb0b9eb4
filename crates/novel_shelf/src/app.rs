//! Command execution

use crate::cli::{Command, SetArgs, SettingsAction};
use anyhow::{bail, Result};
use novel_core::{AppContext, AppError, FileEntry, ScanMode, SettingsUpdate};
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How long `watch` blocks between checks for a change batch
const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Run one command against the context
pub fn run(ctx: Arc<AppContext>, command: Command) -> Result<()> {
    match command {
        Command::Open { dir } => {
            let root = open_library(&ctx, &dir)?;
            let count = file_count(&ctx.scan(ScanMode::List));
            println!("Library: {} ({} chapter files)", root.display(), count);
            Ok(())
        }
        Command::Scan { tree, json, dir } => {
            if let Some(dir) = dir {
                open_library(&ctx, &dir)?;
            }
            scan(&ctx, mode(tree), json)
        }
        Command::Preview { file, length } => preview(&ctx, &file, length),
        Command::Export { file, dest } => {
            let copied = ctx.export(&file, &dest)?;
            println!("Exported {} bytes", copied);
            Ok(())
        }
        Command::Edit { file } => Ok(ctx.open_in_editor(&file)?),
        Command::Reveal { file } => Ok(ctx.show_in_folder(&file)?),
        Command::Settings { action } => settings(&ctx, action),
        Command::Watch { tree } => watch(&ctx, mode(tree)),
        Command::Serve { bind, dir } => serve(ctx, bind, dir.as_deref()),
    }
}

fn open_library(ctx: &AppContext, dir: &Path) -> Result<PathBuf, AppError> {
    let root = ctx.open_library(dir)?;
    novel_log::set_crash_library(Some(&root));
    Ok(root)
}

fn mode(tree: bool) -> ScanMode {
    if tree {
        ScanMode::Tree
    } else {
        ScanMode::List
    }
}

fn file_count(entries: &[FileEntry]) -> usize {
    entries.iter().map(FileEntry::file_count).sum()
}

fn require_library(ctx: &AppContext) -> Result<(), AppError> {
    match ctx.library_root() {
        Some(_) => Ok(()),
        None => Err(AppError::NoLibrary),
    }
}

fn scan(ctx: &AppContext, mode: ScanMode, json: bool) -> Result<()> {
    require_library(ctx)?;
    let entries = ctx.scan(mode);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render_entries(&entries, mode));
        println!("{} chapter files", file_count(&entries));
    }
    Ok(())
}

/// Human-readable listing: list mode prints paths, tree mode indents names
fn render_entries(entries: &[FileEntry], mode: ScanMode) -> String {
    let mut out = String::new();
    match mode {
        ScanMode::List => {
            for entry in entries {
                let _ = writeln!(out, "{}", entry.path);
            }
        }
        ScanMode::Tree => render_level(entries, 0, &mut out),
    }
    out
}

fn render_level(entries: &[FileEntry], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for entry in entries {
        match &entry.children {
            Some(children) => {
                let _ = writeln!(out, "{}{}/", indent, entry.name);
                render_level(children, depth + 1, out);
            }
            None => {
                let _ = writeln!(out, "{}{}", indent, entry.name);
            }
        }
    }
}

fn preview(ctx: &AppContext, file: &Path, length: Option<usize>) -> Result<()> {
    let result = match length {
        Some(length) => novel_fs::read_preview(file, length).map_err(AppError::from),
        None => ctx.preview(file),
    };

    match result {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) if e.should_rescan() => {
            // The listing is stale; refresh it so the user sees what is left
            let count = file_count(&ctx.scan(ScanMode::List));
            tracing::info!("Rescanned after missing file: {} chapter files", count);
            eprintln!("Library refreshed: {} chapter files", count);
            bail!(e.user_message())
        }
        Err(e) => bail!(e.user_message()),
    }
}

fn settings(ctx: &AppContext, action: SettingsAction) -> Result<()> {
    let settings = match action {
        SettingsAction::Show => ctx.settings(),
        SettingsAction::Set(args) => {
            let update = settings_update(args);
            if update.is_empty() {
                bail!("Nothing to change: pass --editor, --theme or --preview-length");
            }
            ctx.update_settings(update)?
        }
        SettingsAction::Reset => ctx.reset_settings(),
    };

    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn settings_update(args: SetArgs) -> SettingsUpdate {
    SettingsUpdate {
        editor: args.editor,
        theme: args.theme,
        preview_length: args.preview_length,
    }
}

fn watch(ctx: &AppContext, mode: ScanMode) -> Result<()> {
    let watcher = ctx.watch()?;
    println!("Watching {} (Ctrl-C to stop)", watcher.root().display());
    print!("{}", render_entries(&ctx.scan(mode), mode));

    loop {
        // A closed event channel ends the loop with an error
        let Some(changed) = watcher.wait_for_change(WATCH_POLL_INTERVAL)? else {
            continue;
        };

        tracing::debug!("Library changed: {:?}", changed);
        let entries = ctx.scan(mode);
        println!("--- {} changed, {} chapter files", changed.len(), file_count(&entries));
        print!("{}", render_entries(&entries, mode));
    }
}

fn serve(ctx: Arc<AppContext>, bind: Option<SocketAddr>, dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = dir {
        open_library(&ctx, dir)?;
    }

    let addr = match bind {
        Some(addr) => addr,
        None => {
            let configured = ctx.config().server.bind_addr;
            configured
                .parse::<SocketAddr>()
                .map_err(|e| AppError::Config(format!("server.bind_addr {:?}: {}", configured, e)))?
        }
    };

    if ctx.library_root().is_none() {
        tracing::warn!("Serving without a library; open one with `novel-shelf open <dir>`");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Init(format!("tokio runtime: {}", e)))?;

    runtime.block_on(novel_server::serve(ctx, addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use novel_core::AppConfig;
    use std::fs;

    fn library() -> (tempfile::TempDir, AppContext) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "第一章").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.txt"), "第三章").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let ctx = AppContext::new(AppConfig::default(), None);
        ctx.open_library(dir.path()).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_render_tree() {
        let (_dir, ctx) = library();
        let rendered = render_entries(&ctx.scan(ScanMode::Tree), ScanMode::Tree);
        let mut lines: Vec<&str> = rendered.lines().collect();
        lines.sort();
        // Empty folders are pruned
        assert_eq!(lines, ["  c.txt", "a.txt", "sub/"]);
        assert!(rendered.contains("sub/\n  c.txt\n"));
    }

    #[test]
    fn test_render_list_uses_paths() {
        let (_dir, ctx) = library();
        let entries = ctx.scan(ScanMode::List);
        let rendered = render_entries(&entries, ScanMode::List);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.ends_with(".txt")));
        assert!(lines.iter().any(|l| l.contains("sub")));
        assert_eq!(file_count(&entries), 2);
    }

    #[test]
    fn test_preview_missing_file_reports_error() {
        let (dir, ctx) = library();
        let err = preview(&ctx, &dir.path().join("gone.txt"), None).unwrap_err();
        assert!(err.to_string().starts_with("read failed:"));
    }

    #[test]
    fn test_scan_requires_library() {
        let ctx = AppContext::new(AppConfig::default(), None);
        let err = scan(&ctx, ScanMode::List, true).unwrap_err();
        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::NoLibrary)));
    }

    #[test]
    fn test_settings_set_requires_a_value() {
        let ctx = AppContext::new(AppConfig::default(), None);
        assert!(settings(&ctx, SettingsAction::Set(SetArgs::default())).is_err());

        settings(
            &ctx,
            SettingsAction::Set(SetArgs {
                theme: Some("dark".into()),
                ..Default::default()
            }),
        )
        .unwrap();
        assert_eq!(ctx.settings().theme, "dark");
    }
}
