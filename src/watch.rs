use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;

/// Blocks, calling `on_change` after every burst of file changes below `roots`.
///
/// Only returns when the watcher shuts down or `on_change` fails.
pub fn watch_changes(
    roots: &[PathBuf],
    mut on_change: impl FnMut() -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    use notify::Watcher;

    let (sender, receiver) = std::sync::mpsc::channel();
    let debounce = Duration::from_millis(200);

    // has to outlive the loop below, otherwise the channel closes
    let mut watcher =
        notify::PollWatcher::new(sender, debounce).context("could not start file watcher")?;

    let mut watched = 0;
    for target in watch_targets(roots) {
        match watcher.watch(&target, notify::RecursiveMode::Recursive) {
            Ok(()) => watched += 1,
            Err(error) => warn!(path = %target.display(), "could not watch: {error:#}"),
        }
    }

    if watched == 0 {
        anyhow::bail!("none of the shader roots could be watched");
    }

    let roots: Vec<PathBuf> = roots.iter().map(|root| absolute(root)).collect();

    info!("watching for changes");

    while let Ok(event) = receiver.recv() {
        let changed = match &event {
            notify::DebouncedEvent::Rescan
            | notify::DebouncedEvent::Error(_, _)
            | notify::DebouncedEvent::NoticeWrite(_)
            | notify::DebouncedEvent::NoticeRemove(_) => continue,
            notify::DebouncedEvent::Create(path)
            | notify::DebouncedEvent::Write(path)
            | notify::DebouncedEvent::Chmod(path)
            | notify::DebouncedEvent::Remove(path) => is_below(path, &roots),
            notify::DebouncedEvent::Rename(from, to) => {
                is_below(from, &roots) || is_below(to, &roots)
            }
        };

        // ancestors of missing roots are watched too, their other contents don't matter
        if !changed {
            continue;
        }

        // let the rest of the burst arrive, then drop it
        std::thread::sleep(Duration::from_millis(10));
        while receiver.try_recv().is_ok() {}

        on_change()?;
    }

    debug!("file watcher stopped");
    Ok(())
}

/// Paths to register with the watcher: each root, or its closest existing ancestor when the
/// root does not exist yet.
fn watch_targets(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut targets: Vec<PathBuf> = Vec::new();

    for root in roots {
        let target = if root.exists() {
            root.clone()
        } else {
            let ancestor = root
                .ancestors()
                .skip(1)
                .map(|path| if path.as_os_str().is_empty() { Path::new(".") } else { path })
                .find(|path| path.exists())
                .unwrap_or(Path::new("."))
                .to_path_buf();
            warn!(
                root = %root.display(),
                watching = %ancestor.display(),
                "shader root does not exist, watching its parent until it appears"
            );
            ancestor
        };

        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    targets
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// `roots` must already be absolute.
fn is_below(path: &Path, roots: &[PathBuf]) -> bool {
    let path = absolute(path);
    roots.iter().any(|root| path.starts_with(root))
}
