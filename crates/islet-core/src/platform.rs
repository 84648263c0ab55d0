use std::path::PathBuf;

pub fn data_dir() -> PathBuf {
    // ~/.local/share/islet on macOS and Linux (XDG layout, avoiding the
    // macOS Application Support folder for consistency with the config dir).
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".local")
        .join("share")
        .join("islet")
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("islet")
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
        let p = dir.join("external").join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var("PATH").ok()?;
    for dir in path.split(':') {
        for name in names {
            let p = PathBuf::from(dir).join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Find the nowplaying-cli helper (media-remote bridge).
///
/// Searches in order:
/// 1. NOWPLAYING_CLI_PATH environment variable
/// 2. Beside the current executable (bundled distribution)
/// 3. PATH
pub fn find_nowplaying_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("NOWPLAYING_CLI_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(p) = find_beside_exe(&["nowplaying-cli"]) {
        return Some(p);
    }

    find_on_path(&["nowplaying-cli"])
}

/// Find the icalBuddy helper used for the upcoming-events tile.
/// Same search order as the media helper.
pub fn find_icalbuddy_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("ICALBUDDY_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(p) = find_beside_exe(&["icalBuddy", "icalbuddy"]) {
        return Some(p);
    }

    find_on_path(&["icalBuddy", "icalbuddy"])
}
