use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::config::AppConfig;

const TEMPLATE_DIR: &str = "website/templates";

/// Every template a route renders; the server cannot serve pages without them.
const CRITICAL_TEMPLATES: &[&str] = &[
    "base.html.tera",
    "pages/index.html.tera",
    "blog/index.html.tera",
    "blog/detail.html.tera",
    "comments/edit.html.tera",
    "dashboard/index.html.tera",
    "dashboard/form.html.tera",
    "users/index.html.tera",
    "users/detail.html.tera",
    "accounts/login.html.tera",
    "accounts/signup.html.tera",
    "accounts/profile.html.tera",
];

const STATIC_DIR: &str = "website/static";

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories, warns about missing files, and
/// aborts if critical dependencies are absent.
pub fn run(config: &AppConfig) {
    info!("Boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    let db_dir = Path::new(&config.database_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);
    let mut dirs = vec![Path::new(STATIC_DIR).to_path_buf()];
    dirs.extend(db_dir.clone());

    for dir in &dirs {
        if !dir.exists() {
            match fs::create_dir_all(dir) {
                Ok(_) => info!("  Created directory: {}", dir.display()),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir.display(), e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Templates ───────────────────────────────────
    for file in CRITICAL_TEMPLATES {
        let path = Path::new(TEMPLATE_DIR).join(file);
        if !path.exists() {
            error!("  MISSING template: {}", path.display());
            errors += 1;
        }
    }

    // ── 3. Database directory writable ──────────────────
    if let Some(dir) = db_dir.filter(|d| d.exists()) {
        let test_file = dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                error!("  Database directory not writable: {}", e);
                errors += 1;
            }
        }
    }

    // ── 4. Rocket.toml exists ───────────────────────────
    if !Path::new("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        warnings += 1;
    }

    // ── Summary ─────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!("Boot check passed with {} warning(s).", warnings);
    } else {
        info!("Boot check passed.");
    }
}
