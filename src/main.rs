use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use pinpatch::config::Allowlist;
use pinpatch::resolver::{PypiClient, StaticVersions, VersionSource};
use pinpatch::write::NewlineStyle;
use pinpatch::{diff, edit, plan, write, yaml};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// When set, version lookups come from the named `name=version` listing
/// instead of PyPI; lets CI and tests run without network access.
const VERSIONS_FILE_ENV: &str = "PINPATCH_VERSIONS_FILE";

#[derive(Parser)]
#[command(name = "pinpatch")]
#[command(about = "Keeps pre-commit additional_dependencies pinned to current releases", long_about = None)]
#[command(version)]
struct Cli {
    /// Check and show a diff, but do not update the file
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let allowlist =
        Allowlist::load(Path::new(".")).context("failed to load allow-list configuration")?;

    let config_path = Path::new(yaml::CONFIG_FILE_NAME);
    if !config_path.is_file() {
        anyhow::bail!("pinpatch cannot run without {}", yaml::CONFIG_FILE_NAME);
    }
    let source = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", yaml::CONFIG_FILE_NAME))?;

    let document = yaml::parse_document(&source)
        .with_context(|| format!("failed to parse {}", yaml::CONFIG_FILE_NAME))?;

    let versions: Box<dyn VersionSource> = match std::env::var_os(VERSIONS_FILE_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            Box::new(StaticVersions::load(&path).with_context(|| {
                format!("failed to read version overrides from {}", path.display())
            })?)
        }
        None => Box::new(PypiClient::new()?),
    };

    // Plan per hook, in document order; positions make the final result
    // independent of this discovery order.
    let mut edits = Vec::new();
    for repo in &document.repos {
        let Some(watched) = allowlist.hooks_for(&repo.url) else {
            continue;
        };
        for hook in &repo.hooks {
            if !watched.contains(&hook.id) {
                continue;
            }

            print!("checking additional_dependencies of {}...", hook.id.bold());
            let _ = std::io::stdout().flush();

            let hook_edits = plan::plan_hook(hook, versions.as_ref())?;
            if hook_edits.is_empty() {
                println!(" up to date");
            } else {
                println!();
                for planned in &hook_edits {
                    println!(
                        "  {} => {}",
                        planned.old.value.red(),
                        planned.new_value.green()
                    );
                }
            }
            edits.extend(hook_edits);
        }
    }

    if edits.is_empty() {
        println!("no updates needed in any hook configs");
        return Ok(());
    }

    edit::sort_edits(&mut edits);

    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let patched_lines = edit::apply_edits(&lines, &edits)?;

    if cli.check {
        let patched = patched_lines.concat();
        print!(
            "{}",
            diff::render_unified(&source, &patched, yaml::CONFIG_FILE_NAME)
        );
        std::process::exit(1);
    }

    print!(
        "applying {} update(s) to {}...",
        edits.len(),
        yaml::CONFIG_FILE_NAME
    );
    let _ = std::io::stdout().flush();

    let style = NewlineStyle::choose(&NewlineStyle::observe(&source));
    let content = write::render(&patched_lines, style);
    write::persist(config_path, &content)
        .with_context(|| format!("failed to rewrite {}", yaml::CONFIG_FILE_NAME))?;

    println!(" {}", "done".green());
    Ok(())
}
