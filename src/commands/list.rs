use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    resolver::ResolvedAsset,
    runtime::Runtime,
    store::{LinkedAsset, list_installed, list_linked},
};

use super::config::Options;
use super::paths;

/// Print the artifacts in the store and the links pointing at them.
#[tracing::instrument(skip(runtime, options))]
pub fn list<R: Runtime>(runtime: R, options: Options) -> Result<()> {
    let layout = paths::layout(&runtime, options.store_root, options.bin_root)?;

    let installed = list_installed(&runtime, &layout)?;
    let linked = list_linked(&runtime, &layout)?;
    debug!(
        "Found {} artifact(s) and {} link(s)",
        installed.len(),
        linked.len()
    );

    let home = runtime.home_dir();
    print!("{}", render_list(&installed, &linked, home.as_deref()));
    Ok(())
}

/// Text for `gpm list`. Paths under `home` are shortened to `~/`.
pub(crate) fn render_list(
    installed: &[ResolvedAsset],
    linked: &[LinkedAsset],
    home: Option<&Path>,
) -> String {
    let mut out = String::from("Release assets available in cache:\n");
    for asset in installed {
        out.push_str(&format!("  {}\n", asset));
    }
    out.push_str("\nLinked assets:\n");
    for entry in linked {
        out.push_str(&format!(
            "  {} -> {}\n",
            shorten(&entry.link, home),
            shorten(&entry.target, home)
        ));
    }
    out
}

fn shorten(path: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    }
}
