use anyhow::{Result, bail};
use log::{debug, info};
use std::sync::Arc;

use crate::{
    download::{DownloadStatus, Downloader},
    install::Installer,
    link::LinkManager,
    reference::Reference,
    resolver::Resolver,
    runtime::Runtime,
    ui::{Outcome, ProgressView},
};

use super::config::{Config, Options};

#[tracing::instrument(skip(runtime, options))]
pub async fn install<R: Runtime + 'static>(
    runtime: R,
    references: &[String],
    link_name: Option<String>,
    options: Options,
) -> Result<()> {
    // Nothing is spawned until every reference parses.
    let references = Reference::parse_all(references)?;
    if link_name.is_some() && references.len() > 1 {
        bail!(
            "--name can only be used when installing a single artifact, got {}",
            references.len()
        );
    }

    let config = Config::new(runtime, options)?;
    run(config, references, link_name, ProgressView::new()).await
}

#[tracing::instrument(skip_all)]
pub async fn run<R: Runtime + 'static>(
    config: Config<R>,
    references: Vec<Reference>,
    link_name: Option<String>,
    view: ProgressView,
) -> Result<()> {
    let resolver = Resolver::new(config.provider)
        .with_platform(config.platform)
        .with_policy(config.policy);
    let downloader = Downloader::new(
        Arc::clone(&config.runtime),
        config.http_client,
        config.layout.clone(),
    );
    let linker = LinkManager::new(config.runtime, config.layout);
    let installer = Arc::new(Installer::new(resolver, downloader, linker));

    info!("Installing {} artifact(s)", references.len());
    let handles = references
        .into_iter()
        .map(|reference| installer.spawn(reference, link_name.clone()))
        .collect();

    let outcomes = view.run(handles).await;
    let total = outcomes.len();
    let mut failed = 0;
    for outcome in &outcomes {
        if outcome.result.is_err() {
            failed += 1;
        }
        println!("{}", describe(outcome));
    }

    if failed > 0 {
        bail!("{} of {} installation(s) failed", failed, total);
    }
    debug!("All {} installation(s) succeeded", total);
    Ok(())
}

/// One line summarizing how a reference ended.
pub(crate) fn describe(outcome: &Outcome) -> String {
    match &outcome.result {
        Ok(installed) => {
            let note = match installed.status {
                DownloadStatus::Downloaded { bytes } => format!("{} bytes", bytes),
                DownloadStatus::AlreadyPresent => "already in store".to_string(),
                DownloadStatus::Joined => "shared download".to_string(),
            };
            format!(
                "Installed {} -> {} ({})",
                installed.asset,
                installed.link.display(),
                note
            )
        }
        Err(e) => format!("Failed {}: {:#}", outcome.reference, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GpmError;
    use crate::install::Installed;
    use crate::resolver::ResolvedAsset;
    use crate::runtime::MockRuntime;
    use std::path::PathBuf;

    fn reference(raw: &str) -> Reference {
        Reference::parse(raw).unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_install_rejects_bad_reference_before_any_work() {
        // No expectations: touching the runtime would panic.
        let runtime = MockRuntime::new();
        let refs = vec!["acme/tool".to_string(), "".to_string()];

        let result = install(runtime, &refs, None, Options::default()).await;

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<GpmError>().is_some());
    }

    #[tokio::test]
    async fn test_install_rejects_name_with_several_artifacts() {
        let runtime = MockRuntime::new();
        let refs = vec!["acme/tool:a,b".to_string()];

        let result = install(runtime, &refs, Some("t".into()), Options::default()).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("--name"));
    }

    #[test]
    fn test_describe_success() {
        let outcome = Outcome {
            reference: reference("acme/tool"),
            result: Ok(Installed {
                asset: ResolvedAsset {
                    site: "github.com".into(),
                    owner: "acme".into(),
                    repository: "tool".into(),
                    version: "v1.0.0".into(),
                    artifact_name: "tool-linux-amd64".into(),
                    ..Default::default()
                },
                link: PathBuf::from("/bin/tool"),
                status: DownloadStatus::Downloaded { bytes: 12 },
            }),
        };

        assert_eq!(
            describe(&outcome),
            "Installed acme/tool@v1.0.0:tool-linux-amd64 -> /bin/tool (12 bytes)"
        );
    }

    #[test]
    fn test_describe_failure_includes_cause() {
        let error = GpmError::NoArtifact {
            release: "acme/tool@v1.0.0".into(),
        };
        let outcome = Outcome {
            reference: reference("acme/tool"),
            result: Err(anyhow::Error::new(Arc::new(error))),
        };

        assert_eq!(
            describe(&outcome),
            "Failed acme/tool: no artifact found in acme/tool@v1.0.0"
        );
    }
}
