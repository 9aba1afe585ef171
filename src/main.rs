use anyhow::{Context, Result};
use career_portrait_generator::{
    Config, EncodedImage, GenerationRequest, Orchestrator, ProviderKind,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "career-portrait-generator")]
#[command(about = "Generate a career portrait for a child and a dream job")]
struct CliArgs {
    /// Name of the child in the portrait.
    #[arg(long, required_unless_present = "show_config")]
    name: Option<String>,

    /// Dream job to depict.
    #[arg(long, required_unless_present = "show_config")]
    role: Option<String>,

    /// Backend to use (gemini or freepik). Defaults to AI_PROVIDER.
    #[arg(long, value_parser = parse_provider_arg)]
    provider: Option<ProviderKind>,

    /// Reference photo of the child (required for freepik).
    #[arg(long, value_name = "FILE")]
    reference: Option<PathBuf>,

    /// Write the image here instead of printing base64 JSON.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Give up after this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Print the non-sensitive configuration summary and exit.
    #[arg(long)]
    show_config: bool,
}

fn parse_provider_arg(input: &str) -> std::result::Result<ProviderKind, String> {
    input.parse().map_err(|e: career_portrait_generator::ConfigError| e.to_string())
}

/// Writes `bytes` to `path`, creating missing parent directories.
async fn write_image(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn run(args: CliArgs) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let orchestrator = Orchestrator::new(config)?;

    if args.show_config {
        println!(
            "{}",
            serde_json::to_string_pretty(&orchestrator.config_summary())?
        );
        return Ok(());
    }

    let name = args.name.unwrap_or_default();
    let role = args.role.unwrap_or_default();
    let mut request = GenerationRequest::new(name, role);
    if let Some(provider) = args.provider {
        request = request.with_provider(provider);
    }
    if let Some(path) = &args.reference {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read reference image {}", path.display()))?;
        request = request.with_reference_image(bytes);
    }

    let result = match args.timeout_secs {
        Some(secs) => {
            orchestrator
                .generate_with_deadline(&request, Duration::from_secs(secs))
                .await?
        }
        None => orchestrator.generate(&request).await?,
    };

    match args.out {
        Some(path) => {
            write_image(&path, &result.bytes).await?;
            info!("Saved {} bytes to {}", result.bytes.len(), path.display());
        }
        None => {
            println!("{}", serde_json::to_string(&EncodedImage::from(&result))?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "career_portrait_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting career-portrait-generator");

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let code = e
                .downcast_ref::<career_portrait_generator::Error>()
                .map(|e| e.code())
                .unwrap_or("internal");
            error!(code = code, "Generation failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_arg() {
        assert_eq!(parse_provider_arg("Freepik").unwrap(), ProviderKind::Freepik);
        let err = parse_provider_arg("dalle").unwrap_err();
        assert!(err.contains("dalle"));
    }

    #[test]
    fn test_cli_requires_name_and_role() {
        assert!(CliArgs::try_parse_from(["career-portrait-generator"]).is_err());
        assert!(CliArgs::try_parse_from(["career-portrait-generator", "--show-config"]).is_ok());
    }

    #[test]
    fn test_cli_full_arguments() {
        let args = CliArgs::try_parse_from([
            "career-portrait-generator",
            "--name",
            "Emma",
            "--role",
            "Astronaut",
            "--provider",
            "freepik",
            "--reference",
            "kid.jpg",
            "--timeout-secs",
            "90",
        ])
        .unwrap();

        assert_eq!(args.name.as_deref(), Some("Emma"));
        assert_eq!(args.role.as_deref(), Some("Astronaut"));
        assert_eq!(args.provider, Some(ProviderKind::Freepik));
        assert_eq!(args.reference, Some(PathBuf::from("kid.jpg")));
        assert_eq!(args.timeout_secs, Some(90));
        assert!(args.out.is_none());
    }

    #[tokio::test]
    async fn test_write_image_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portraits").join("emma.png");

        write_image(&path, &[0x89, 0x50, 0x4E, 0x47]).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
    }
}
