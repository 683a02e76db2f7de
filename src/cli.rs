use crate::manifest::load_manifest;
use crate::route::StaticRouteTable;
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::swagger_builder::SwaggerBuilder;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Swagger From Routes - Generate Swagger 2.0 documentation from route table manifests
#[derive(Parser, Debug)]
#[command(name = "swagger-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Manifest file, or directory searched for *.yaml, *.yml and *.json manifests
    #[arg(value_name = "PATH")]
    pub manifest_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// API title, overriding the manifest's info section
    #[arg(long = "title")]
    pub title: Option<String>,

    /// API version, overriding the manifest's info section
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.exists() {
        anyhow::bail!(
            "Manifest path does not exist: {}",
            args.manifest_path.display()
        );
    }

    info!("Manifest path: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting Swagger document generation...");

    // Step 1: Collect manifests
    let scan_result = FileScanner::new(args.manifest_path.clone()).scan()?;
    info!("Found {} manifest files", scan_result.manifest_files.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }
    if scan_result.manifest_files.is_empty() {
        anyhow::bail!("No manifest files found at {}", args.manifest_path.display());
    }

    // Step 2: Load every manifest into one route table
    let mut table = StaticRouteTable::new();
    let mut title = None;
    let mut version = None;
    for path in &scan_result.manifest_files {
        let manifest = load_manifest(path)?;
        if let Some(manifest_info) = &manifest.info {
            title = title.or_else(|| manifest_info.title.clone());
            version = version.or_else(|| manifest_info.version.clone());
        }
        let routes = manifest
            .route_table()
            .with_context(|| format!("Invalid manifest: {}", path.display()))?;
        debug!("{} declares {} routes", path.display(), routes.len());
        table.merge(routes);
    }
    info!("Loaded {} routes", table.len());
    if table.is_empty() {
        warn!("No routes found in the manifests");
    }

    // Step 3: Assemble the document
    let mut builder = SwaggerBuilder::new();
    let title = args.title.clone().or(title);
    let version = args.api_version.clone().or(version);
    if title.is_some() || version.is_some() {
        builder = builder.with_info(
            title.unwrap_or_else(|| "swagger project".to_string()),
            version.unwrap_or_else(|| "0.0.1".to_string()),
        );
    }
    builder.add_table(&table)?;
    let document = builder.build();
    info!(
        "Swagger document built with {} paths and {} definitions",
        document.paths.len(),
        document.definitions.len()
    );

    // Step 4: Serialize and output
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };
    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Successfully wrote Swagger document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
info:
  title: Pets
routes:
  - rule: /pets/<int:pet_id>
    methods: [GET, DELETE]
    handler:
      module: app.pets
      name: pet
      doc: "Pet\n---\n"
"#;

    fn args(path: PathBuf, output: PathBuf) -> CliArgs {
        CliArgs {
            manifest_path: path,
            output_format: OutputFormat::Json,
            output_path: Some(output),
            title: None,
            api_version: None,
            verbose: false,
        }
    }

    #[test]
    fn test_parse_args_rejects_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        assert!(parse_args_from_parsed(args(missing.clone(), missing)).is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let parsed = CliArgs::try_parse_from([
            "swagger-from-routes",
            "routes.yaml",
            "-f",
            "json",
            "--title",
            "Shop",
            "--api-version",
            "3.0.1",
            "-v",
        ])
        .unwrap();
        assert!(matches!(parsed.output_format, OutputFormat::Json));
        assert_eq!(parsed.title.as_deref(), Some("Shop"));
        assert_eq!(parsed.api_version.as_deref(), Some("3.0.1"));
        assert!(parsed.verbose);
        assert!(parsed.output_path.is_none());
    }

    #[test]
    fn test_run_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("routes.yaml");
        fs::write(&manifest, MANIFEST).unwrap();
        let output = temp_dir.path().join("out/swagger.json");

        let mut cli_args = args(temp_dir.path().to_path_buf(), output.clone());
        cli_args.api_version = Some("9.9.9".to_string());
        run(cli_args).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(doc["info"]["title"], "Pets");
        assert_eq!(doc["info"]["version"], "9.9.9");
        let item = &doc["paths"]["/pets/{pet_id}"];
        assert!(item["get"].is_object());
        assert!(item["delete"]["responses"]["204"].is_object());
    }

    #[test]
    fn test_run_fails_without_manifests() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("swagger.json");
        assert!(run(args(temp_dir.path().to_path_buf(), output)).is_err());
    }
}
