//! Turning command-line arguments into library configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use docqa_rag::{ChainOptions, FileUpload, RagConfig, SearchOptions};

use crate::cli::AskArgs;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Build a validated [`RagConfig`] from `ask` arguments.
pub fn rag_config(args: &AskArgs) -> Result<RagConfig> {
    let search = SearchOptions::default().with_k(args.k).with_fetch_k(args.fetch_k.max(args.k));
    let chain = ChainOptions {
        generation_timeout: Duration::from_secs(args.generation_timeout_secs),
        ..ChainOptions::default()
    };
    let config = RagConfig::builder()
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .search_type(args.search_type.as_str())
        .search(search)
        .chain(chain)
        .build()?;
    Ok(config)
}

/// Resolve the upload, declaring its MIME type from `--mime` or the extension.
pub fn file_upload(args: &AskArgs) -> Result<FileUpload> {
    let upload = match &args.mime {
        Some(mime) => FileUpload::new(&args.file, mime.as_str()),
        None => FileUpload::from_path(&args.file)?,
    };
    Ok(upload)
}

/// Refuse files over `max_size_mb`.
pub fn check_size(path: &Path, max_size_mb: u64) -> Result<u64> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?
        .len();
    if size > max_size_mb.saturating_mul(BYTES_PER_MB) {
        bail!(
            "'{}' is {:.1} MB, larger than the {max_size_mb} MB limit",
            path.display(),
            size as f64 / BYTES_PER_MB as f64
        );
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};

    fn ask_args(extra: &[&str]) -> AskArgs {
        let mut argv = vec!["docqa", "ask", "doc.pdf"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Ask(args) => args,
            Commands::Chat(_) => panic!("expected ask"),
        }
    }

    #[test]
    fn defaults_become_rag_config() {
        let config = rag_config(&ask_args(&[])).unwrap();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.search.k, 2);
        assert_eq!(config.chain.generation_timeout, Duration::from_secs(120));
    }

    #[test]
    fn large_k_raises_fetch_k() {
        let config = rag_config(&ask_args(&["-k", "30"])).unwrap();
        assert_eq!(config.search.fetch_k, 30);
    }

    #[test]
    fn bad_search_type_is_rejected_early() {
        let err = rag_config(&ask_args(&["--search-type", "bm25"])).unwrap_err();
        assert!(err.to_string().contains("Unknown search type: bm25"));
    }

    #[test]
    fn mime_flag_wins_over_extension() {
        let upload = file_upload(&ask_args(&["--mime", "text/plain"])).unwrap();
        assert_eq!(upload.mime, "text/plain");
        let guessed = file_upload(&ask_args(&[])).unwrap();
        assert_eq!(guessed.mime, "application/pdf");
    }

    #[test]
    fn size_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 2048]).unwrap();
        assert_eq!(check_size(file.path(), 1).unwrap(), 2048);
        assert!(check_size(file.path(), 0).is_err());
    }

    #[test]
    fn huge_size_limit_accepts_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"small").unwrap();
        assert_eq!(check_size(file.path(), u64::MAX).unwrap(), 5);
    }
}
