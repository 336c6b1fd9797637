//! External reference corpus: product name -> image URL
//!
//! The corpus is a large tab-separated export downloaded once from a public
//! URL and kept beside the other data files. It is read-only for the
//! duration of a run.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

/// One usable reference row
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    pub product_name: String,
    pub image_url: String,
}

/// Download the reference dataset if it is not already on disk.
///
/// Streams the body to the target file; an existing file short-circuits.
pub async fn ensure_dataset(url: &str, path: &Path) -> Result<()> {
    if path.exists() {
        log::info!("Reference dataset already present: {}", path.display());
        return Ok(());
    }

    log::info!("Downloading reference dataset from {}", url);
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to request reference dataset from {url}"))?
        .error_for_status()
        .context("Reference dataset download failed")?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    log::info!("Download complete ({} bytes)", written);
    Ok(())
}

/// Load the reference corpus from a tab-separated file.
///
/// Keeps only rows with a non-blank `product_name` and `image_url`;
/// unreadable lines are skipped rather than aborting the load. An empty
/// result is an error because enrichment cannot proceed without it.
pub fn load_reference_corpus(path: &Path) -> Result<Vec<ReferenceEntry>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open reference corpus: {}", path.display()))?;
    let entries = parse_reference_corpus(file)
        .with_context(|| format!("Failed to parse reference corpus: {}", path.display()))?;
    if entries.is_empty() {
        bail!(
            "Reference corpus {} has no rows with both product_name and image_url",
            path.display()
        );
    }
    log::info!("Loaded {} reference entries", entries.len());
    Ok(entries)
}

fn parse_reference_corpus<R: Read>(reader: R) -> Result<Vec<ReferenceEntry>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .context("Corpus has no header row")?
        .clone();
    let name_index = headers
        .iter()
        .position(|h| h == "product_name")
        .context("Corpus is missing a product_name column")?;
    let url_index = headers
        .iter()
        .position(|h| h == "image_url")
        .context("Corpus is missing an image_url column")?;

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let name = record.get(name_index).unwrap_or("").trim();
        let url = record.get(url_index).unwrap_or("").trim();
        if name.is_empty() || url.is_empty() {
            skipped += 1;
            continue;
        }
        entries.push(ReferenceEntry {
            product_name: name.to_string(),
            image_url: url.to_string(),
        });
    }
    if skipped > 0 {
        log::debug!("Skipped {} corpus rows without name or image", skipped);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_only_complete_rows() {
        let data = "code\tproduct_name\tbrands\timage_url\n\
                    1\tAmul Butter 500 g\tAmul\thttps://img.example/amul.jpg\n\
                    2\t\tNoName\thttps://img.example/ghost.jpg\n\
                    3\tParle-G Biscuits\tParle\t\n\
                    4\tTata Salt 1kg\tTata\thttps://img.example/salt.jpg\n";
        let entries = parse_reference_corpus(data.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].product_name, "Amul Butter 500 g");
        assert_eq!(entries[1].image_url, "https://img.example/salt.jpg");
    }

    #[test]
    fn test_parse_tolerates_ragged_rows() {
        let data = "product_name\timage_url\n\
                    Amul Butter 500 g\thttps://img.example/amul.jpg\textra\tfields\n\
                    short-row\n";
        let entries = parse_reference_corpus(data.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_parse_missing_columns_is_an_error() {
        let data = "code\tname\n1\tsomething\n";
        assert!(parse_reference_corpus(data.as_bytes()).is_err());
    }
}
