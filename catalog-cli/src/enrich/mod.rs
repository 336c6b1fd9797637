//! Image enrichment engine
//!
//! Assigns an image to every product record from the reference corpus, with
//! explicit confidence accounting: the best fuzzy match wins only when its
//! score clears the confidence bar and its URL passes the validity checks;
//! everything else gets the fixed placeholder and a row in the
//! low-confidence review export.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::corpus::ReferenceEntry;
use crate::model::{ImageSource, ProductRecord};
use crate::services::matching;

/// Matches scoring below this go to the review export
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 60.0;

/// Corpus defect marker; URLs containing it are never assigned
const INVALID_URL_MARKER: &str = "/invalid/";

/// One line of the manual-review export
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRow {
    pub name: String,
    pub matched_name: String,
    pub score: f64,
    pub image_url: String,
}

/// Aggregate outcome of an enrichment pass
#[derive(Debug, Default)]
pub struct EnrichmentSummary {
    /// Records assigned a corpus image
    pub dataset: usize,
    /// Records assigned the placeholder image
    pub fallback: usize,
    /// Records skipped entirely for lacking a name
    pub skipped_no_name: usize,
    /// Low-confidence or rejected matches, for human follow-up
    pub review_rows: Vec<ReviewRow>,
}

/// A matched image URL is usable unless blank or flagged by the known
/// corpus defect marker.
fn image_is_usable(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && !url.contains(INVALID_URL_MARKER)
}

/// Enrich every record in place against the reference corpus.
///
/// Records without a name never participate in matching: they keep an empty
/// image list and no source tag. A record whose best match cannot be scored
/// (empty corpus) degrades to the fallback image instead of aborting.
pub fn enrich_records(
    records: &mut [ProductRecord],
    corpus: &[ReferenceEntry],
    fallback_image_url: &str,
    low_confidence_threshold: f64,
) -> EnrichmentSummary {
    let reference_names: Vec<String> = corpus
        .iter()
        .map(|entry| entry.product_name.clone())
        .collect();

    let mut summary = EnrichmentSummary::default();

    for record in records.iter_mut() {
        if record.name.trim().is_empty() {
            record.images.clear();
            record.image_match_score = 0.0;
            record.image_match_name.clear();
            record.image_source = None;
            summary.skipped_no_name += 1;
            log::warn!("Row {} has no product name, skipped", record.row);
            continue;
        }

        let best = match matching::extract_one(&record.name, &reference_names) {
            Some(best) => best,
            None => {
                // Nothing to score against; degrade rather than crash
                summary.review_rows.push(ReviewRow {
                    name: record.name.clone(),
                    matched_name: String::new(),
                    score: 0.0,
                    image_url: String::new(),
                });
                assign_fallback(record, fallback_image_url);
                summary.fallback += 1;
                continue;
            }
        };

        let image_url = corpus[best.index].image_url.as_str();
        let usable = image_is_usable(image_url);
        let confident = best.score >= low_confidence_threshold;

        record.image_match_score = best.score;
        record.image_match_name = best.choice.clone();

        if !confident || !usable {
            summary.review_rows.push(ReviewRow {
                name: record.name.clone(),
                matched_name: best.choice.clone(),
                score: best.score,
                image_url: image_url.to_string(),
            });
        }

        if confident && usable {
            record.images = vec![image_url.to_string()];
            record.image_source = Some(ImageSource::Dataset);
            summary.dataset += 1;
            log::info!(
                "[MATCH] {} -> {} (score {:.0})",
                record.name,
                best.choice,
                best.score
            );
        } else {
            assign_fallback(record, fallback_image_url);
            summary.fallback += 1;
            log::info!(
                "[FALLBACK] {} -> {} (score {:.0}, usable image: {})",
                record.name,
                best.choice,
                best.score,
                usable
            );
        }
    }

    summary
}

fn assign_fallback(record: &mut ProductRecord, fallback_image_url: &str) {
    record.images = vec![fallback_image_url.to_string()];
    record.image_source = Some(ImageSource::Fallback);
}

/// Write the low-confidence rows for manual review.
///
/// This is a side artifact: callers log a failure and carry on rather than
/// aborting the pipeline.
pub fn write_review_csv(rows: &[ReviewRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create review file: {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write review file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "https://via.placeholder.com/400x400?text=No+Image";

    fn record(name: &str) -> ProductRecord {
        ProductRecord {
            row: 0,
            name: name.to_string(),
            description: String::new(),
            price: Some(1.0),
            discount: None,
            stock: Some(1),
            images: Vec::new(),
            is_out_of_stock: false,
            is_active: true,
            category_id: String::new(),
            created_by: String::new(),
            image_match_score: 0.0,
            image_match_name: String::new(),
            image_source: None,
        }
    }

    fn entry(name: &str, url: &str) -> ReferenceEntry {
        ReferenceEntry {
            product_name: name.to_string(),
            image_url: url.to_string(),
        }
    }

    #[test]
    fn test_high_confidence_match_gets_dataset_image() {
        let corpus = vec![
            entry("Amul Butter 500 g", "https://x/img.jpg"),
            entry("Tata Salt 1kg", "https://x/salt.jpg"),
        ];
        let mut records = vec![record("Amul Butter 500g")];
        let summary = enrich_records(&mut records, &corpus, FALLBACK, LOW_CONFIDENCE_THRESHOLD);

        assert_eq!(records[0].images, vec!["https://x/img.jpg".to_string()]);
        assert_eq!(records[0].image_source, Some(ImageSource::Dataset));
        assert!(records[0].image_match_score > 80.0);
        assert_eq!(summary.dataset, 1);
        assert_eq!(summary.fallback, 0);
        assert!(summary.review_rows.is_empty());
    }

    #[test]
    fn test_low_score_match_goes_to_review_and_fallback() {
        let corpus = vec![entry("Steel Water Bottle 1L", "https://x/bottle.jpg")];
        let mut records = vec![record("XYZ Unique Item")];
        let summary = enrich_records(&mut records, &corpus, FALLBACK, LOW_CONFIDENCE_THRESHOLD);

        assert_eq!(records[0].images, vec![FALLBACK.to_string()]);
        assert_eq!(records[0].image_source, Some(ImageSource::Fallback));
        assert_eq!(summary.fallback, 1);
        assert_eq!(summary.review_rows.len(), 1);
        assert!(summary.review_rows[0].score < LOW_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn test_invalid_marker_rejects_image() {
        let corpus = vec![entry("Amul Butter 500 g", "https://x/invalid/img.jpg")];
        let mut records = vec![record("Amul Butter 500g")];
        let summary = enrich_records(&mut records, &corpus, FALLBACK, LOW_CONFIDENCE_THRESHOLD);

        // Confident match, but the URL carries the corpus defect marker
        assert_eq!(records[0].image_source, Some(ImageSource::Fallback));
        assert_eq!(summary.review_rows.len(), 1);
        assert!(summary.review_rows[0].score >= LOW_CONFIDENCE_THRESHOLD);
        assert!(summary.review_rows[0].image_url.contains("/invalid/"));
    }

    #[test]
    fn test_blank_image_rejects_match() {
        let corpus = vec![entry("Amul Butter 500 g", "   ")];
        let mut records = vec![record("Amul Butter 500g")];
        let summary = enrich_records(&mut records, &corpus, FALLBACK, LOW_CONFIDENCE_THRESHOLD);

        assert_eq!(records[0].images, vec![FALLBACK.to_string()]);
        assert_eq!(summary.fallback, 1);
    }

    #[test]
    fn test_blank_name_is_skipped_not_fallback() {
        let corpus = vec![entry("Amul Butter 500 g", "https://x/img.jpg")];
        let mut records = vec![record("   ")];
        let summary = enrich_records(&mut records, &corpus, FALLBACK, LOW_CONFIDENCE_THRESHOLD);

        assert!(records[0].images.is_empty());
        assert_eq!(records[0].image_source, None);
        assert_eq!(summary.skipped_no_name, 1);
        assert_eq!(summary.fallback, 0);
        assert!(summary.review_rows.is_empty());
    }

    #[test]
    fn test_empty_corpus_degrades_to_fallback() {
        let mut records = vec![record("Amul Butter 500g")];
        let summary = enrich_records(&mut records, &[], FALLBACK, LOW_CONFIDENCE_THRESHOLD);

        assert_eq!(records[0].image_source, Some(ImageSource::Fallback));
        assert_eq!(summary.fallback, 1);
    }

    #[test]
    fn test_every_matched_record_is_assigned() {
        // Regression guard: assignment happens per record inside the loop,
        // not once after it
        let corpus = vec![
            entry("Amul Butter 500 g", "https://x/butter.jpg"),
            entry("Tata Salt 1kg", "https://x/salt.jpg"),
        ];
        let mut records = vec![record("Amul Butter 500g"), record("Tata Salt 1 kg")];
        enrich_records(&mut records, &corpus, FALLBACK, LOW_CONFIDENCE_THRESHOLD);

        assert_eq!(records[0].first_image(), "https://x/butter.jpg");
        assert_eq!(records[1].first_image(), "https://x/salt.jpg");
        assert_eq!(records[0].image_source, Some(ImageSource::Dataset));
        assert_eq!(records[1].image_source, Some(ImageSource::Dataset));
    }
}
