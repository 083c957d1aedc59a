//! Markdown summary generation

use crate::output::traits::{CrawlSummary, OutputResult};
use crate::state::PageState;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let markdown = format_markdown_summary(summary);
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;
    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Encuentro Crawl Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    md.push_str("## Products\n\n");
    md.push_str(&format!("- **Records Stored**: {}\n", summary.products_stored));
    md.push_str(&format!(
        "- **Distinct Retailer Skus**: {}\n",
        summary.distinct_retailer_skus
    ));
    md.push_str(&format!("- **Sku Entries**: {}\n", summary.sku_entries));
    md.push_str(&format!(
        "- **Extraction Rate**: {:.2}%\n\n",
        summary.extraction_rate()
    ));

    md.push_str("## Pages\n\n");
    md.push_str(&format!("- **Total Pages**: {}\n", summary.total_pages));
    md.push_str(&format!("- **Listing Pages**: {}\n", summary.listing_pages));
    md.push_str(&format!("- **Product Pages**: {}\n", summary.product_pages));
    md.push_str(&format!("- **Total Errors**: {}\n", summary.total_errors()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    md.push_str("| State | Count |\n");
    md.push_str("|-------|-------|\n");
    for state in PageState::all_states() {
        let count = summary.state_count(state);
        if count > 0 {
            md.push_str(&format!("| {} | {} |\n", state, count));
        }
    }
    md.push('\n');

    if !summary.extraction_failures.is_empty() {
        md.push_str("## Extraction Failures\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");
        for (url, reason) in &summary.extraction_failures {
            md.push_str(&format!("| {} | {} |\n", url, reason.replace('|', "\\|")));
        }
        md.push('\n');
    }

    md
}
