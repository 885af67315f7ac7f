use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use tiffin_manifest::ResolvedSource;

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

/// `count_noun(1, "a source", "sources")` is "a source";
/// `count_noun(3, ..)` is "3 sources".
pub fn count_noun(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        format!("{count} {plural}")
    }
}

/// Print what would be downloaded, grouped by license, with each source's
/// installation warnings and known issues indented beneath it.
pub fn print_download_summary(
    missing: &[&ResolvedSource],
    source_name: &str,
    executable: &str,
) {
    println!(
        "Download the following {} to run the binary {executable} from the source {source_name}?",
        count_noun(missing.len(), "source", "sources"),
    );
    let mut by_license: BTreeMap<&str, Vec<&ResolvedSource>> = BTreeMap::new();
    for &source in missing {
        by_license.entry(source.license_summary.as_str()).or_default().push(source);
    }
    for (license, sources) in by_license {
        println!(
            "- {ANSI_BOLD}{} {license}{ANSI_RESET}",
            count_noun(sources.len(), "A source", "sources"),
        );
        for source in sources {
            println!("  - {}", source.name);
            for warning in &source.installation_warnings {
                println!("    - {warning}");
            }
            for issue in &source.known_issues {
                println!("    - known issue: {issue}");
            }
        }
    }
}

/// `Y/n:` prompt defaulting to yes; unrecognized input re-asks, end of
/// input declines.
pub fn confirm_default_yes() -> io::Result<bool> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("Y/n: ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            other => println!("Expected `y`, `n`, `yes`, `no`, or nothing, got `{other}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_noun_forms() {
        assert_eq!(count_noun(1, "a source", "sources"), "a source");
        assert_eq!(count_noun(2, "a source", "sources"), "2 sources");
        assert_eq!(count_noun(0, "a source", "sources"), "0 sources");
    }
}
