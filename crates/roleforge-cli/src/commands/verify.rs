use super::{colorize_status, json_pretty, Inputs, EXIT_INTEGRITY_ERROR, EXIT_SUCCESS};
use roleforge_store::IntegrityReport;
use serde::Serialize;

#[derive(Serialize)]
struct ReleaseVerification<'a> {
    release: &'a str,
    version: &'a str,
    #[serde(flatten)]
    report: &'a IntegrityReport,
}

pub fn run(inputs: &Inputs, json: bool) -> Result<u8, String> {
    let releases = inputs.load_releases(json)?;
    let reports: Vec<_> = releases.iter().map(|r| (r, r.verify())).collect();

    if json {
        let payload: Vec<_> = reports
            .iter()
            .map(|(release, report)| ReleaseVerification {
                release: &release.name,
                version: &release.version,
                report,
            })
            .collect();
        println!("{}", json_pretty(&payload)?);
    } else {
        for (release, report) in &reports {
            let status = if report.is_clean() { "ok" } else { "FAIL" };
            println!(
                "{} {}: {}/{} archives passed [{}]",
                release.name,
                release.version,
                report.passed,
                report.checked,
                colorize_status(status)
            );
            for f in &report.failed {
                println!("  FAIL {}: {}", f.subject, f.reason);
            }
        }
    }

    if reports.iter().all(|(_, report)| report.is_clean()) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_INTEGRITY_ERROR)
    }
}
